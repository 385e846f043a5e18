//! SharePoint folders.

use std::io::Read;
use std::sync::Arc;

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisObject, CmisResult, DocumentPtr, Fileable, Folder, FolderPtr,
    ObjectPtr, Property, PropertyMap, UnfileObjects,
};

use crate::object::{document_from_json, folder_from_json, object_from_json, SharePointState};
use crate::session::{SharePointContext, VERBOSE_JSON};
use crate::utils::{quote, JsonObject};

fn new_name(properties: &PropertyMap, fallback: &str) -> Option<String> {
    properties
        .get("cmis:name")
        .and_then(Property::first_string)
        .filter(|n| !n.is_empty())
        .or_else(|| Some(fallback.to_string()).filter(|n| !n.is_empty()))
}

pub struct SharePointFolder {
    state: SharePointState,
}

impl SharePointFolder {
    pub fn new(ctx: Arc<SharePointContext>, json: JsonObject) -> Self {
        Self {
            state: SharePointState::new(ctx, json),
        }
    }
}

impl CmisObject for SharePointFolder {
    fn core(&self) -> &ObjectCore {
        self.state.core()
    }

    fn refresh(&self) -> CmisResult<()> {
        self.state.refresh()
    }

    fn update_properties(&self, properties: &PropertyMap) -> CmisResult<()> {
        self.state.update_properties(properties)
    }

    fn remove(&self, _all_versions: bool) -> CmisResult<()> {
        self.state.remove()
    }

    fn get_allowable_actions(&self) -> CmisResult<AllowableActions> {
        self.state.allowable_actions()
    }

    fn as_folder(&self) -> Option<&dyn Folder> {
        Some(self)
    }

    fn into_folder(self: Arc<Self>) -> Option<FolderPtr> {
        Some(self)
    }
}

impl Fileable for SharePointFolder {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        if self.is_root_folder() {
            return Ok(Vec::new());
        }
        Ok(self.state.parent()?.into_iter().collect())
    }

    fn move_object(&self, _source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_file(&destination.path())
    }
}

impl Folder for SharePointFolder {
    fn parent_id(&self) -> Option<String> {
        self.state.cached_parent_id()
    }

    fn is_root_folder(&self) -> bool {
        let root = self.state.ctx().root_id();
        self.state.id().eq_ignore_ascii_case(&root) || self.path() == "/"
    }

    fn get_folder_parent(&self) -> CmisResult<Option<FolderPtr>> {
        if self.is_root_folder() {
            return Ok(None);
        }
        self.state.parent()
    }

    /// Sub-folders first, then files.
    fn get_children(&self) -> CmisResult<Vec<ObjectPtr>> {
        let ctx = self.state.ctx();
        let id = self.state.id();
        let mut children: Vec<ObjectPtr> = ctx
            .fetch_results(&format!("{id}/Folders"))?
            .into_iter()
            .map(|json| object_from_json(ctx, json))
            .collect();
        children.extend(
            ctx.fetch_results(&format!("{id}/Files"))?
                .into_iter()
                .map(|json| object_from_json(ctx, json)),
        );
        Ok(children)
    }

    fn create_folder(&self, properties: &PropertyMap) -> CmisResult<FolderPtr> {
        let name = new_name(properties, "")
            .ok_or_else(|| CmisError::invalid("Missing cmis:name for the new folder"))?;
        let ctx = self.state.ctx();
        let url = format!("{}/folders/add({})", self.state.id(), quote(&name));
        folder_from_json(ctx, ctx.post_for_object(&url, Vec::new(), VERBOSE_JSON)?)
    }

    fn create_document(
        &self,
        properties: &PropertyMap,
        stream: &mut dyn Read,
        content_type: &str,
        filename: &str,
    ) -> CmisResult<DocumentPtr> {
        let name = new_name(properties, filename)
            .ok_or_else(|| CmisError::invalid("Missing cmis:name for the new document"))?;
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;

        let content_type = if content_type.is_empty() {
            mime_guess::from_path(&name)
                .first_raw()
                .unwrap_or("application/octet-stream")
        } else {
            content_type
        };
        let ctx = self.state.ctx();
        let url = format!(
            "{}/files/add(overwrite=true,url={})",
            self.state.id(),
            quote(&name)
        );
        document_from_json(ctx, ctx.post_for_object(&url, data, content_type)?)
    }

    /// Deleting a folder removes its content with it.
    fn remove_tree(
        &self,
        _all_versions: bool,
        _unfile: UnfileObjects,
        _continue_on_error: bool,
    ) -> CmisResult<Vec<String>> {
        self.state.remove()?;
        Ok(Vec::new())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
