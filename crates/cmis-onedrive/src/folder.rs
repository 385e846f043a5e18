//! OneDrive folders and albums.

use std::io::Read;
use std::sync::Arc;

use reqwest::Method;

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisObject, CmisResult, DocumentPtr, Fileable, Folder, FolderPtr,
    ObjectPtr, Property, PropertyMap, UnfileObjects,
};

use crate::object::{document_from_json, folder_from_json, object_from_json, OneDriveState};
use crate::session::{OneDriveContext, ROOT_ID};
use crate::utils::{to_onedrive_json, JsonObject};

pub struct OneDriveFolder {
    state: OneDriveState,
}

impl OneDriveFolder {
    pub fn new(ctx: Arc<OneDriveContext>, json: JsonObject) -> Self {
        Self {
            state: OneDriveState::new(ctx, json),
        }
    }
}

impl CmisObject for OneDriveFolder {
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

impl Fileable for OneDriveFolder {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        Ok(self.state.parent()?.into_iter().collect())
    }

    fn move_object(&self, _source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_object(&destination.id())
    }
}

impl Folder for OneDriveFolder {
    fn is_root_folder(&self) -> bool {
        self.state.id() == ROOT_ID || self.parent_id().is_none()
    }

    fn get_folder_parent(&self) -> CmisResult<Option<FolderPtr>> {
        if self.is_root_folder() {
            return Ok(None);
        }
        self.state.parent()
    }

    fn get_children(&self) -> CmisResult<Vec<ObjectPtr>> {
        let ctx = self.state.ctx();
        Ok(ctx
            .list_children(&self.state.id())?
            .into_iter()
            .map(|json| object_from_json(ctx, json))
            .collect())
    }

    fn create_folder(&self, properties: &PropertyMap) -> CmisResult<FolderPtr> {
        let body = to_onedrive_json(properties);
        if body.get("name").is_none() {
            return Err(CmisError::invalid("Missing cmis:name for the new folder"));
        }
        let ctx = self.state.ctx();
        let json = ctx.send_json(Method::POST, &self.state.url(), &body)?;
        folder_from_json(ctx, json)
    }

    /// Upload the content under its name, then apply the remaining
    /// properties if there are any.
    fn create_document(
        &self,
        properties: &PropertyMap,
        stream: &mut dyn Read,
        _content_type: &str,
        filename: &str,
    ) -> CmisResult<DocumentPtr> {
        let name = properties
            .get("cmis:name")
            .and_then(Property::first_string)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| filename.to_string());
        if name.is_empty() {
            return Err(CmisError::invalid("Missing cmis:name for the new document"));
        }
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;

        let ctx = self.state.ctx();
        let id = ctx.upload(&self.state.id(), &name, &data)?;
        let document = document_from_json(ctx, ctx.fetch(&id)?)?;
        if properties.contains_key("cmis:description") {
            let mut extra = PropertyMap::new();
            if let Some(description) = properties.get("cmis:description") {
                extra.insert("cmis:description".into(), description.clone());
            }
            document.update_properties(&extra)?;
        }
        Ok(document)
    }

    /// OneDrive deletes folders recursively in one call.
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
