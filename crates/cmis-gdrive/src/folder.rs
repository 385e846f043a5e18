//! Drive folders.

use std::io::Read;
use std::sync::Arc;

use log::debug;
use reqwest::Method;
use serde_json::{json, Value};

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisObject, CmisResult, DocumentPtr, Fileable, Folder, FolderPtr,
    ObjectPtr, PropertyMap, UnfileObjects,
};

use crate::object::{
    document_from_json, folder_from_json, json_id, object_from_json, GDriveState,
};
use crate::session::{GDriveContext, ROOT_ID};
use crate::utils::{is_google_doc, to_gdrive_json, JsonObject, FOLDER_MIME_TYPE};

pub struct GDriveFolder {
    state: GDriveState,
}

impl GDriveFolder {
    pub fn new(ctx: Arc<GDriveContext>, json: JsonObject) -> Self {
        Self {
            state: GDriveState::new(ctx, json),
        }
    }

    /// Metadata body of a new child of this folder.
    fn child_metadata(&self, properties: &PropertyMap, mime_type: &str) -> Value {
        let mut body = to_gdrive_json(properties);
        if let Some(object) = body.as_object_mut() {
            object.insert("mimeType".into(), Value::String(mime_type.to_string()));
            object.insert("parents".into(), json!([{ "id": self.state.id() }]));
        }
        body
    }
}

impl CmisObject for GDriveFolder {
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

impl Fileable for GDriveFolder {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        Ok(self.get_folder_parent()?.into_iter().collect())
    }

    fn move_object(&self, source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_object(&source.id(), &destination.id())
    }
}

impl Folder for GDriveFolder {
    fn is_root_folder(&self) -> bool {
        self.state.id() == ROOT_ID || self.parent_id().is_none()
    }

    fn get_folder_parent(&self) -> CmisResult<Option<FolderPtr>> {
        let Some(parent_id) = self.parent_id().filter(|_| !self.is_root_folder()) else {
            return Ok(None);
        };
        let ctx = self.state.ctx();
        folder_from_json(ctx, ctx.fetch(&parent_id)?).map(Some)
    }

    fn get_children(&self) -> CmisResult<Vec<ObjectPtr>> {
        let ctx = self.state.ctx();
        Ok(ctx
            .fetch_listed(&format!("{}/children", self.state.url()))?
            .into_iter()
            .map(|json| object_from_json(ctx, json))
            .collect())
    }

    fn create_folder(&self, properties: &PropertyMap) -> CmisResult<FolderPtr> {
        let body = self.child_metadata(properties, FOLDER_MIME_TYPE);
        if body.get("title").is_none() {
            return Err(CmisError::invalid("Missing cmis:name for the new folder"));
        }
        let ctx = self.state.ctx();
        let json = ctx.send_json(Method::POST, &ctx.files_url(), &body)?;
        folder_from_json(ctx, json)
    }

    fn create_document(
        &self,
        properties: &PropertyMap,
        stream: &mut dyn Read,
        content_type: &str,
        filename: &str,
    ) -> CmisResult<DocumentPtr> {
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        let content_type = if content_type.is_empty() {
            mime_guess::from_path(filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        } else {
            content_type.to_string()
        };

        let mut body = self.child_metadata(properties, &content_type);
        if let Some(object) = body.as_object_mut() {
            if !object.contains_key("title") && !filename.is_empty() {
                object.insert("title".into(), Value::String(filename.to_string()));
            }
        }
        if body.get("title").is_none() {
            return Err(CmisError::invalid("Missing cmis:name for the new document"));
        }

        let ctx = self.state.ctx();
        let created = ctx.send_json(Method::POST, &ctx.files_url(), &body)?;
        let id = json_id(&created);
        debug!("Created Drive file {id}, uploading content");
        ctx.upload(&id, &data, &content_type, is_google_doc(&content_type))?;
        document_from_json(ctx, ctx.fetch(&id)?)
    }

    /// Drive trashes the whole subtree at once; nothing can be partially
    /// deleted.
    fn remove_tree(
        &self,
        _all_versions: bool,
        _unfile: UnfileObjects,
        _continue_on_error: bool,
    ) -> CmisResult<Vec<String>> {
        let ctx = self.state.ctx();
        ctx.send_json(
            Method::POST,
            &format!("{}/trash", self.state.url()),
            &json!({}),
        )?;
        self.state.core().touch();
        Ok(Vec::new())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
