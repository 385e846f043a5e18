//! State shared by OneDrive files and folders.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisObject, CmisResult, DocumentPtr, FolderPtr, ObjectPtr,
    PropertyMap,
};

use crate::document::OneDriveDocument;
use crate::folder::OneDriveFolder;
use crate::session::OneDriveContext;
use crate::utils::{is_folder, to_cmis_properties, to_onedrive_json, JsonObject};

pub fn object_from_json(ctx: &Arc<OneDriveContext>, json: JsonObject) -> ObjectPtr {
    if is_folder(&json) {
        Arc::new(OneDriveFolder::new(ctx.clone(), json))
    } else {
        Arc::new(OneDriveDocument::new(ctx.clone(), json))
    }
}

pub fn folder_from_json(ctx: &Arc<OneDriveContext>, json: JsonObject) -> CmisResult<FolderPtr> {
    let id = json_id(&json);
    object_from_json(ctx, json)
        .into_folder()
        .ok_or_else(|| CmisError::invalid(format!("Object {id} is not a folder")))
}

pub fn document_from_json(ctx: &Arc<OneDriveContext>, json: JsonObject) -> CmisResult<DocumentPtr> {
    let id = json_id(&json);
    object_from_json(ctx, json)
        .into_document()
        .ok_or_else(|| CmisError::invalid(format!("Object {id} is not a document")))
}

pub fn json_id(json: &JsonObject) -> String {
    json.get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn actions_for(json: &JsonObject) -> AllowableActions {
    AllowableActions::for_base_type(is_folder(json), true, false)
}

pub struct OneDriveState {
    ctx: Arc<OneDriveContext>,
    core: ObjectCore,
}

impl OneDriveState {
    pub fn new(ctx: Arc<OneDriveContext>, json: JsonObject) -> Self {
        let core = ObjectCore::new(ctx.clone(), to_cmis_properties(&json))
            .with_allowable_actions(Some(actions_for(&json)));
        Self { ctx, core }
    }

    pub fn ctx(&self) -> &Arc<OneDriveContext> {
        &self.ctx
    }

    pub fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn id(&self) -> String {
        self.core.string("cmis:objectId").unwrap_or_default()
    }

    pub fn url(&self) -> String {
        self.ctx.object_url(&self.id())
    }

    pub fn parent_id(&self) -> Option<String> {
        self.core.string("cmis:parentId").filter(|id| !id.is_empty())
    }

    pub fn reload(&self, json: JsonObject) {
        self.core
            .reload(to_cmis_properties(&json), Some(actions_for(&json)));
    }

    /// Reload from the item stored under `id`.
    pub fn reload_from(&self, id: &str) -> CmisResult<()> {
        let json = self.ctx.fetch(id)?;
        self.reload(json);
        Ok(())
    }

    pub fn refresh(&self) -> CmisResult<()> {
        self.reload_from(&self.id())
    }

    pub fn update_properties(&self, properties: &PropertyMap) -> CmisResult<()> {
        let json = self
            .ctx
            .send_json(Method::PUT, &self.url(), &to_onedrive_json(properties))?;
        self.reload(json);
        Ok(())
    }

    pub fn remove(&self) -> CmisResult<()> {
        self.ctx.http.delete(&self.url())?;
        self.core.touch();
        Ok(())
    }

    pub fn allowable_actions(&self) -> CmisResult<AllowableActions> {
        self.core.allowable_actions(|| {
            Ok(AllowableActions::for_base_type(
                self.core.string("cmis:baseTypeId").as_deref() == Some("cmis:folder"),
                true,
                false,
            ))
        })
    }

    pub fn parent(&self) -> CmisResult<Option<FolderPtr>> {
        match self.parent_id() {
            Some(parent_id) => folder_from_json(&self.ctx, self.ctx.fetch(&parent_id)?).map(Some),
            None => Ok(None),
        }
    }

    /// Items live in exactly one folder, so the source is implied.
    pub fn move_object(&self, destination_id: &str) -> CmisResult<()> {
        let method = Method::from_bytes(b"MOVE")
            .map_err(|e| CmisError::runtime(format!("Invalid HTTP method: {e}")))?;
        let json = self
            .ctx
            .send_json(method, &self.url(), &json!({ "destination": destination_id }))?;
        self.reload(json);
        Ok(())
    }
}
