//! State shared by Drive files and folders.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::Method;
use serde_json::{json, Value};

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisObject, CmisResult, DocumentPtr, FolderPtr, ObjectPtr,
    PropertyMap,
};

use crate::document::GDriveDocument;
use crate::folder::GDriveFolder;
use crate::session::GDriveContext;
use crate::utils::{is_editable, is_folder, to_cmis_properties, to_gdrive_json, JsonObject};

/// Folder or document, depending on the Drive MIME type.
pub fn object_from_json(ctx: &Arc<GDriveContext>, json: JsonObject) -> ObjectPtr {
    if is_folder(&json) {
        Arc::new(GDriveFolder::new(ctx.clone(), json))
    } else {
        Arc::new(GDriveDocument::new(ctx.clone(), json))
    }
}

pub fn folder_from_json(ctx: &Arc<GDriveContext>, json: JsonObject) -> CmisResult<FolderPtr> {
    let id = json_id(&json);
    object_from_json(ctx, json)
        .into_folder()
        .ok_or_else(|| CmisError::invalid(format!("Object {id} is not a folder")))
}

pub fn document_from_json(ctx: &Arc<GDriveContext>, json: JsonObject) -> CmisResult<DocumentPtr> {
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

/// Drive reports no permission set beyond `editable`.
fn actions_for(json: &JsonObject) -> AllowableActions {
    AllowableActions::for_base_type(is_folder(json), is_editable(json), false)
}

pub struct GDriveState {
    ctx: Arc<GDriveContext>,
    core: ObjectCore,
    /// Raw file resource, for the members that are not properties such as
    /// download and export links.
    json: RwLock<JsonObject>,
}

impl GDriveState {
    pub fn new(ctx: Arc<GDriveContext>, json: JsonObject) -> Self {
        let core = ObjectCore::new(ctx.clone(), to_cmis_properties(&json))
            .with_allowable_actions(Some(actions_for(&json)));
        Self {
            ctx,
            core,
            json: RwLock::new(json),
        }
    }

    pub fn ctx(&self) -> &Arc<GDriveContext> {
        &self.ctx
    }

    pub fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn id(&self) -> String {
        self.core.string("cmis:objectId").unwrap_or_default()
    }

    pub fn url(&self) -> String {
        self.ctx.file_url(&self.id())
    }

    pub fn json_value(&self, key: &str) -> Option<Value> {
        self.json
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn reload(&self, json: JsonObject) {
        self.core
            .reload(to_cmis_properties(&json), Some(actions_for(&json)));
        *self.json.write().unwrap_or_else(PoisonError::into_inner) = json;
    }

    pub fn refresh(&self) -> CmisResult<()> {
        let json = self.ctx.fetch(&self.id())?;
        self.reload(json);
        Ok(())
    }

    pub fn update_properties(&self, properties: &PropertyMap) -> CmisResult<()> {
        let json = self
            .ctx
            .send_json(Method::PUT, &self.url(), &to_gdrive_json(properties))?;
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
            let json = self.json.read().unwrap_or_else(PoisonError::into_inner);
            Ok(actions_for(&json))
        })
    }

    pub fn parents(&self) -> CmisResult<Vec<FolderPtr>> {
        self.ctx
            .fetch_listed(&format!("{}/parents", self.url()))?
            .into_iter()
            .map(|json| folder_from_json(&self.ctx, json))
            .collect()
    }

    /// Re-parent the file: Drive files may live in several folders, only
    /// the `source` link is replaced.
    pub fn move_object(&self, source_id: &str, destination_id: &str) -> CmisResult<()> {
        let url = url::Url::parse_with_params(
            &self.url(),
            &[("addParents", destination_id), ("removeParents", source_id)],
        )?;
        let json = self.ctx.send_json(Method::PUT, url.as_str(), &json!({}))?;
        self.reload(json);
        Ok(())
    }
}
