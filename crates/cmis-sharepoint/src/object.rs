//! State shared by SharePoint folders and files.

use std::sync::Arc;

use log::warn;
use reqwest::Method;

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisObject, CmisResult, DocumentPtr, FolderPtr, HttpRequest,
    ObjectPtr, Property, PropertyMap,
};

use crate::document::SharePointDocument;
use crate::folder::SharePointFolder;
use crate::session::{SharePointContext, VERBOSE_JSON};
use crate::utils::{
    is_folder, metadata_uri, parent_path, quote, to_cmis_properties, to_sharepoint_json,
    JsonObject, FILE_TYPE, FOLDER_TYPE,
};

pub fn object_from_json(ctx: &Arc<SharePointContext>, json: JsonObject) -> ObjectPtr {
    if is_folder(&json) {
        Arc::new(SharePointFolder::new(ctx.clone(), json))
    } else {
        Arc::new(SharePointDocument::new(ctx.clone(), json))
    }
}

pub fn folder_from_json(ctx: &Arc<SharePointContext>, json: JsonObject) -> CmisResult<FolderPtr> {
    let id = metadata_uri(&json).unwrap_or_default();
    object_from_json(ctx, json)
        .into_folder()
        .ok_or_else(|| CmisError::invalid(format!("Object {id} is not a folder")))
}

pub fn document_from_json(ctx: &Arc<SharePointContext>, json: JsonObject) -> CmisResult<DocumentPtr> {
    let id = metadata_uri(&json).unwrap_or_default();
    object_from_json(ctx, json)
        .into_document()
        .ok_or_else(|| CmisError::invalid(format!("Object {id} is not a document")))
}

fn actions_for(is_folder: bool) -> AllowableActions {
    AllowableActions::for_base_type(is_folder, true, !is_folder)
}

pub struct SharePointState {
    ctx: Arc<SharePointContext>,
    core: ObjectCore,
}

impl SharePointState {
    pub fn new(ctx: Arc<SharePointContext>, json: JsonObject) -> Self {
        let core = ObjectCore::new(ctx.clone(), to_cmis_properties(&json))
            .with_allowable_actions(Some(actions_for(is_folder(&json))));
        Self { ctx, core }
    }

    pub fn ctx(&self) -> &Arc<SharePointContext> {
        &self.ctx
    }

    pub fn core(&self) -> &ObjectCore {
        &self.core
    }

    /// Resource URI, usable as is.
    pub fn id(&self) -> String {
        self.core.string("cmis:objectId").unwrap_or_default()
    }

    pub fn is_folder(&self) -> bool {
        self.core.string("cmis:baseTypeId").as_deref() == Some("cmis:folder")
    }

    pub fn type_name(&self) -> &'static str {
        if self.is_folder() {
            FOLDER_TYPE
        } else {
            FILE_TYPE
        }
    }

    pub fn path(&self) -> String {
        self.core.string("cmis:path").unwrap_or_default()
    }

    pub fn reload(&self, json: JsonObject) {
        let folder = is_folder(&json);
        self.core
            .reload(to_cmis_properties(&json), Some(actions_for(folder)));
    }

    pub fn reload_from(&self, url: &str) -> CmisResult<()> {
        let json = self.ctx.fetch(url)?;
        self.reload(json);
        Ok(())
    }

    pub fn refresh(&self) -> CmisResult<()> {
        self.reload_from(&self.id())
    }

    /// MERGE the changed members, then reload since MERGE answers with no
    /// content.
    pub fn update_properties(&self, properties: &PropertyMap) -> CmisResult<()> {
        let body = to_sharepoint_json(properties, self.type_name());
        let request = HttpRequest::new(Method::POST, self.id())
            .header("X-HTTP-Method", "MERGE")
            .header("IF-MATCH", "*")
            .header("Content-Type", VERBOSE_JSON)
            .body(serde_json::to_vec(&body)?);
        self.ctx.mutate(request)?;
        self.refresh()
    }

    pub fn remove(&self) -> CmisResult<()> {
        let request = HttpRequest::new(Method::DELETE, self.id()).header("IF-MATCH", "*");
        self.ctx.mutate(request)?;
        self.core.touch();
        Ok(())
    }

    pub fn allowable_actions(&self) -> CmisResult<AllowableActions> {
        self.core
            .allowable_actions(|| Ok(actions_for(self.is_folder())))
    }

    /// Id of the containing folder, looked up once through the
    /// `ParentFolder` link or derived from the server-relative path.
    pub fn parent_id(&self) -> CmisResult<Option<String>> {
        if let Some(id) = self.core.string("cmis:parentId").filter(|id| !id.is_empty()) {
            return Ok(Some(id));
        }
        let parent = if let Some(link) = self.core.string("ParentFolder") {
            metadata_uri(&self.ctx.fetch(&link)?)
        } else {
            parent_path(&self.path()).map(|p| self.ctx.folder_url(p))
        };
        let Some(parent) = parent.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        self.core
            .set_property(Property::id("cmis:parentId", parent.clone()));
        Ok(Some(parent))
    }

    /// Parent id, `None` when the lookup fails.
    pub fn cached_parent_id(&self) -> Option<String> {
        self.parent_id().unwrap_or_else(|e| {
            warn!("Cannot find the parent of {}: {e}", self.id());
            None
        })
    }

    pub fn parent(&self) -> CmisResult<Option<FolderPtr>> {
        match self.parent_id()? {
            Some(id) => folder_from_json(&self.ctx, self.ctx.fetch(&self.ctx.resolve(&id))?).map(Some),
            None => Ok(None),
        }
    }

    /// Move a file under `destination_path`, keeping its name. The URI of
    /// a file contains its path, so the object is reloaded from the new one.
    pub fn move_file(&self, destination_path: &str) -> CmisResult<()> {
        if self.is_folder() {
            return Err(CmisError::unsupported("SharePoint folders cannot be moved"));
        }
        let name = self.core.string("cmis:name").unwrap_or_default();
        let target = format!("{}/{}", destination_path.trim_end_matches('/'), name);
        let url = format!("{}/moveto(newurl={},flags=1)", self.id(), quote(&target));
        self.ctx.invoke(&url)?;
        self.reload_from(&self.ctx.file_url(&target))
    }
}
