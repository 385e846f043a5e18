//! State shared by every WS object, and the generic object kind.
//!
//! Unlike AtomPub objects, WS objects carry no links: every operation is a
//! service call addressed by the object id.

use std::sync::Arc;

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, BaseType, CmisError, CmisObject, CmisResult, DocumentPtr, FolderPtr,
    ObjectPtr, PropertyMap,
};

use crate::document::WsDocument;
use crate::folder::WsFolder;
use crate::services::{ObjectData, WsContext};

/// Build the object matching the base type of the data.
pub fn object_from_data(ctx: &Arc<WsContext>, data: ObjectData) -> ObjectPtr {
    match data.base_type() {
        BaseType::Folder => Arc::new(WsFolder::new(ctx.clone(), data)),
        BaseType::Document => Arc::new(WsDocument::new(ctx.clone(), data)),
        _ => Arc::new(WsObject::new(ctx.clone(), data)),
    }
}

pub fn folder_from_data(ctx: &Arc<WsContext>, data: ObjectData) -> CmisResult<FolderPtr> {
    let id = data.id();
    object_from_data(ctx, data)
        .into_folder()
        .ok_or_else(|| CmisError::runtime(format!("Object {id} is not a folder")))
}

pub fn document_from_data(ctx: &Arc<WsContext>, data: ObjectData) -> CmisResult<DocumentPtr> {
    let id = data.id();
    object_from_data(ctx, data)
        .into_document()
        .ok_or_else(|| CmisError::runtime(format!("Object {id} is not a document")))
}

pub struct WsState {
    ctx: Arc<WsContext>,
    core: ObjectCore,
}

impl WsState {
    pub fn new(ctx: Arc<WsContext>, data: ObjectData) -> Self {
        let core =
            ObjectCore::new(ctx.clone(), data.properties).with_allowable_actions(data.allowable_actions);
        Self { ctx, core }
    }

    pub fn ctx(&self) -> &Arc<WsContext> {
        &self.ctx
    }

    pub fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn id(&self) -> String {
        self.core.string("cmis:objectId").unwrap_or_default()
    }

    pub fn change_token(&self) -> Option<String> {
        self.core.string("cmis:changeToken").filter(|t| !t.is_empty())
    }

    /// Reload from the object with the given id, which the server may have
    /// assigned to a new version.
    pub fn reload_from(&self, id: &str) -> CmisResult<()> {
        let data = self.ctx.get_object(id)?;
        self.core.reload(data.properties, data.allowable_actions);
        Ok(())
    }

    pub fn refresh(&self) -> CmisResult<()> {
        self.reload_from(&self.id())
    }

    pub fn update_properties(&self, properties: &PropertyMap) -> CmisResult<()> {
        let token = self.change_token();
        let id = self
            .ctx
            .update_properties(&self.id(), token.as_deref(), properties)?;
        self.reload_from(&id)
    }

    pub fn remove(&self, all_versions: bool) -> CmisResult<()> {
        self.ctx.delete_object(&self.id(), all_versions)?;
        self.core.touch();
        Ok(())
    }

    pub fn allowable_actions(&self) -> CmisResult<AllowableActions> {
        self.core
            .allowable_actions(|| self.ctx.get_allowable_actions(&self.id()))
    }

    pub fn parents(&self) -> CmisResult<Vec<FolderPtr>> {
        self.ctx
            .get_object_parents(&self.id())?
            .into_iter()
            .map(|data| folder_from_data(&self.ctx, data))
            .collect()
    }

    pub fn move_object(&self, source_id: &str, destination_id: &str) -> CmisResult<()> {
        let id = self.ctx.move_object(&self.id(), destination_id, source_id)?;
        self.reload_from(&id)
    }
}

/// An object that is neither a folder nor a document.
pub struct WsObject {
    state: WsState,
}

impl WsObject {
    pub fn new(ctx: Arc<WsContext>, data: ObjectData) -> Self {
        Self {
            state: WsState::new(ctx, data),
        }
    }
}

impl CmisObject for WsObject {
    fn core(&self) -> &ObjectCore {
        self.state.core()
    }

    fn refresh(&self) -> CmisResult<()> {
        self.state.refresh()
    }

    fn update_properties(&self, properties: &PropertyMap) -> CmisResult<()> {
        self.state.update_properties(properties)
    }

    fn remove(&self, all_versions: bool) -> CmisResult<()> {
        self.state.remove(all_versions)
    }

    fn get_allowable_actions(&self) -> CmisResult<AllowableActions> {
        self.state.allowable_actions()
    }
}
