//! WS documents: content and the VersioningService.

use std::io::{Cursor, Read};
use std::sync::Arc;

use log::debug;

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisObject, CmisResult, ContentHolder, ContentStream, Document, DocumentPtr,
    Fileable, Folder, FolderPtr, PropertyMap, Versionable,
};

use crate::object::{document_from_data, WsState};
use crate::services::{ObjectData, WsContext};
use crate::soap::ContentUpload;

pub struct WsDocument {
    state: WsState,
}

impl WsDocument {
    pub fn new(ctx: Arc<WsContext>, data: ObjectData) -> Self {
        Self {
            state: WsState::new(ctx, data),
        }
    }

    fn fetch_document(&self, id: &str) -> CmisResult<DocumentPtr> {
        let ctx = self.state.ctx();
        document_from_data(ctx, ctx.get_object(id)?)
    }
}

impl CmisObject for WsDocument {
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

    fn as_document(&self) -> Option<&dyn Document> {
        Some(self)
    }

    fn into_document(self: Arc<Self>) -> Option<DocumentPtr> {
        Some(self)
    }
}

impl Fileable for WsDocument {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        self.state.parents()
    }

    fn move_object(&self, source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_object(&source.id(), &destination.id())
    }
}

impl ContentHolder for WsDocument {
    /// The SOAP answer is parsed whole, so the content is held in memory
    /// once: an MTOM part is handed over as is, inline base64 is decoded.
    fn get_content_stream(&self) -> CmisResult<ContentStream> {
        let data = self.state.ctx().get_content_stream(&self.state.id())?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn set_content_stream(
        &self,
        stream: &mut dyn Read,
        content_type: &str,
        filename: &str,
        overwrite: bool,
    ) -> CmisResult<()> {
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        let content = ContentUpload {
            data: &data,
            mime_type: content_type,
            filename,
        };
        debug!("Uploading content of {}", self.state.id());
        let token = self.state.change_token();
        let id = self.state.ctx().set_content_stream(
            &self.state.id(),
            overwrite,
            token.as_deref(),
            &content,
        )?;
        self.state.reload_from(&id)
    }
}

impl Versionable for WsDocument {
    fn check_out(&self) -> CmisResult<DocumentPtr> {
        let pwc_id = self.state.ctx().check_out(&self.state.id())?;
        self.state.core().touch();
        self.fetch_document(&pwc_id)
    }

    fn cancel_checkout(&self) -> CmisResult<()> {
        debug!("Cancelling check-out of {}", self.state.id());
        self.state.ctx().cancel_check_out(&self.state.id())?;
        self.state.core().touch();
        Ok(())
    }

    fn check_in(
        &self,
        is_major: bool,
        comment: &str,
        properties: &PropertyMap,
        stream: Option<&mut dyn Read>,
        content_type: &str,
        filename: &str,
    ) -> CmisResult<DocumentPtr> {
        let mut data = Vec::new();
        let has_content = match stream {
            Some(stream) => {
                stream.read_to_end(&mut data)?;
                true
            }
            None => false,
        };
        let content = ContentUpload {
            data: &data,
            mime_type: content_type,
            filename,
        };
        let id = self.state.ctx().check_in(
            &self.state.id(),
            is_major,
            properties,
            has_content.then_some(&content),
            comment,
        )?;
        self.state.core().touch();
        self.fetch_document(&id)
    }

    fn get_all_versions(&self) -> CmisResult<Vec<DocumentPtr>> {
        let ctx = self.state.ctx();
        ctx.get_all_versions(&self.state.id())?
            .into_iter()
            .map(|data| document_from_data(ctx, data))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
