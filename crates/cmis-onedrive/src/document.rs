//! OneDrive files as CMIS documents.

use std::io::Read;
use std::sync::Arc;

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisErrorKind, CmisObject, CmisResult, ContentHolder,
    ContentStream, Document, DocumentPtr, Fileable, Folder, FolderPtr, PropertyMap, Versionable,
};

use crate::object::OneDriveState;
use crate::session::OneDriveContext;
use crate::utils::JsonObject;

fn unsupported(operation: &str) -> CmisError {
    CmisError::unsupported(format!("OneDrive does not support {operation}"))
}

pub struct OneDriveDocument {
    state: OneDriveState,
}

impl OneDriveDocument {
    pub fn new(ctx: Arc<OneDriveContext>, json: JsonObject) -> Self {
        Self {
            state: OneDriveState::new(ctx, json),
        }
    }

    pub fn content_url(&self) -> String {
        format!("{}/content", self.state.url())
    }
}

impl CmisObject for OneDriveDocument {
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

    fn as_document(&self) -> Option<&dyn Document> {
        Some(self)
    }

    fn into_document(self: Arc<Self>) -> Option<DocumentPtr> {
        Some(self)
    }
}

impl Fileable for OneDriveDocument {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        Ok(self.state.parent()?.into_iter().collect())
    }

    fn move_object(&self, _source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_object(&destination.id())
    }
}

impl ContentHolder for OneDriveDocument {
    /// OneDrive does not report a MIME type; guess it from the name.
    fn content_type(&self) -> String {
        mime_guess::from_path(self.name())
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string()
    }

    fn get_content_stream(&self) -> CmisResult<ContentStream> {
        Ok(self.state.ctx().http.get(&self.content_url())?.into_reader())
    }

    /// Re-upload the file into its folder. The upload answers with the id
    /// of the stored file, which is then reloaded.
    fn set_content_stream(
        &self,
        stream: &mut dyn Read,
        _content_type: &str,
        filename: &str,
        overwrite: bool,
    ) -> CmisResult<()> {
        if !overwrite && self.content_length() > 0 {
            return Err(CmisError::new(
                CmisErrorKind::Other("contentAlreadyExists".into()),
                format!("Document {} already has content", self.state.id()),
            ));
        }
        let folder_id = self.state.parent_id().ok_or_else(|| {
            CmisError::runtime(format!("Document {} has no parent folder", self.state.id()))
        })?;
        let name = if filename.is_empty() {
            self.name()
        } else {
            filename.to_string()
        };
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;

        let id = self.state.ctx().upload(&folder_id, &name, &data)?;
        self.state.reload_from(&id)
    }
}

impl Versionable for OneDriveDocument {
    fn check_out(&self) -> CmisResult<DocumentPtr> {
        Err(unsupported("checkout"))
    }

    fn cancel_checkout(&self) -> CmisResult<()> {
        Err(unsupported("checkout"))
    }

    fn check_in(
        &self,
        _is_major: bool,
        _comment: &str,
        _properties: &PropertyMap,
        _stream: Option<&mut dyn Read>,
        _content_type: &str,
        _filename: &str,
    ) -> CmisResult<DocumentPtr> {
        Err(unsupported("checkin"))
    }

    fn get_all_versions(&self) -> CmisResult<Vec<DocumentPtr>> {
        Err(unsupported("version series"))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
