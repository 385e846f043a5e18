//! Drive files as CMIS documents.

use std::io::Read;
use std::sync::Arc;

use reqwest::Method;
use serde_json::{Map, Value};

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisErrorKind, CmisObject, CmisResult, ContentHolder,
    ContentStream, Document, DocumentPtr, Fileable, Folder, FolderPtr, HttpRequest, PropertyMap,
    Versionable,
};

use crate::object::GDriveState;
use crate::session::GDriveContext;
use crate::utils::{is_google_doc, JsonObject};

/// Export formats tried, in order, for Google Docs files.
const EXPORT_PREFERENCES: [&str; 4] = [
    "application/vnd.oasis.opendocument.text",
    "application/vnd.oasis.opendocument.spreadsheet",
    "application/vnd.oasis.opendocument.presentation",
    "application/pdf",
];

fn unsupported(operation: &str) -> CmisError {
    CmisError::unsupported(format!("Google Drive does not support {operation}"))
}

pub struct GDriveDocument {
    state: GDriveState,
}

impl GDriveDocument {
    pub fn new(ctx: Arc<GDriveContext>, json: JsonObject) -> Self {
        Self {
            state: GDriveState::new(ctx, json),
        }
    }

    /// Direct download link, or an export link for Google Docs files.
    pub fn download_url(&self) -> Option<String> {
        if let Some(url) = self
            .state
            .json_value("downloadUrl")
            .and_then(|v| v.as_str().map(str::to_string))
        {
            return Some(url);
        }
        let links: Map<String, Value> = self
            .state
            .json_value("exportLinks")
            .and_then(|v| v.as_object().cloned())?;
        EXPORT_PREFERENCES
            .iter()
            .find_map(|format| links.get(*format))
            .or_else(|| links.values().next())
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

impl CmisObject for GDriveDocument {
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

impl Fileable for GDriveDocument {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        self.state.parents()
    }

    fn move_object(&self, source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_object(&source.id(), &destination.id())
    }
}

impl ContentHolder for GDriveDocument {
    fn get_content_stream(&self) -> CmisResult<ContentStream> {
        let url = self.download_url().ok_or_else(|| {
            CmisError::runtime(format!("No download link for {}", self.state.id()))
        })?;
        let response = self.state.ctx().http.send(&HttpRequest::get(url))?;
        Ok(response.into_reader())
    }

    /// Upload the media, then update the title and reload.
    fn set_content_stream(
        &self,
        stream: &mut dyn Read,
        content_type: &str,
        filename: &str,
        overwrite: bool,
    ) -> CmisResult<()> {
        if !overwrite && self.content_length() > 0 {
            return Err(CmisError::new(
                CmisErrorKind::Other("contentAlreadyExists".into()),
                format!("Document {} already has content", self.state.id()),
            ));
        }
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;

        let ctx = self.state.ctx();
        let id = self.state.id();
        let convert = is_google_doc(&self.content_type());
        ctx.upload(&id, &data, content_type, convert)?;

        let mut metadata = Map::new();
        if !filename.is_empty() {
            metadata.insert("title".into(), Value::String(filename.to_string()));
        }
        let mut url = self.state.url();
        if convert {
            url.push_str("?convert=true");
        } else if !content_type.is_empty() {
            metadata.insert("mimeType".into(), Value::String(content_type.to_string()));
        }
        let json = ctx.send_json(Method::PUT, &url, &Value::Object(metadata))?;
        self.state.reload(json);
        Ok(())
    }
}

impl Versionable for GDriveDocument {
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
