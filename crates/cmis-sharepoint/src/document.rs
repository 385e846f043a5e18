//! SharePoint files as CMIS documents, with native check-out/check-in.

use std::io::Read;
use std::sync::Arc;

use log::debug;
use reqwest::Method;
use serde_json::Value;

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisErrorKind, CmisObject, CmisResult, ContentHolder,
    ContentStream, Document, DocumentPtr, Fileable, Folder, FolderPtr, HttpRequest, PropertyMap,
    Versionable,
};

use crate::object::{document_from_json, SharePointState};
use crate::session::SharePointContext;
use crate::utils::{quote, JsonObject};

/// `checkintype` values of `CheckIn()`.
const MINOR_CHECK_IN: u8 = 0;
const MAJOR_CHECK_IN: u8 = 1;

pub struct SharePointDocument {
    state: SharePointState,
}

impl SharePointDocument {
    pub fn new(ctx: Arc<SharePointContext>, json: JsonObject) -> Self {
        Self {
            state: SharePointState::new(ctx, json),
        }
    }

    pub fn content_url(&self) -> String {
        format!("{}/$value", self.state.id())
    }

    /// Overwrite the file content in place.
    fn upload(&self, stream: &mut dyn Read) -> CmisResult<()> {
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        debug!("Uploading {} bytes to {}", data.len(), self.content_url());
        let request = HttpRequest::new(Method::POST, self.content_url())
            .header("X-HTTP-Method", "PUT")
            .body(data);
        self.state.ctx().mutate(request)?;
        Ok(())
    }

    /// A historical version as a document. Versions only carry a few
    /// members, the name and path come from the current file.
    fn version_document(&self, mut version: JsonObject) -> CmisResult<DocumentPtr> {
        if let Some(name) = self.state.core().string("cmis:name") {
            version.entry("Name").or_insert(Value::String(name));
        }
        if let Some(size) = version.remove("Size") {
            version.insert("Length".into(), size);
        }
        if let Some(created) = version.remove("Created") {
            version.insert("TimeLastModified".into(), created.clone());
            version.insert("TimeCreated".into(), created);
        }
        if let Some(label) = version.remove("VersionLabel") {
            version.insert("UIVersionLabel".into(), label);
        }
        document_from_json(self.state.ctx(), version)
    }
}

impl CmisObject for SharePointDocument {
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

impl Fileable for SharePointDocument {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        Ok(self.state.parent()?.into_iter().collect())
    }

    fn move_object(&self, _source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_file(&destination.path())
    }
}

impl ContentHolder for SharePointDocument {
    fn get_content_stream(&self) -> CmisResult<ContentStream> {
        Ok(self.state.ctx().http.get(&self.content_url())?.into_reader())
    }

    /// The file keeps its name: `filename` and `content_type` are not
    /// stored by SharePoint.
    fn set_content_stream(
        &self,
        stream: &mut dyn Read,
        _content_type: &str,
        _filename: &str,
        overwrite: bool,
    ) -> CmisResult<()> {
        if !overwrite && self.content_length() > 0 {
            return Err(CmisError::new(
                CmisErrorKind::Other("contentAlreadyExists".into()),
                format!("Document {} already has content", self.state.id()),
            ));
        }
        self.upload(stream)?;
        self.state.refresh()
    }
}

impl Versionable for SharePointDocument {
    /// SharePoint has no separate working copy: the checked out file is
    /// its own PWC.
    fn check_out(&self) -> CmisResult<DocumentPtr> {
        let ctx = self.state.ctx();
        ctx.invoke(&format!("{}/checkout", self.state.id()))?;
        self.state.refresh()?;
        document_from_json(ctx, ctx.fetch(&self.state.id())?)
    }

    fn cancel_checkout(&self) -> CmisResult<()> {
        self.state
            .ctx()
            .invoke(&format!("{}/undocheckout", self.state.id()))?;
        self.state.refresh()
    }

    fn check_in(
        &self,
        is_major: bool,
        comment: &str,
        properties: &PropertyMap,
        stream: Option<&mut dyn Read>,
        _content_type: &str,
        _filename: &str,
    ) -> CmisResult<DocumentPtr> {
        if let Some(stream) = stream {
            self.upload(stream)?;
        }
        if !properties.is_empty() {
            self.state.update_properties(properties)?;
        }

        let kind = if is_major { MAJOR_CHECK_IN } else { MINOR_CHECK_IN };
        let ctx = self.state.ctx();
        ctx.invoke(&format!(
            "{}/checkin(comment={},checkintype={kind})",
            self.state.id(),
            quote(comment)
        ))?;
        self.state.refresh()?;
        document_from_json(ctx, ctx.fetch(&self.state.id())?)
    }

    /// The current file followed by its earlier versions, newest first.
    fn get_all_versions(&self) -> CmisResult<Vec<DocumentPtr>> {
        let ctx = self.state.ctx();
        let id = self.state.id();
        let mut versions = vec![document_from_json(ctx, ctx.fetch(&id)?)?];
        let mut history = ctx.fetch_results(&format!("{id}/Versions"))?;
        history.reverse();
        for version in history {
            versions.push(self.version_document(version)?);
        }
        Ok(versions)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
