//! AtomPub documents: content transfer and versioning.

use std::io::Read;
use std::sync::Arc;

use log::debug;
use reqwest::Method;

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisError, CmisObject, CmisResult, ContentHolder, ContentStream, Document,
    DocumentPtr, Fileable, Folder, FolderPtr, HttpRequest, Property, PropertyMap, Versionable,
};

use crate::entry::{rel, AtomEntry, InlineContent};
use crate::object::{bool_param, document_from_entry, AtomContext, AtomState};
use crate::transfer::{Base64Encoder, TransferDecoder, TransferEncoding};
use crate::uri_template::append_query;
use crate::workspace::Collection;

pub struct AtomDocument {
    state: AtomState,
}

impl AtomDocument {
    pub fn new(ctx: Arc<AtomContext>, entry: AtomEntry) -> Self {
        Self {
            state: AtomState::new(ctx, entry),
        }
    }

    /// Where the content is read from: `atom:content@src`, else `edit-media`.
    pub fn content_url(&self) -> Option<String> {
        let links = self.state.links();
        links
            .content_src
            .clone()
            .or_else(|| links.href(rel::EDIT_MEDIA, None))
    }
}

impl CmisObject for AtomDocument {
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

impl Fileable for AtomDocument {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        self.state.parents()
    }

    fn move_object(&self, source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_object(&source.id(), &destination.id())
    }
}

impl ContentHolder for AtomDocument {
    fn content_type(&self) -> String {
        self.core()
            .string("cmis:contentStreamMimeType")
            .or_else(|| self.state.links().content_type)
            .unwrap_or_default()
    }

    fn get_content_stream(&self) -> CmisResult<ContentStream> {
        let url = self.content_url().ok_or_else(|| {
            CmisError::runtime(format!("Document {} has no content", self.state.id()))
        })?;
        let response = self.state.ctx().http.get(&url)?;
        let encoding = TransferEncoding::from_header(response.header("Content-Transfer-Encoding"));
        Ok(Box::new(TransferDecoder::new(response.into_reader(), encoding)))
    }

    fn set_content_stream(
        &self,
        stream: &mut dyn Read,
        content_type: &str,
        filename: &str,
        overwrite: bool,
    ) -> CmisResult<()> {
        let media = self.state.link(rel::EDIT_MEDIA, None).ok_or_else(|| {
            CmisError::runtime(format!("Document {} has no edit-media link", self.state.id()))
        })?;
        let url = append_query(&media, &[("overwriteFlag", bool_param(overwrite))])?;

        let mut body = Vec::new();
        stream.read_to_end(&mut body)?;
        let mut request = HttpRequest::new(Method::PUT, url)
            .header("Content-Type", content_type)
            .body(body);
        if !filename.is_empty() {
            request = request.header(
                "Content-Disposition",
                format!("attachment; filename=\"{filename}\""),
            );
        }
        debug!("Uploading content of {}", self.state.id());
        self.state.ctx().http.send(&request)?;
        self.state.refresh()
    }
}

impl Versionable for AtomDocument {
    fn check_out(&self) -> CmisResult<DocumentPtr> {
        let ctx = self.state.ctx();
        let url = ctx
            .workspace
            .collection_url(Collection::CheckedOut)
            .ok_or_else(|| CmisError::unsupported("Repository has no checkedout collection"))?
            .to_string();

        let mut properties = PropertyMap::new();
        properties.insert(
            "cmis:objectId".into(),
            Property::id("cmis:objectId", self.state.id()),
        );
        let entry = ctx
            .send_entry(Method::POST, &url, self.state.entry_body(&properties, None))?
            .ok_or_else(|| CmisError::runtime("Empty answer to check-out"))?;
        self.state.core().touch();
        document_from_entry(ctx, entry)
    }

    fn cancel_checkout(&self) -> CmisResult<()> {
        let url = self.state.edit_url()?;
        debug!("Cancelling check-out of {}", self.state.id());
        self.state.ctx().http.delete(&url)?;
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
        let content = match stream {
            Some(stream) => Some(InlineContent {
                media_type: content_type.to_string(),
                base64: Base64Encoder::encode_stream(stream)?,
            }),
            None => None,
        };
        let mut properties = properties.clone();
        if content.is_some() && !filename.is_empty() {
            properties
                .entry("cmis:contentStreamFileName".into())
                .or_insert_with(|| Property::string("cmis:contentStreamFileName", filename));
        }
        let url = append_query(
            &self.state.edit_url()?,
            &[
                ("checkin", "true"),
                ("major", bool_param(is_major)),
                ("checkinComment", comment),
            ],
        )?;

        let ctx = self.state.ctx();
        let body = self.state.entry_body(&properties, content.as_ref());
        let entry = match ctx.send_entry(Method::PUT, &url, body)? {
            Some(entry) => entry,
            None => ctx.fetch_entry(&self.state.self_url()?)?,
        };
        self.state.core().touch();
        document_from_entry(ctx, entry)
    }

    fn get_all_versions(&self) -> CmisResult<Vec<DocumentPtr>> {
        let url = self.state.link(rel::VERSION_HISTORY, None).ok_or_else(|| {
            CmisError::unsupported(format!("Document {} is not versionable", self.state.id()))
        })?;
        let ctx = self.state.ctx();
        ctx.fetch_feed(&url)?
            .into_iter()
            .map(|entry| document_from_entry(ctx, entry))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
