//! AtomPub folders.

use std::io::Read;
use std::sync::Arc;

use log::{debug, warn};
use reqwest::Method;

use cmis_core::object::ObjectCore;
use cmis_core::xml::{ns, XmlElement};
use cmis_core::{
    AllowableActions, CmisError, CmisObject, CmisResult, DocumentPtr, Fileable, Folder,
    FolderPtr, HttpRequest, ObjectPtr, PropertyMap, UnfileObjects,
};

use crate::entry::{parse_feed, rel, AtomEntry, InlineContent, FEED_TYPE, TREE_TYPE};
use crate::object::{
    bool_param, document_from_entry, folder_from_entry, object_from_entry, AtomContext, AtomState,
};
use crate::transfer::Base64Encoder;
use crate::uri_template::append_query;

pub struct AtomFolder {
    state: AtomState,
}

impl AtomFolder {
    pub fn new(ctx: Arc<AtomContext>, entry: AtomEntry) -> Self {
        Self {
            state: AtomState::new(ctx, entry),
        }
    }

    /// URL of the children feed.
    pub fn children_url(&self) -> Option<String> {
        self.state.link(rel::DOWN, Some(FEED_TYPE))
    }

    fn require_children_url(&self) -> CmisResult<String> {
        self.children_url().ok_or_else(|| {
            CmisError::runtime(format!("Folder {} has no children feed", self.state.id()))
        })
    }

    /// POST a new entry to the children feed.
    fn post_child(&self, body: String) -> CmisResult<AtomEntry> {
        let url = self.require_children_url()?;
        self.state
            .ctx()
            .send_entry(Method::POST, &url, body)?
            .ok_or_else(|| CmisError::runtime("Empty answer to object creation"))
    }
}

impl CmisObject for AtomFolder {
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

    fn as_folder(&self) -> Option<&dyn Folder> {
        Some(self)
    }

    fn into_folder(self: Arc<Self>) -> Option<FolderPtr> {
        Some(self)
    }
}

impl Fileable for AtomFolder {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        self.state.parents()
    }

    fn move_object(&self, source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_object(&source.id(), &destination.id())
    }
}

impl Folder for AtomFolder {
    fn is_root_folder(&self) -> bool {
        self.state.id() == self.state.ctx().workspace.root_id() || self.parent_id().is_none()
    }

    fn get_folder_parent(&self) -> CmisResult<Option<FolderPtr>> {
        if self.is_root_folder() {
            return Ok(None);
        }
        Ok(self.state.parents()?.into_iter().next())
    }

    fn get_children(&self) -> CmisResult<Vec<ObjectPtr>> {
        let url = self.require_children_url()?;
        let ctx = self.state.ctx();
        Ok(ctx
            .fetch_feed(&url)?
            .into_iter()
            .map(|entry| object_from_entry(ctx, entry))
            .collect())
    }

    fn create_folder(&self, properties: &PropertyMap) -> CmisResult<FolderPtr> {
        debug!("Creating folder in {}", self.state.id());
        let entry = self.post_child(self.state.entry_body(properties, None))?;
        folder_from_entry(self.state.ctx(), entry)
    }

    fn create_document(
        &self,
        properties: &PropertyMap,
        stream: &mut dyn Read,
        content_type: &str,
        filename: &str,
    ) -> CmisResult<DocumentPtr> {
        debug!("Creating document {filename} in {}", self.state.id());
        let content = InlineContent {
            media_type: content_type.to_string(),
            base64: Base64Encoder::encode_stream(stream)?,
        };
        let entry = self.post_child(self.state.entry_body(properties, Some(&content)))?;
        document_from_entry(self.state.ctx(), entry)
    }

    fn remove_tree(
        &self,
        all_versions: bool,
        unfile: UnfileObjects,
        continue_on_error: bool,
    ) -> CmisResult<Vec<String>> {
        let tree = self
            .state
            .link(rel::FOLDER_TREE, None)
            .or_else(|| self.state.link(rel::DOWN, Some(TREE_TYPE)))
            .ok_or_else(|| {
                CmisError::unsupported(format!("Folder {} has no folder tree link", self.state.id()))
            })?;
        let url = append_query(
            &tree,
            &[
                ("allVersions", bool_param(all_versions)),
                ("unfileObjects", unfile.as_str()),
                ("continueOnFailure", bool_param(continue_on_error)),
            ],
        )?;

        let response = self
            .state
            .ctx()
            .http
            .send_unchecked(&HttpRequest::new(Method::DELETE, url))?;
        if response.is_success() {
            self.state.core().touch();
            return Ok(Vec::new());
        }

        // Partial failures come back as a feed of the objects left behind.
        let status = response.status;
        let body = response.bytes()?;
        let failed = XmlElement::parse_bytes(&body)
            .ok()
            .filter(|doc| doc.is(ns::ATOM, "feed"))
            .and_then(|doc| parse_feed(&doc).ok())
            .map(|(entries, _)| entries.iter().filter_map(AtomEntry::id).collect::<Vec<_>>());
        match failed {
            Some(ids) if !ids.is_empty() => {
                warn!("{} objects could not be deleted under {}", ids.len(), self.state.id());
                self.state.core().touch();
                Ok(ids)
            }
            _ => Err(CmisError::from_status(status, &String::from_utf8_lossy(&body))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use cmis_core::{CmisErrorKind, Property, Session};
    use std::io::Cursor;

    #[test]
    fn children_are_discriminated() {
        let (mock, session) = fixtures::session();
        mock.expect("GET", "http://mockup/mock/children/root-folder").respond(
            200,
            fixtures::feed(
                &[
                    fixtures::folder_entry("child-folder", "Child", "root-folder", "/Child"),
                    fixtures::document_entry("doc-1", "a.txt"),
                    fixtures::document_entry("doc-2", "b.txt"),
                ],
                None,
            ),
        );

        let root = session.get_root_folder().unwrap();
        assert!(root.is_root_folder());
        let children = root.get_children().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children.iter().filter(|c| c.as_folder().is_some()).count(), 1);
        assert_eq!(children.iter().filter(|c| c.as_document().is_some()).count(), 2);
    }

    #[test]
    fn children_follow_next_links() {
        let (mock, session) = fixtures::session();
        mock.expect("GET", "http://mockup/mock/children/root-folder?page=2").respond(
            200,
            fixtures::feed(&[fixtures::document_entry("doc-2", "b.txt")], None),
        );
        mock.expect("GET", "http://mockup/mock/children/root-folder").respond(
            200,
            fixtures::feed(
                &[fixtures::document_entry("doc-1", "a.txt")],
                Some("http://mockup/mock/children/root-folder?page=2"),
            ),
        );
        let children = session.get_root_folder().unwrap().get_children().unwrap();
        let ids: Vec<String> = children.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["doc-1", "doc-2"]);
    }

    #[test]
    fn folder_parent_of_root_is_none() {
        let (mock, session) = fixtures::session();
        mock.expect("GET", "http://mockup/mock/id?id=child-folder").respond(
            200,
            fixtures::folder_entry("child-folder", "Child", "root-folder", "/Child"),
        );
        mock.expect("GET", "http://mockup/mock/parents/child-folder")
            .respond(200, fixtures::folder_entry("root-folder", "Root", "", "/"));

        let root = session.get_root_folder().unwrap();
        assert!(root.get_folder_parent().unwrap().is_none());

        let child = session.get_folder("child-folder").unwrap();
        assert_eq!(child.path(), "/Child");
        assert!(!child.is_root_folder());
        let parent = child.get_folder_parent().unwrap().unwrap();
        assert_eq!(parent.id(), "root-folder");
    }

    #[test]
    fn create_document_posts_base64_content() {
        let (mock, session) = fixtures::session();
        mock.expect("POST", "http://mockup/mock/children/root-folder")
            .respond(201, fixtures::document_entry("new-doc", "hello.txt"));

        let mut props = PropertyMap::new();
        props.insert("cmis:name".into(), Property::string("cmis:name", "hello.txt"));
        props.insert("cmis:objectTypeId".into(), Property::id("cmis:objectTypeId", "cmis:document"));
        let root = session.get_root_folder().unwrap();
        let doc = root
            .create_document(&props, &mut Cursor::new(b"Hello".to_vec()), "text/plain", "hello.txt")
            .unwrap();
        assert_eq!(doc.id(), "new-doc");

        let sent = mock.requests_to("POST", "http://mockup/mock/children/root-folder");
        let body = sent[0].body_text();
        assert!(body.contains("<cmisra:base64>SGVsbG8=</cmisra:base64>"));
        assert!(body.contains("<cmisra:mediatype>text/plain</cmisra:mediatype>"));
        assert!(body.contains("<atom:title>hello.txt</atom:title>"));
        assert_eq!(sent[0].header_value("content-type"), Some("application/atom+xml;type=entry"));
    }

    #[test]
    fn create_folder_rejects_document_answer() {
        let (mock, session) = fixtures::session();
        mock.expect("POST", "http://mockup/mock/children/root-folder")
            .respond(201, fixtures::document_entry("oops", "oops.txt"));
        let root = session.get_root_folder().unwrap();
        let err = root.create_folder(&PropertyMap::new()).err().unwrap();
        assert_eq!(err.kind, CmisErrorKind::Runtime);
    }

    #[test]
    fn remove_tree_reports_failed_ids() {
        let (mock, session) = fixtures::session();
        mock.expect("DELETE", "http://mockup/mock/tree/root-folder").respond(
            500,
            fixtures::feed(&[fixtures::document_entry("locked-doc", "locked.txt")], None),
        );
        let root = session.get_root_folder().unwrap();
        let failed = root
            .remove_tree(true, UnfileObjects::Delete, true)
            .unwrap();
        assert_eq!(failed, vec!["locked-doc"]);

        let sent = mock.requests_to("DELETE", "http://mockup/mock/tree/root-folder");
        assert!(sent[0].url.contains("unfileObjects=delete"));
        assert!(sent[0].url.contains("continueOnFailure=true"));
    }

    #[test]
    fn remove_tree_success_touches_timestamp() {
        let (mock, session) = fixtures::session();
        mock.expect("DELETE", "http://mockup/mock/tree/root-folder").respond(204, "");
        let root = session.get_root_folder().unwrap();
        assert_eq!(root.refresh_timestamp(), 0);
        assert!(root
            .remove_tree(false, UnfileObjects::Unfile, false)
            .unwrap()
            .is_empty());
        assert!(root.refresh_timestamp() > 0);
    }
}
