//! State shared by every AtomPub object, and the generic object kind used
//! for relationships and policies.
//!
//! An object keeps the links of the entry it was built from and follows
//! them for every operation. Links are replaced whenever the object is
//! reloaded from a server answer.

use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use reqwest::Method;

use cmis_core::object::ObjectCore;
use cmis_core::xml::{ns, XmlElement};
use cmis_core::{
    AllowableActions, BaseType, CmisError, CmisObject, CmisResult, DocumentPtr, FolderPtr,
    HttpRequest, HttpSession, ObjectPtr, ObjectType, Property, PropertyMap, TypeResolver,
};

use crate::document::AtomDocument;
use crate::entry::{parse_feed, rel, write_entry, AtomEntry, EntryLinks, InlineContent, ENTRY_TYPE, FEED_TYPE};
use crate::folder::AtomFolder;
use crate::uri_template::append_query;
use crate::workspace::{AtomWorkspace, UriTemplateKind};

/// Connection and discovered endpoints, shared by a session and its objects.
pub struct AtomContext {
    pub http: HttpSession,
    pub workspace: AtomWorkspace,
}

impl AtomContext {
    /// GET a URL and parse the entry it answers with.
    pub fn fetch_entry(&self, url: &str) -> CmisResult<AtomEntry> {
        let document = self.http.get(url)?.xml()?;
        AtomEntry::from_document(&document)
    }

    /// GET a feed and every following page.
    pub fn fetch_feed(&self, url: &str) -> CmisResult<Vec<AtomEntry>> {
        let mut entries = Vec::new();
        let mut next = Some(url.to_string());
        while let Some(page) = next {
            let (page_entries, page_next) = parse_feed(&self.http.get(&page)?.xml()?)?;
            entries.extend(page_entries);
            next = page_next.filter(|n| *n != page);
        }
        Ok(entries)
    }

    /// Send an entry and parse the entry the server answers with.
    pub fn send_entry(&self, method: Method, url: &str, body: String) -> CmisResult<Option<AtomEntry>> {
        let request = HttpRequest::new(method, url)
            .header("Content-Type", ENTRY_TYPE)
            .body(body);
        let bytes = self.http.send(&request)?.bytes()?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        AtomEntry::from_document(&XmlElement::parse_bytes(&bytes)?).map(Some)
    }

    pub fn object_url(&self, id: &str) -> CmisResult<String> {
        Ok(self
            .workspace
            .require_template(UriTemplateKind::ObjectById)?
            .create_url(&[("id", id)]))
    }

    fn type_entry(&self, id: &str) -> CmisResult<XmlElement> {
        let url = self
            .workspace
            .require_template(UriTemplateKind::TypeById)?
            .create_url(&[("id", id)]);
        let document = self.http.get(&url)?.xml()?;
        document
            .find(ns::ATOM, "entry")
            .cloned()
            .ok_or_else(|| CmisError::runtime(format!("No type entry for {id}")))
    }
}

/// Type definition carried by an entry of the types collection.
pub fn type_from_entry(entry: &XmlElement) -> CmisResult<ObjectType> {
    let definition = entry
        .child(ns::CMISRA, "type")
        .ok_or_else(|| CmisError::runtime("Type entry without cmisra:type"))?;
    ObjectType::from_xml(definition)
}

impl TypeResolver for AtomContext {
    fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
        type_from_entry(&self.type_entry(id)?)
    }

    fn get_type_children(&self, id: &str) -> CmisResult<Vec<ObjectType>> {
        let entry = AtomEntry::from_xml(&self.type_entry(id)?)?;
        let Some(url) = entry.links.href(rel::DOWN, Some(FEED_TYPE)) else {
            return Ok(Vec::new());
        };
        let feed = self.http.get(&url)?.xml()?;
        feed.children_named(ns::ATOM, "entry")
            .map(type_from_entry)
            .collect()
    }
}

/// Build the object matching the base type of an entry.
pub fn object_from_entry(ctx: &Arc<AtomContext>, entry: AtomEntry) -> ObjectPtr {
    match entry.base_type() {
        BaseType::Folder => Arc::new(AtomFolder::new(ctx.clone(), entry)),
        BaseType::Document => Arc::new(AtomDocument::new(ctx.clone(), entry)),
        _ => Arc::new(AtomObject::new(ctx.clone(), entry)),
    }
}

pub fn folder_from_entry(ctx: &Arc<AtomContext>, entry: AtomEntry) -> CmisResult<FolderPtr> {
    let id = entry.id().unwrap_or_default();
    object_from_entry(ctx, entry)
        .into_folder()
        .ok_or_else(|| CmisError::runtime(format!("Object {id} is not a folder")))
}

pub fn document_from_entry(ctx: &Arc<AtomContext>, entry: AtomEntry) -> CmisResult<DocumentPtr> {
    let id = entry.id().unwrap_or_default();
    object_from_entry(ctx, entry)
        .into_document()
        .ok_or_else(|| CmisError::runtime(format!("Object {id} is not a document")))
}

/// Core state plus the links of the last entry seen for the object.
pub struct AtomState {
    ctx: Arc<AtomContext>,
    core: ObjectCore,
    links: RwLock<EntryLinks>,
}

impl AtomState {
    pub fn new(ctx: Arc<AtomContext>, entry: AtomEntry) -> Self {
        let core = ObjectCore::new(ctx.clone(), entry.properties)
            .with_allowable_actions(entry.allowable_actions);
        Self {
            ctx,
            core,
            links: RwLock::new(entry.links),
        }
    }

    pub fn ctx(&self) -> &Arc<AtomContext> {
        &self.ctx
    }

    pub fn core(&self) -> &ObjectCore {
        &self.core
    }

    pub fn id(&self) -> String {
        self.core.string("cmis:objectId").unwrap_or_default()
    }

    pub fn links(&self) -> EntryLinks {
        self.links
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn link(&self, rel: &str, media_type: Option<&str>) -> Option<String> {
        self.links
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .href(rel, media_type)
    }

    /// Replace properties, actions and links with a fresh server entry.
    pub fn apply(&self, entry: AtomEntry) {
        *self.links.write().unwrap_or_else(PoisonError::into_inner) = entry.links;
        self.core.reload(entry.properties, entry.allowable_actions);
    }

    pub fn self_url(&self) -> CmisResult<String> {
        match self.link(rel::SELF, None) {
            Some(url) => Ok(url),
            None => self.ctx.object_url(&self.id()),
        }
    }

    pub fn edit_url(&self) -> CmisResult<String> {
        match self.link(rel::EDIT, None) {
            Some(url) => Ok(url),
            None => self.self_url(),
        }
    }

    pub fn refresh(&self) -> CmisResult<()> {
        let entry = self.ctx.fetch_entry(&self.self_url()?)?;
        self.apply(entry);
        Ok(())
    }

    /// Title for written entries: the new name if any, else the current one.
    fn title(&self, properties: &PropertyMap) -> String {
        properties
            .get("cmis:name")
            .and_then(|p| p.first_string())
            .or_else(|| self.core.string("cmis:name"))
            .unwrap_or_default()
    }

    pub fn update_properties(&self, properties: &PropertyMap) -> CmisResult<()> {
        let body = write_entry(&self.title(properties), properties, None);
        match self.ctx.send_entry(Method::PUT, &self.edit_url()?, body)? {
            Some(entry) => self.apply(entry),
            None => self.refresh()?,
        }
        Ok(())
    }

    pub fn remove(&self, all_versions: bool) -> CmisResult<()> {
        let url = append_query(&self.edit_url()?, &[("allVersions", bool_param(all_versions))])?;
        debug!("Deleting object {}", self.id());
        self.ctx.http.delete(&url)?;
        self.core.touch();
        Ok(())
    }

    pub fn allowable_actions(&self) -> CmisResult<AllowableActions> {
        self.core.allowable_actions(|| {
            let Some(url) = self.link(rel::ALLOWABLE_ACTIONS, None) else {
                return Ok(AllowableActions::new());
            };
            let document = self.ctx.http.get(&url)?.xml()?;
            Ok(document
                .find(ns::CMIS, "allowableActions")
                .map(AllowableActions::from_xml)
                .unwrap_or_default())
        })
    }

    /// Folders the object is filed in, through its `up` link.
    pub fn parents(&self) -> CmisResult<Vec<FolderPtr>> {
        let Some(url) = self.link(rel::UP, None) else {
            return Ok(Vec::new());
        };
        let document = self.ctx.http.get(&url)?.xml()?;
        let entries = if document.is(ns::ATOM, "feed") {
            parse_feed(&document)?.0
        } else {
            vec![AtomEntry::from_document(&document)?]
        };
        entries
            .into_iter()
            .map(|entry| folder_from_entry(&self.ctx, entry))
            .collect()
    }

    /// Children feed URL of the folder with the given id.
    fn children_url_of(&self, folder_id: &str) -> CmisResult<String> {
        let entry = self.ctx.fetch_entry(&self.ctx.object_url(folder_id)?)?;
        entry
            .links
            .href(rel::DOWN, Some(FEED_TYPE))
            .ok_or_else(|| CmisError::invalid(format!("Object {folder_id} has no children feed")))
    }

    /// POST the object to the destination children feed, naming the source.
    pub fn move_object(&self, source_id: &str, destination_id: &str) -> CmisResult<()> {
        let url = append_query(
            &self.children_url_of(destination_id)?,
            &[("sourceFolderId", source_id)],
        )?;
        let mut properties = PropertyMap::new();
        properties.insert("cmis:objectId".into(), Property::id("cmis:objectId", self.id()));
        let body = write_entry(&self.title(&PropertyMap::new()), &properties, None);
        match self.ctx.send_entry(Method::POST, &url, body)? {
            Some(entry) => self.apply(entry),
            None => self.refresh()?,
        }
        Ok(())
    }

    /// Serialize an entry for creating a child or checking in.
    pub fn entry_body(&self, properties: &PropertyMap, content: Option<&InlineContent>) -> String {
        write_entry(&self.title(properties), properties, content)
    }
}

pub fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// An object that is neither a folder nor a document.
pub struct AtomObject {
    state: AtomState,
}

impl AtomObject {
    pub fn new(ctx: Arc<AtomContext>, entry: AtomEntry) -> Self {
        Self {
            state: AtomState::new(ctx, entry),
        }
    }
}

impl CmisObject for AtomObject {
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
