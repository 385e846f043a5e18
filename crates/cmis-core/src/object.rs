//! The binding-independent object model.
//!
//! Objects are composed from capability traits rather than a class tree:
//! every object is a [`CmisObject`]; folders add [`Fileable`] and [`Folder`];
//! documents add [`Fileable`], [`ContentHolder`] and [`Versionable`], which
//! together make a [`Document`]. Callers discover capabilities at runtime
//! with [`CmisObject::as_folder`] / [`CmisObject::as_document`] since custom
//! server types may derive from either base type.
//!
//! Each binding embeds an [`ObjectCore`] holding the property map and the
//! lazily fetched type description and allowable actions. `refresh` is the
//! only path that invalidates those caches.

use std::fmt::Write as _;
use std::io::Read;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::allowable_actions::AllowableActions;
use crate::error::CmisResult;
use crate::object_type::{resolve_type, ObjectType, TypeResolver};
use crate::property::{format_date_time, Property, PropertyMap};

pub type ObjectPtr = Arc<dyn CmisObject>;
pub type FolderPtr = Arc<dyn Folder>;
pub type DocumentPtr = Arc<dyn Document>;

/// Readable document content. Dropping it releases the underlying transfer.
pub type ContentStream = Box<dyn Read + Send>;

/// What `remove_tree` does with objects also filed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnfileObjects {
    Unfile,
    DeleteSingleFiled,
    #[default]
    Delete,
}

impl UnfileObjects {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unfile => "unfile",
            Self::DeleteSingleFiled => "deletesinglefiled",
            Self::Delete => "delete",
        }
    }
}

// ── Per-object state ────────────────────────────────────────────────

/// Property map and lazy caches shared by every binding's objects.
pub struct ObjectCore {
    resolver: Arc<dyn TypeResolver>,
    properties: RwLock<PropertyMap>,
    allowable_actions: RwLock<Option<AllowableActions>>,
    type_description: RwLock<Option<ObjectType>>,
    refresh_timestamp: AtomicI64,
}

impl ObjectCore {
    pub fn new(resolver: Arc<dyn TypeResolver>, properties: PropertyMap) -> Self {
        Self {
            resolver,
            properties: RwLock::new(properties),
            allowable_actions: RwLock::new(None),
            type_description: RwLock::new(None),
            refresh_timestamp: AtomicI64::new(0),
        }
    }

    pub fn with_allowable_actions(self, actions: Option<AllowableActions>) -> Self {
        *self
            .allowable_actions
            .write()
            .unwrap_or_else(PoisonError::into_inner) = actions;
        self
    }

    pub fn resolver(&self) -> &Arc<dyn TypeResolver> {
        &self.resolver
    }

    pub fn properties(&self) -> PropertyMap {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn property(&self, id: &str) -> Option<Property> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// First value of a property in its canonical string form.
    pub fn string(&self, id: &str) -> Option<String> {
        self.property(id).and_then(|p| p.first_string())
    }

    pub fn strings(&self, id: &str) -> Vec<String> {
        self.property(id).map(|p| p.strings()).unwrap_or_default()
    }

    pub fn long(&self, id: &str) -> Option<i64> {
        self.property(id).and_then(|p| p.longs().first().copied())
    }

    pub fn boolean(&self, id: &str) -> Option<bool> {
        self.property(id).and_then(|p| p.bools().first().copied())
    }

    pub fn date_time(&self, id: &str) -> Option<DateTime<Utc>> {
        self.property(id).and_then(|p| p.date_times().first().copied())
    }

    /// Insert or replace a single property without touching the timestamp.
    pub fn set_property(&self, property: Property) {
        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(property.property_type().id.clone(), property);
    }

    /// Replace the whole state with a fresh server representation.
    pub fn reload(&self, properties: PropertyMap, actions: Option<AllowableActions>) {
        *self.properties.write().unwrap_or_else(PoisonError::into_inner) = properties;
        *self
            .allowable_actions
            .write()
            .unwrap_or_else(PoisonError::into_inner) = actions;
        *self
            .type_description
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.touch();
    }

    /// Mark the local state as reconciled with the server, now.
    pub fn touch(&self) {
        let now = Utc::now().timestamp_millis();
        let _ = self
            .refresh_timestamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |previous| {
                Some(now.max(previous + 1))
            });
    }

    /// Milliseconds since the epoch of the last reload, 0 if never.
    pub fn refresh_timestamp(&self) -> i64 {
        self.refresh_timestamp.load(Ordering::SeqCst)
    }

    /// Type description, fetched through the session on first use.
    pub fn type_description(&self, type_id: &str) -> CmisResult<ObjectType> {
        if let Some(cached) = self
            .type_description
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(cached.clone());
        }
        let fetched = resolve_type(&self.resolver, type_id)?;
        *self
            .type_description
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(fetched.clone());
        Ok(fetched)
    }

    /// Allowable actions, computed by `fetch` on first use.
    pub fn allowable_actions(
        &self,
        fetch: impl FnOnce() -> CmisResult<AllowableActions>,
    ) -> CmisResult<AllowableActions> {
        if let Some(cached) = self
            .allowable_actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(cached.clone());
        }
        let fetched = fetch()?;
        *self
            .allowable_actions
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(fetched.clone());
        Ok(fetched)
    }
}

// ── Capabilities ────────────────────────────────────────────────────

/// Behavior common to every CMIS object.
pub trait CmisObject: Send + Sync {
    fn core(&self) -> &ObjectCore;

    /// Re-fetch the object from the server and reset the lazy caches.
    fn refresh(&self) -> CmisResult<()>;

    /// Send the given properties to the server and reload from its answer.
    fn update_properties(&self, properties: &PropertyMap) -> CmisResult<()>;

    /// Delete the object on the server.
    fn remove(&self, all_versions: bool) -> CmisResult<()>;

    fn get_allowable_actions(&self) -> CmisResult<AllowableActions>;

    fn get_type_description(&self) -> CmisResult<ObjectType> {
        self.core().type_description(&self.type_id())
    }

    fn id(&self) -> String {
        self.core().string("cmis:objectId").unwrap_or_default()
    }

    fn name(&self) -> String {
        self.core().string("cmis:name").unwrap_or_default()
    }

    fn base_type(&self) -> String {
        self.core().string("cmis:baseTypeId").unwrap_or_default()
    }

    fn type_id(&self) -> String {
        self.core().string("cmis:objectTypeId").unwrap_or_default()
    }

    fn created_by(&self) -> String {
        self.core().string("cmis:createdBy").unwrap_or_default()
    }

    fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.core().date_time("cmis:creationDate")
    }

    fn last_modified_by(&self) -> String {
        self.core().string("cmis:lastModifiedBy").unwrap_or_default()
    }

    fn last_modification_date(&self) -> Option<DateTime<Utc>> {
        self.core().date_time("cmis:lastModificationDate")
    }

    fn change_token(&self) -> String {
        self.core().string("cmis:changeToken").unwrap_or_default()
    }

    fn is_immutable(&self) -> bool {
        self.core().boolean("cmis:isImmutable").unwrap_or(false)
    }

    fn properties(&self) -> PropertyMap {
        self.core().properties()
    }

    fn refresh_timestamp(&self) -> i64 {
        self.core().refresh_timestamp()
    }

    fn as_folder(&self) -> Option<&dyn Folder> {
        None
    }

    fn as_document(&self) -> Option<&dyn Document> {
        None
    }

    fn into_folder(self: Arc<Self>) -> Option<FolderPtr> {
        None
    }

    fn into_document(self: Arc<Self>) -> Option<DocumentPtr> {
        None
    }

    /// Human-readable dump of the object, as printed by command-line tools.
    fn describe(&self) -> String {
        let mut buf = String::new();
        let kind = if self.as_folder().is_some() {
            "Folder Object"
        } else if self.as_document().is_some() {
            "Document Object"
        } else {
            "Object"
        };
        let date = |d: Option<DateTime<Utc>>| d.map(|d| format_date_time(&d)).unwrap_or_default();

        let _ = writeln!(buf, "{kind}:\n");
        let _ = writeln!(buf, "Id: {}", self.id());
        let _ = writeln!(buf, "Name: {}", self.name());
        let _ = writeln!(buf, "Type: {}", self.type_id());
        let _ = writeln!(buf, "Base type: {}", self.base_type());
        let _ = writeln!(buf, "Created on {} by {}", date(self.creation_date()), self.created_by());
        let _ = writeln!(
            buf,
            "Last modified on {} by {}",
            date(self.last_modification_date()),
            self.last_modified_by()
        );
        let _ = writeln!(buf, "Change token: {}", self.change_token());

        if let Some(folder) = self.as_folder() {
            let _ = writeln!(buf, "Path: {}", folder.path());
            let _ = writeln!(buf, "Folder Parent Id: {}", folder.parent_id().unwrap_or_default());
            let _ = writeln!(buf, "Is root folder: {}", folder.is_root_folder());
        }
        if let Some(document) = self.as_document() {
            let _ = writeln!(buf, "Content Type: {}", document.content_type());
            let _ = writeln!(buf, "Content Length: {}", document.content_length());
            let _ = writeln!(buf, "Content Filename: {}", document.content_filename());
        }

        let _ = writeln!(buf, "Properties:");
        for (id, property) in self.properties() {
            let _ = writeln!(buf, "    {id}: {}", property.strings().join(", "));
        }
        buf
    }
}

/// Objects that can be filed in folders.
pub trait Fileable: CmisObject {
    /// Folders the object is filed in; empty for unfiled objects.
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>>;

    /// Move the object from `source` to `destination`.
    fn move_object(&self, source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()>;

    /// Filing paths of the object. Folders report their own `cmis:path`;
    /// documents derive theirs from their parents.
    fn get_paths(&self) -> CmisResult<Vec<String>> {
        let own = self.core().strings("cmis:path");
        if !own.is_empty() {
            return Ok(own);
        }
        let name = self.name();
        Ok(self
            .get_parents()?
            .iter()
            .map(|parent| join_path(&parent.path(), &name))
            .collect())
    }
}

pub trait Folder: Fileable {
    fn path(&self) -> String {
        self.core().string("cmis:path").unwrap_or_default()
    }

    fn parent_id(&self) -> Option<String> {
        self.core()
            .string("cmis:parentId")
            .filter(|id| !id.is_empty())
    }

    fn is_root_folder(&self) -> bool {
        self.parent_id().is_none()
    }

    /// Parent folder, `None` for the root folder.
    fn get_folder_parent(&self) -> CmisResult<Option<FolderPtr>>;

    /// Enumerate the folder content. Each call is a fresh server round trip.
    fn get_children(&self) -> CmisResult<Vec<ObjectPtr>>;

    fn create_folder(&self, properties: &PropertyMap) -> CmisResult<FolderPtr>;

    fn create_document(
        &self,
        properties: &PropertyMap,
        stream: &mut dyn Read,
        content_type: &str,
        filename: &str,
    ) -> CmisResult<DocumentPtr>;

    /// Delete the folder and its descendants, returning the ids that could
    /// not be deleted.
    fn remove_tree(
        &self,
        all_versions: bool,
        unfile: UnfileObjects,
        continue_on_error: bool,
    ) -> CmisResult<Vec<String>>;
}

pub trait ContentHolder: CmisObject {
    fn content_type(&self) -> String {
        self.core()
            .string("cmis:contentStreamMimeType")
            .unwrap_or_default()
    }

    fn content_filename(&self) -> String {
        self.core()
            .string("cmis:contentStreamFileName")
            .unwrap_or_default()
    }

    fn content_length(&self) -> i64 {
        self.core().long("cmis:contentStreamLength").unwrap_or(0)
    }

    fn get_content_stream(&self) -> CmisResult<ContentStream>;

    /// Replace the content, then reload the object.
    fn set_content_stream(
        &self,
        stream: &mut dyn Read,
        content_type: &str,
        filename: &str,
        overwrite: bool,
    ) -> CmisResult<()>;
}

pub trait Versionable: CmisObject {
    /// Check the document out, returning the private working copy.
    fn check_out(&self) -> CmisResult<DocumentPtr>;

    /// Discard the private working copy this object represents.
    fn cancel_checkout(&self) -> CmisResult<()>;

    /// Check the private working copy in, returning the new version.
    fn check_in(
        &self,
        is_major: bool,
        comment: &str,
        properties: &PropertyMap,
        stream: Option<&mut dyn Read>,
        content_type: &str,
        filename: &str,
    ) -> CmisResult<DocumentPtr>;

    /// Every version of the series, newest first.
    fn get_all_versions(&self) -> CmisResult<Vec<DocumentPtr>>;

    fn is_checked_out(&self) -> bool {
        self.core()
            .boolean("cmis:isVersionSeriesCheckedOut")
            .unwrap_or(false)
    }

    fn is_latest_version(&self) -> bool {
        self.core().boolean("cmis:isLatestVersion").unwrap_or(false)
    }

    fn is_major_version(&self) -> bool {
        self.core().boolean("cmis:isMajorVersion").unwrap_or(false)
    }

    fn checkin_comment(&self) -> String {
        self.core().string("cmis:checkinComment").unwrap_or_default()
    }

    fn version_label(&self) -> String {
        self.core().string("cmis:versionLabel").unwrap_or_default()
    }

    fn version_series_id(&self) -> String {
        self.core().string("cmis:versionSeriesId").unwrap_or_default()
    }
}

/// A document: fileable, holding content and versionable.
pub trait Document: Fileable + ContentHolder + Versionable {}

impl<T: Fileable + ContentHolder + Versionable> Document for T {}

/// Join a folder path and a child name with exactly one separator.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
