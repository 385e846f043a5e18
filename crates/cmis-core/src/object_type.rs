//! CMIS type definitions.
//!
//! Parent, base and child types are never owned: an `ObjectType` keeps the
//! ids and looks the related types up through the session's [`TypeResolver`]
//! when they are dereferenced. Type hierarchies served by a repository are
//! not guaranteed to be acyclic, so nothing here recurses eagerly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CmisError, CmisResult};
use crate::property::{parse_bool, PropertyKind, PropertyType};
use crate::xml::{ns, XmlElement};

/// The four CMIS base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    Document,
    Folder,
    Relationship,
    Policy,
}

impl BaseType {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Document => "cmis:document",
            Self::Folder => "cmis:folder",
            Self::Relationship => "cmis:relationship",
            Self::Policy => "cmis:policy",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "cmis:document" => Some(Self::Document),
            "cmis:folder" => Some(Self::Folder),
            "cmis:relationship" => Some(Self::Relationship),
            "cmis:policy" => Some(Self::Policy),
            _ => None,
        }
    }
}

/// Whether documents of a type may, must or must not carry content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContentStreamAllowed {
    #[default]
    NotAllowed,
    Allowed,
    Required,
}

impl ContentStreamAllowed {
    /// Unknown values fall back to `NotAllowed`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "allowed" => Self::Allowed,
            "required" => Self::Required,
            _ => Self::NotAllowed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAllowed => "notallowed",
            Self::Allowed => "allowed",
            Self::Required => "required",
        }
    }
}

/// Fetches type definitions by id on behalf of a session.
///
/// Implementations return definitions without a resolver attached; use
/// [`resolve_type`] to get one that can follow its own links.
pub trait TypeResolver: Send + Sync {
    fn get_type(&self, id: &str) -> CmisResult<ObjectType>;

    fn get_type_children(&self, id: &str) -> CmisResult<Vec<ObjectType>>;
}

/// Fetch a type and bind it to the resolver so its parent, base and
/// children can be looked up later.
pub fn resolve_type(resolver: &Arc<dyn TypeResolver>, id: &str) -> CmisResult<ObjectType> {
    Ok(resolver.get_type(id)?.with_resolver(resolver.clone()))
}

/// Resolver for backends without a type system: only `cmis:document` and
/// `cmis:folder` exist and neither has children.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTypes;

impl LocalTypes {
    pub const BASES: [BaseType; 2] = [BaseType::Document, BaseType::Folder];
}

impl TypeResolver for LocalTypes {
    fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
        BaseType::from_id(id)
            .filter(|base| Self::BASES.contains(base))
            .map(ObjectType::base_definition)
            .ok_or_else(|| CmisError::not_found(format!("No such type: {id}")))
    }

    fn get_type_children(&self, id: &str) -> CmisResult<Vec<ObjectType>> {
        self.get_type(id)?;
        Ok(Vec::new())
    }
}

/// A CMIS object type definition.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectType {
    pub id: String,
    pub local_name: String,
    pub local_namespace: String,
    pub query_name: String,
    pub display_name: String,
    pub description: String,
    pub parent_type_id: Option<String>,
    pub base_type_id: String,
    pub creatable: bool,
    pub fileable: bool,
    pub queryable: bool,
    pub fulltext_indexed: bool,
    pub included_in_supertype_query: bool,
    pub controllable_policy: bool,
    pub controllable_acl: bool,
    pub versionable: bool,
    pub content_stream_allowed: ContentStreamAllowed,
    pub property_types: BTreeMap<String, PropertyType>,
    #[serde(skip)]
    resolver: Option<Arc<dyn TypeResolver>>,
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("id", &self.id)
            .field("parent_type_id", &self.parent_type_id)
            .field("base_type_id", &self.base_type_id)
            .field("property_types", &self.property_types.len())
            .finish()
    }
}

impl ObjectType {
    /// Parse a type definition element: `cmisra:type` in AtomPub entries,
    /// `cmism:type` in SOAP responses. Both carry `cmis:` children.
    pub fn from_xml(element: &XmlElement) -> CmisResult<Self> {
        let text = |name: &str| element.child_text(ns::CMIS, name).unwrap_or_default();
        let flag = |name: &str| parse_bool(&text(name)).unwrap_or(false);

        let id = text("id");
        if id.is_empty() {
            return Err(CmisError::runtime("Type definition without an id"));
        }
        let parent = text("parentId");

        let mut property_types = BTreeMap::new();
        for child in element.children.iter().filter(|c| c.is_in(ns::CMIS)) {
            if let Some(pt) = PropertyType::from_definition_xml(child) {
                property_types.insert(pt.id.clone(), pt);
            }
        }

        Ok(Self {
            local_name: text("localName"),
            local_namespace: text("localNamespace"),
            query_name: text("queryName"),
            display_name: text("displayName"),
            description: text("description"),
            parent_type_id: (!parent.is_empty()).then_some(parent),
            base_type_id: text("baseId"),
            creatable: flag("creatable"),
            fileable: flag("fileable"),
            queryable: flag("queryable"),
            fulltext_indexed: flag("fulltextIndexed"),
            included_in_supertype_query: flag("includedInSupertypeQuery"),
            controllable_policy: flag("controllablePolicy"),
            controllable_acl: flag("controllableACL"),
            versionable: flag("versionable"),
            content_stream_allowed: ContentStreamAllowed::parse(&text("contentStreamAllowed")),
            property_types,
            id,
            resolver: None,
        })
    }

    /// Locally defined base type, for bindings whose backend has no type
    /// system of its own.
    pub fn base_definition(base: BaseType) -> Self {
        let id = base.id().to_string();
        let local = id.trim_start_matches("cmis:").to_string();
        let is_document = base == BaseType::Document;

        let mut property_types = BTreeMap::new();
        let mut add = |pt: PropertyType| {
            property_types.insert(pt.id.clone(), pt);
        };
        add(PropertyType::new("cmis:objectId", PropertyKind::Id));
        add(PropertyType::new("cmis:name", PropertyKind::String));
        add(PropertyType::new("cmis:baseTypeId", PropertyKind::Id));
        add(PropertyType::new("cmis:objectTypeId", PropertyKind::Id));
        add(PropertyType::new("cmis:createdBy", PropertyKind::String));
        add(PropertyType::new("cmis:creationDate", PropertyKind::DateTime));
        add(PropertyType::new("cmis:lastModifiedBy", PropertyKind::String));
        add(PropertyType::new("cmis:lastModificationDate", PropertyKind::DateTime));
        add(PropertyType::new("cmis:changeToken", PropertyKind::String));
        if is_document {
            add(PropertyType::new("cmis:contentStreamFileName", PropertyKind::String));
            add(PropertyType::new("cmis:contentStreamMimeType", PropertyKind::String));
            add(PropertyType::new("cmis:contentStreamLength", PropertyKind::Integer));
            add(PropertyType::new("cmis:isImmutable", PropertyKind::Bool));
        } else {
            add(PropertyType::new("cmis:parentId", PropertyKind::Id));
            add(PropertyType::new("cmis:path", PropertyKind::String));
        }

        Self {
            local_name: local.clone(),
            local_namespace: String::new(),
            query_name: id.clone(),
            display_name: local,
            description: String::new(),
            parent_type_id: None,
            base_type_id: id.clone(),
            creatable: matches!(base, BaseType::Document | BaseType::Folder),
            fileable: matches!(base, BaseType::Document | BaseType::Folder),
            queryable: false,
            fulltext_indexed: false,
            included_in_supertype_query: true,
            controllable_policy: false,
            controllable_acl: false,
            versionable: false,
            content_stream_allowed: if is_document {
                ContentStreamAllowed::Allowed
            } else {
                ContentStreamAllowed::NotAllowed
            },
            property_types,
            id,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    fn resolver(&self) -> CmisResult<&Arc<dyn TypeResolver>> {
        self.resolver
            .as_ref()
            .ok_or_else(|| CmisError::runtime(format!("Type {} is not bound to a session", self.id)))
    }

    /// Parent type, looked up through the session. `None` for base types.
    pub fn parent_type(&self) -> CmisResult<Option<ObjectType>> {
        match &self.parent_type_id {
            Some(parent) => resolve_type(self.resolver()?, parent).map(Some),
            None => Ok(None),
        }
    }

    /// Base type, looked up through the session unless this is one.
    pub fn base_type(&self) -> CmisResult<ObjectType> {
        if self.base_type_id.is_empty() || self.base_type_id == self.id {
            return Ok(self.clone());
        }
        resolve_type(self.resolver()?, &self.base_type_id)
    }

    /// Direct child types. Each call goes back to the server.
    pub fn children(&self) -> CmisResult<Vec<ObjectType>> {
        let resolver = self.resolver()?;
        Ok(resolver
            .get_type_children(&self.id)?
            .into_iter()
            .map(|t| t.with_resolver(resolver.clone()))
            .collect())
    }

    pub fn base(&self) -> Option<BaseType> {
        BaseType::from_id(&self.base_type_id)
    }

    pub fn property_type(&self, id: &str) -> Option<&PropertyType> {
        self.property_types.get(id)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Type Description:")?;
        writeln!(f)?;
        writeln!(f, "Id: {}", self.id)?;
        writeln!(f, "Display name: {}", self.display_name)?;
        writeln!(f, "Parent type: {}", self.parent_type_id.as_deref().unwrap_or(""))?;
        writeln!(f, "Base type: {}", self.base_type_id)?;
        writeln!(f, "Creatable: {}", self.creatable)?;
        writeln!(f, "Versionable: {}", self.versionable)?;
        writeln!(f, "Content stream: {}", self.content_stream_allowed.as_str())?;
        writeln!(f, "Property types:")?;
        for pt in self.property_types.values() {
            writeln!(
                f,
                "    {} ({}){}",
                pt.id,
                pt.kind,
                if pt.multi_valued { " multi-valued" } else { "" }
            )?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedTypes(HashMap<String, ObjectType>);

    impl TypeResolver for FixedTypes {
        fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
            self.0
                .get(id)
                .cloned()
                .ok_or_else(|| CmisError::not_found(format!("No type {id}")))
        }

        fn get_type_children(&self, id: &str) -> CmisResult<Vec<ObjectType>> {
            Ok(self
                .0
                .values()
                .filter(|t| t.parent_type_id.as_deref() == Some(id))
                .cloned()
                .collect())
        }
    }

    fn type_xml(id: &str, parent: Option<&str>, base: &str, stream: &str) -> String {
        format!(
            r#"<cmisra:type xmlns:cmis="{cmis}" xmlns:cmisra="{cmisra}">
                 <cmis:id>{id}</cmis:id>
                 <cmis:localName>{id}</cmis:localName>
                 <cmis:displayName>Display {id}</cmis:displayName>
                 <cmis:baseId>{base}</cmis:baseId>
                 {parent}
                 <cmis:creatable>true</cmis:creatable>
                 <cmis:versionable>true</cmis:versionable>
                 <cmis:contentStreamAllowed>{stream}</cmis:contentStreamAllowed>
                 <cmis:propertyStringDefinition>
                   <cmis:id>cmis:name</cmis:id>
                   <cmis:cardinality>single</cmis:cardinality>
                   <cmis:updatability>readwrite</cmis:updatability>
                 </cmis:propertyStringDefinition>
                 <cmis:propertyIdDefinition>
                   <cmis:id>cmis:secondaryIds</cmis:id>
                   <cmis:cardinality>multi</cmis:cardinality>
                 </cmis:propertyIdDefinition>
               </cmisra:type>"#,
            cmis = ns::CMIS,
            cmisra = ns::CMISRA,
            parent = parent
                .map(|p| format!("<cmis:parentId>{p}</cmis:parentId>"))
                .unwrap_or_default(),
        )
    }

    fn parse(xml: &str) -> ObjectType {
        ObjectType::from_xml(&XmlElement::parse(xml).unwrap()).unwrap()
    }

    #[test]
    fn from_xml_reads_flags_and_property_types() {
        let t = parse(&type_xml("VersionableType", Some("cmis:document"), "cmis:document", "allowed"));
        assert_eq!(t.id, "VersionableType");
        assert_eq!(t.display_name, "Display VersionableType");
        assert_eq!(t.parent_type_id.as_deref(), Some("cmis:document"));
        assert!(t.creatable);
        assert!(t.versionable);
        assert!(!t.queryable);
        assert_eq!(t.content_stream_allowed, ContentStreamAllowed::Allowed);
        assert_eq!(t.property_types.len(), 2);
        assert!(t.property_types["cmis:secondaryIds"].multi_valued);
        assert!(t.property_types["cmis:name"].updatable);
        assert_eq!(t.base(), Some(BaseType::Document));
    }

    #[test]
    fn unknown_content_stream_value_is_not_allowed() {
        let t = parse(&type_xml("x", None, "cmis:document", "sometimes"));
        assert_eq!(t.content_stream_allowed, ContentStreamAllowed::NotAllowed);
    }

    #[test]
    fn parent_and_base_are_looked_up_lazily() {
        let base = parse(&type_xml("cmis:document", None, "cmis:document", "allowed"));
        let child = parse(&type_xml("Sub", Some("cmis:document"), "cmis:document", "required"));
        let mut types = HashMap::new();
        types.insert(base.id.clone(), base);
        types.insert(child.id.clone(), child);
        let resolver: Arc<dyn TypeResolver> = Arc::new(FixedTypes(types));

        let sub = resolve_type(&resolver, "Sub").unwrap();
        let parent = sub.parent_type().unwrap().unwrap();
        assert_eq!(parent.id, "cmis:document");
        assert!(parent.parent_type().unwrap().is_none());
        assert_eq!(sub.base_type().unwrap().id, "cmis:document");

        let children = parent.children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "Sub");
    }

    #[test]
    fn missing_parent_only_fails_when_dereferenced() {
        let orphan = parse(&type_xml("Orphan", Some("Gone"), "cmis:document", "allowed"));
        let mut types = HashMap::new();
        types.insert(orphan.id.clone(), orphan);
        let resolver: Arc<dyn TypeResolver> = Arc::new(FixedTypes(types));

        let t = resolve_type(&resolver, "Orphan").unwrap();
        let err = t.parent_type().unwrap_err();
        assert_eq!(err.kind, crate::error::CmisErrorKind::ObjectNotFound);
    }

    #[test]
    fn local_types_know_only_documents_and_folders() {
        let resolver: Arc<dyn TypeResolver> = Arc::new(LocalTypes);
        let folder = resolve_type(&resolver, "cmis:folder").unwrap();
        assert_eq!(folder.base(), Some(BaseType::Folder));
        assert!(folder.children().unwrap().is_empty());
        assert_eq!(folder.base_type().unwrap().id, "cmis:folder");

        let err = resolve_type(&resolver, "cmis:policy").unwrap_err();
        assert_eq!(err.kind, crate::error::CmisErrorKind::ObjectNotFound);
        assert!(resolver.get_type_children("custom").is_err());
    }

    #[test]
    fn unbound_type_cannot_follow_links() {
        let t = parse(&type_xml("Sub", Some("cmis:document"), "cmis:document", "allowed"));
        assert!(t.parent_type().is_err());
    }

    #[test]
    fn synthetic_base_types() {
        let folder = ObjectType::base_definition(BaseType::Folder);
        assert_eq!(folder.id, "cmis:folder");
        assert!(folder.property_type("cmis:path").is_some());
        assert_eq!(folder.content_stream_allowed, ContentStreamAllowed::NotAllowed);
        let doc = ObjectType::base_definition(BaseType::Document);
        assert_eq!(doc.base_type().unwrap().id, "cmis:document");
    }
}
