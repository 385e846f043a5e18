//! Service document parsing.
//!
//! An AtomPub endpoint answers with one `app:workspace` per repository.
//! Each workspace lists the repository description, the collections the
//! client posts to and the URI templates used to address objects and types.

use std::collections::HashMap;

use cmis_core::xml::{ns, XmlElement};
use cmis_core::{CmisError, CmisResult, Repository};

use crate::uri_template::UriTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Root,
    Types,
    Query,
    CheckedOut,
    Unfiled,
}

impl Collection {
    /// Value of `cmisra:collectionType`.
    pub fn from_type(value: &str) -> Option<Self> {
        match value.trim() {
            "root" => Some(Self::Root),
            "types" => Some(Self::Types),
            "query" => Some(Self::Query),
            "checkedout" => Some(Self::CheckedOut),
            "unfiled" => Some(Self::Unfiled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Types => "types",
            Self::Query => "query",
            Self::CheckedOut => "checkedout",
            Self::Unfiled => "unfiled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriTemplateKind {
    ObjectById,
    ObjectByPath,
    TypeById,
    Query,
}

impl UriTemplateKind {
    /// Value of `cmisra:type`, compared case-insensitively.
    pub fn from_type(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "objectbyid" => Some(Self::ObjectById),
            "objectbypath" => Some(Self::ObjectByPath),
            "typebyid" => Some(Self::TypeById),
            "query" => Some(Self::Query),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectById => "objectbyid",
            Self::ObjectByPath => "objectbypath",
            Self::TypeById => "typebyid",
            Self::Query => "query",
        }
    }
}

/// The endpoints of one repository.
#[derive(Debug, Clone)]
pub struct AtomWorkspace {
    pub repository: Repository,
    collections: HashMap<Collection, String>,
    templates: HashMap<UriTemplateKind, UriTemplate>,
}

impl AtomWorkspace {
    /// Parse an `app:workspace` element. Nothing is validated here.
    pub fn from_xml(workspace: &XmlElement) -> Self {
        let repository = workspace
            .child(ns::CMISRA, "repositoryInfo")
            .map(Repository::from_xml)
            .unwrap_or_default();

        let mut collections = HashMap::new();
        for collection in workspace.children_named(ns::APP, "collection") {
            let kind = collection
                .child_text(ns::CMISRA, "collectionType")
                .and_then(|t| Collection::from_type(&t));
            if let (Some(kind), Some(href)) = (kind, collection.attr("href")) {
                collections.insert(kind, href.to_string());
            }
        }

        let mut templates = HashMap::new();
        for template in workspace.children_named(ns::CMISRA, "uritemplate") {
            let kind = template
                .child_text(ns::CMISRA, "type")
                .and_then(|t| UriTemplateKind::from_type(&t));
            let Some(kind) = kind else {
                continue;
            };
            let url = template
                .child_text(ns::CMISRA, "template")
                .unwrap_or_default();
            let media_type = template
                .child_text(ns::CMISRA, "mediatype")
                .unwrap_or_default();
            templates.insert(kind, UriTemplate::new(url.trim(), media_type.trim()));
        }

        Self {
            repository,
            collections,
            templates,
        }
    }

    pub fn id(&self) -> &str {
        &self.repository.id
    }

    pub fn root_id(&self) -> &str {
        &self.repository.root_folder_id
    }

    pub fn collection_url(&self, collection: Collection) -> Option<&str> {
        self.collections.get(&collection).map(String::as_str)
    }

    pub fn uri_template(&self, kind: UriTemplateKind) -> Option<&UriTemplate> {
        self.templates.get(&kind)
    }

    /// Collection URL that the caller cannot do without.
    pub fn require_collection(&self, collection: Collection) -> CmisResult<&str> {
        self.collection_url(collection).ok_or_else(|| {
            CmisError::runtime(format!(
                "Repository {} has no {} collection",
                self.id(),
                collection.as_str()
            ))
        })
    }

    pub fn require_template(&self, kind: UriTemplateKind) -> CmisResult<&UriTemplate> {
        self.uri_template(kind).ok_or_else(|| {
            CmisError::runtime(format!(
                "Repository {} has no {} URI template",
                self.id(),
                kind.as_str()
            ))
        })
    }

    /// Check the mandatory collections and templates are all advertised.
    pub fn validate(&self) -> CmisResult<()> {
        if self.root_id().is_empty() {
            return Err(CmisError::runtime(format!(
                "Repository {} has no root folder id",
                self.id()
            )));
        }
        for collection in [Collection::Root, Collection::Types, Collection::Query] {
            self.require_collection(collection)?;
        }
        for kind in [
            UriTemplateKind::ObjectById,
            UriTemplateKind::ObjectByPath,
            UriTemplateKind::TypeById,
        ] {
            self.require_template(kind)?;
        }
        Ok(())
    }
}

/// Every workspace of an `app:service` document.
pub fn parse_service_document(document: &XmlElement) -> CmisResult<Vec<AtomWorkspace>> {
    if !document.is(ns::APP, "service") {
        return Err(CmisError::runtime(format!(
            "Not an AtomPub service document: unexpected root element {}",
            document.name
        )));
    }
    Ok(document
        .children_named(ns::APP, "workspace")
        .map(AtomWorkspace::from_xml)
        .collect())
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
