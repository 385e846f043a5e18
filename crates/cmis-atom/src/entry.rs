//! Atom entries and feeds carrying CMIS objects.

use chrono::Utc;
use quick_xml::escape::escape;

use cmis_core::property::{format_date_time, properties_from_xml, properties_to_xml};
use cmis_core::xml::{ns, XmlElement};
use cmis_core::{AllowableActions, BaseType, CmisError, CmisResult, PropertyMap};

pub const FEED_TYPE: &str = "application/atom+xml;type=feed";
pub const ENTRY_TYPE: &str = "application/atom+xml;type=entry";
pub const TREE_TYPE: &str = "application/cmistree+xml";

pub mod rel {
    pub const SELF: &str = "self";
    pub const EDIT: &str = "edit";
    pub const EDIT_MEDIA: &str = "edit-media";
    pub const DOWN: &str = "down";
    pub const UP: &str = "up";
    pub const NEXT: &str = "next";
    pub const VERSION_HISTORY: &str = "version-history";
    pub const ALLOWABLE_ACTIONS: &str =
        "http://docs.oasis-open.org/ns/cmis/link/200908/allowableactions";
    pub const FOLDER_TREE: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/foldertree";
}

/// Media types compare without case or whitespace around parameters.
fn same_media_type(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase()
    };
    normalize(a) == normalize(b)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomLink {
    pub rel: String,
    pub media_type: Option<String>,
    /// `cmisra:id` of the linked object, when the server gives it.
    pub id: Option<String>,
    pub href: String,
}

impl AtomLink {
    pub fn from_xml(element: &XmlElement) -> Option<Self> {
        Some(Self {
            rel: element.attr("rel")?.to_string(),
            media_type: element.attr("type").map(str::to_string),
            id: element.attr("id").map(str::to_string),
            href: element.attr("href")?.to_string(),
        })
    }
}

/// Links and content location of an entry, kept by objects to navigate.
#[derive(Debug, Clone, Default)]
pub struct EntryLinks {
    pub links: Vec<AtomLink>,
    pub content_src: Option<String>,
    pub content_type: Option<String>,
}

impl EntryLinks {
    /// First link with the relation, and the media type when one is given.
    pub fn find(&self, rel: &str, media_type: Option<&str>) -> Option<&AtomLink> {
        self.links.iter().find(|link| {
            link.rel == rel
                && match (media_type, &link.media_type) {
                    (None, _) => true,
                    (Some(wanted), Some(actual)) => same_media_type(wanted, actual),
                    (Some(_), None) => false,
                }
        })
    }

    pub fn href(&self, rel: &str, media_type: Option<&str>) -> Option<String> {
        self.find(rel, media_type).map(|l| l.href.clone())
    }
}

/// A parsed `atom:entry` holding a `cmisra:object`.
#[derive(Debug, Clone, Default)]
pub struct AtomEntry {
    pub properties: PropertyMap,
    pub allowable_actions: Option<AllowableActions>,
    pub links: EntryLinks,
}

impl AtomEntry {
    pub fn from_xml(entry: &XmlElement) -> CmisResult<Self> {
        let object = entry.child(ns::CMISRA, "object");
        let properties = match object.and_then(|o| o.child(ns::CMIS, "properties")) {
            Some(props) => properties_from_xml(props)?,
            None => PropertyMap::new(),
        };
        let allowable_actions = object
            .and_then(|o| o.child(ns::CMIS, "allowableActions"))
            .map(AllowableActions::from_xml);

        let links = entry
            .children_named(ns::ATOM, "link")
            .filter_map(AtomLink::from_xml)
            .collect();
        let content = entry.child(ns::ATOM, "content");

        Ok(Self {
            properties,
            allowable_actions,
            links: EntryLinks {
                links,
                content_src: content.and_then(|c| c.attr("src")).map(str::to_string),
                content_type: content.and_then(|c| c.attr("type")).map(str::to_string),
            },
        })
    }

    /// Parse a response body whose root is, or contains, an entry.
    pub fn from_document(document: &XmlElement) -> CmisResult<Self> {
        let entry = document
            .find(ns::ATOM, "entry")
            .ok_or_else(|| CmisError::runtime(format!("No atom:entry in {} document", document.name)))?;
        Self::from_xml(entry)
    }

    pub fn id(&self) -> Option<String> {
        self.properties
            .get("cmis:objectId")
            .and_then(|p| p.first_string())
    }

    /// Base type from `cmis:baseTypeId`, else guessed from the presence of
    /// a children feed.
    pub fn base_type(&self) -> BaseType {
        let declared = self
            .properties
            .get("cmis:baseTypeId")
            .and_then(|p| p.first_string())
            .and_then(|id| BaseType::from_id(&id));
        match declared {
            Some(base) => base,
            None if self.links.find(rel::DOWN, Some(FEED_TYPE)).is_some() => BaseType::Folder,
            None => BaseType::Document,
        }
    }
}

/// Entries of an `atom:feed` plus the URL of the next page, if any.
pub fn parse_feed(feed: &XmlElement) -> CmisResult<(Vec<AtomEntry>, Option<String>)> {
    if !feed.is(ns::ATOM, "feed") {
        return Err(CmisError::runtime(format!(
            "Expected an atom:feed, got {}",
            feed.name
        )));
    }
    let entries = feed
        .children_named(ns::ATOM, "entry")
        .map(AtomEntry::from_xml)
        .collect::<CmisResult<Vec<_>>>()?;
    let next = feed
        .children_named(ns::ATOM, "link")
        .filter_map(AtomLink::from_xml)
        .find(|l| l.rel == rel::NEXT)
        .map(|l| l.href);
    Ok((entries, next))
}

/// Content carried inline in an entry.
#[derive(Debug, Clone)]
pub struct InlineContent {
    pub media_type: String,
    pub base64: String,
}

/// Serialize an entry for POST or PUT.
pub fn write_entry(title: &str, properties: &PropertyMap, content: Option<&InlineContent>) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push_str(&format!(
        r#"<atom:entry xmlns:atom="{}" xmlns:cmis="{}" xmlns:cmisra="{}">"#,
        ns::ATOM,
        ns::CMIS,
        ns::CMISRA
    ));
    out.push_str("<atom:id>urn:uuid:00000000-0000-0000-0000-00000000000</atom:id>");
    out.push_str(&format!("<atom:title>{}</atom:title>", escape(title)));
    out.push_str(&format!(
        "<atom:updated>{}</atom:updated>",
        format_date_time(&Utc::now())
    ));
    if let Some(content) = content {
        out.push_str("<cmisra:content>");
        out.push_str(&format!(
            "<cmisra:mediatype>{}</cmisra:mediatype>",
            escape(content.media_type.as_str())
        ));
        out.push_str(&format!("<cmisra:base64>{}</cmisra:base64>", content.base64));
        out.push_str("</cmisra:content>");
    }
    out.push_str("<cmisra:object><cmis:properties>");
    out.push_str(&properties_to_xml(properties));
    out.push_str("</cmis:properties></cmisra:object>");
    out.push_str("</atom:entry>");
    out
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
