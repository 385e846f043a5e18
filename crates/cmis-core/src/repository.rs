//! Repository description as reported by `getRepositoryInfo`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::xml::{ns, XmlElement};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub description: String,
    pub vendor_name: String,
    pub product_name: String,
    pub product_version: String,
    pub root_folder_id: String,
    pub cmis_version_supported: String,
    pub thin_client_uri: Option<String>,
    pub principal_anonymous: Option<String>,
    pub principal_anyone: Option<String>,
    /// `capabilityXxx` values keyed by their element name.
    pub capabilities: BTreeMap<String, String>,
}

impl Repository {
    /// A repository for backends that have no repository notion.
    pub fn fixed(id: &str, name: &str, root_folder_id: &str) -> Self {
        let mut capabilities = BTreeMap::new();
        capabilities.insert("capabilityQuery".to_string(), "none".to_string());
        capabilities.insert("capabilityACL".to_string(), "none".to_string());
        capabilities.insert("capabilityMultifiling".to_string(), "true".to_string());
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: name.to_string(),
            root_folder_id: root_folder_id.to_string(),
            cmis_version_supported: "1.0".to_string(),
            capabilities,
            ..Self::default()
        }
    }

    /// Parse a `repositoryInfo` element, either `cmisra:repositoryInfo` from an
    /// AtomPub service document or `cmism:repositoryInfo` from a SOAP response.
    pub fn from_xml(element: &XmlElement) -> Self {
        let text = |name: &str| element.child_text(ns::CMIS, name).unwrap_or_default();
        let optional = |name: &str| element.child_text(ns::CMIS, name).filter(|v| !v.is_empty());

        let mut capabilities = BTreeMap::new();
        if let Some(caps) = element.child(ns::CMIS, "capabilities") {
            for cap in caps.children.iter().filter(|c| c.is_in(ns::CMIS)) {
                capabilities.insert(cap.name.clone(), cap.text.clone());
            }
        }

        Self {
            id: text("repositoryId"),
            name: text("repositoryName"),
            description: text("repositoryDescription"),
            vendor_name: text("vendorName"),
            product_name: text("productName"),
            product_version: text("productVersion"),
            root_folder_id: text("rootFolderId"),
            cmis_version_supported: text("cmisVersionSupported"),
            thin_client_uri: optional("thinClientURI"),
            principal_anonymous: optional("principalAnonymous"),
            principal_anyone: optional("principalAnyone"),
            capabilities,
        }
    }

    pub fn capability(&self, name: &str) -> Option<&str> {
        self.capabilities.get(name).map(String::as_str)
    }

    pub fn is_queryable(&self) -> bool {
        !matches!(self.capability("capabilityQuery"), None | Some("none"))
    }

    pub fn supports_acl(&self) -> bool {
        !matches!(self.capability("capabilityACL"), None | Some("none"))
    }

    pub fn supports_multifiling(&self) -> bool {
        self.capability("capabilityMultifiling") == Some("true")
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository {}", self.id)?;
        writeln!(f, "    Name: {}", self.name)?;
        writeln!(f, "    Description: {}", self.description)?;
        writeln!(
            f,
            "    Vendor: {} {} {}",
            self.vendor_name, self.product_name, self.product_version
        )?;
        writeln!(f, "    Root folder: {}", self.root_folder_id)?;
        writeln!(f, "    CMIS version: {}", self.cmis_version_supported)?;
        for (name, value) in &self.capabilities {
            writeln!(f, "    {name}: {value}")?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
