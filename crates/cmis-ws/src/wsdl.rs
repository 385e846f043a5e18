//! WSDL download and the service endpoint table.

use std::collections::BTreeMap;

use log::{debug, warn};

use cmis_core::xml::{ns, XmlElement};
use cmis_core::{CmisError, CmisResult, HttpSession};

/// Names of the services this binding calls.
pub mod service {
    pub const REPOSITORY: &str = "RepositoryService";
    pub const OBJECT: &str = "ObjectService";
    pub const NAVIGATION: &str = "NavigationService";
    pub const VERSIONING: &str = "VersioningService";
}

fn is_wsdl(document: &XmlElement) -> bool {
    document.is(ns::WSDL, "definitions")
}

fn fetch_document(http: &HttpSession, url: &str) -> CmisResult<Option<XmlElement>> {
    let bytes = http.get(url)?.bytes()?;
    Ok(XmlElement::parse_bytes(&bytes).ok().filter(is_wsdl))
}

/// Download the WSDL of a binding URL.
///
/// Servers often answer the bare endpoint with an HTML page, in which case
/// the request is retried once with a `wsdl` query parameter.
pub fn fetch_wsdl(http: &HttpSession, binding_url: &str) -> CmisResult<XmlElement> {
    debug!("Fetching WSDL {binding_url}");
    if let Some(document) = fetch_document(http, binding_url)? {
        return Ok(document);
    }

    let separator = if binding_url.contains('?') { '&' } else { '?' };
    let retry = format!("{binding_url}{separator}wsdl");
    warn!("{binding_url} did not answer with a WSDL, trying {retry}");
    fetch_document(http, &retry)?
        .ok_or_else(|| CmisError::runtime(format!("Failed to parse WSDL from {binding_url}")))
}

/// Service name to SOAP endpoint, from `wsdl:service/wsdl:port/soap:address`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceMap {
    urls: BTreeMap<String, String>,
}

impl ServiceMap {
    pub fn from_wsdl(definitions: &XmlElement) -> Self {
        let mut urls = BTreeMap::new();
        for service in definitions.descendants(ns::WSDL, "service") {
            let Some(name) = service.attr("name") else {
                continue;
            };
            let location = service
                .children_named(ns::WSDL, "port")
                .flat_map(|port| port.children.iter())
                .filter(|address| address.name == "address")
                .find_map(|address| address.attr("location"));
            if let Some(location) = location {
                urls.insert(name.to_string(), location.to_string());
            }
        }
        Self { urls }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.urls.get(name).map(String::as_str)
    }

    /// Endpoint of a service the caller cannot do without.
    pub fn require(&self, name: &str) -> CmisResult<&str> {
        self.get(name)
            .ok_or_else(|| CmisError::unsupported(format!("The WSDL declares no {name}")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.urls.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
