//! Namespace-aware XML tree used by the AtomPub and SOAP bindings.
//!
//! Documents are read with `quick_xml::NsReader` into a small element tree so
//! the bindings can navigate entries, feeds and envelopes by namespace URI and
//! local name instead of by prefix.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::{CmisError, CmisResult};

/// Namespace URIs used across the bindings.
pub mod ns {
    pub const APP: &str = "http://www.w3.org/2007/app";
    pub const ATOM: &str = "http://www.w3.org/2005/Atom";
    pub const CMIS: &str = "http://docs.oasis-open.org/ns/cmis/core/200908/";
    pub const CMISRA: &str = "http://docs.oasis-open.org/ns/cmis/restatom/200908/";
    pub const CMISM: &str = "http://docs.oasis-open.org/ns/cmis/messaging/200908/";
    pub const CMISW: &str = "http://docs.oasis-open.org/ns/cmis/ws/200908/";
    pub const SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";
    pub const WSDL: &str = "http://schemas.xmlsoap.org/wsdl/";
    pub const WSDL_SOAP: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
    pub const WSSE: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
    pub const WSU: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
    pub const XOP: &str = "http://www.w3.org/2004/08/xop/include";
}

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Resolved namespace URI, if the element is bound to one.
    pub namespace: Option<String>,
    /// Local name (prefix stripped).
    pub name: String,
    /// Attributes by local name, namespace declarations excluded.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// Concatenated, unescaped text content.
    pub text: String,
}

impl XmlElement {
    /// Parse a whole document and return its root element.
    pub fn parse(xml: &str) -> CmisResult<Self> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_resolved_event()? {
                (resolved, Event::Start(ref e)) => stack.push(Self::open(resolved, e)?),
                (resolved, Event::Empty(ref e)) => {
                    let element = Self::open(resolved, e)?;
                    Self::attach(&mut stack, &mut root, element);
                }
                (_, Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        Self::attach(&mut stack, &mut root, element);
                    }
                }
                (_, Event::Text(ref t)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&t.unescape()?);
                    }
                }
                (_, Event::CData(ref c)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(c));
                    }
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(CmisError::runtime("Unexpected end of XML document"));
        }
        root.ok_or_else(|| CmisError::runtime("Empty XML document"))
    }

    /// Parse raw bytes, which must be UTF-8.
    pub fn parse_bytes(bytes: &[u8]) -> CmisResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CmisError::runtime(format!("XML document is not UTF-8: {e}")))?;
        Self::parse(text)
    }

    fn open(resolved: ResolveResult, start: &BytesStart) -> CmisResult<Self> {
        let namespace = match resolved {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            _ => None,
        };
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            namespace,
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            }
        }
    }

    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.is_in(namespace)
    }

    pub fn is_in(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given name.
    pub fn child(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// Direct children with the given name.
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    pub fn child_text(&self, namespace: &str, name: &str) -> Option<String> {
        self.child(namespace, name).map(|c| c.text.clone())
    }

    /// First element with the given name in document order, self included.
    pub fn find(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        if self.is(namespace, name) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(namespace, name))
    }

    /// Every element with the given name in document order, self included.
    pub fn descendants<'a>(&'a self, namespace: &str, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect(namespace, name, &mut found);
        found
    }

    fn collect<'a>(&'a self, namespace: &str, name: &str, found: &mut Vec<&'a XmlElement>) {
        if self.is(namespace, name) {
            found.push(self);
        }
        for child in &self.children {
            child.collect(namespace, name, found);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
