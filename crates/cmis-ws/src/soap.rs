//! SOAP 1.1 envelopes, WS-Security headers and fault mapping.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use log::debug;
use quick_xml::escape::escape;
use reqwest::Method;

use cmis_core::property::properties_to_xml;
use cmis_core::xml::{ns, XmlElement};
use cmis_core::{CmisError, CmisErrorKind, CmisResult, HttpRequest, HttpSession, PropertyMap};

use crate::mtom::{is_multipart, parse_multipart, MultipartBody};

const PASSWORD_TEXT: &str = "http://docs.oasis-open.org/wss/2004/01/\
oasis-200401-wss-username-token-profile-1.0#PasswordText";

/// Content sent inline with `createDocument`, `setContentStream` or `checkIn`.
pub struct ContentUpload<'a> {
    pub data: &'a [u8],
    pub mime_type: &'a str,
    pub filename: &'a str,
}

/// Body of one CMIS messaging call, built parameter by parameter.
#[derive(Debug, Clone)]
pub struct SoapRequest {
    operation: &'static str,
    body: String,
}

impl SoapRequest {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            body: format!("<cmism:{operation}>"),
        }
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.body
            .push_str(&format!("<cmism:{name}>{}</cmism:{name}>", escape(value)));
        self
    }

    pub fn optional(self, name: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn flag(self, name: &str, value: bool) -> Self {
        self.param(name, if value { "true" } else { "false" })
    }

    pub fn properties(mut self, properties: &PropertyMap) -> Self {
        self.body.push_str("<cmism:properties>");
        self.body.push_str(&properties_to_xml(properties));
        self.body.push_str("</cmism:properties>");
        self
    }

    pub fn content_stream(mut self, content: &ContentUpload<'_>) -> Self {
        self.body.push_str("<cmism:contentStream>");
        self.body.push_str(&format!(
            "<cmism:length>{}</cmism:length>",
            content.data.len()
        ));
        if !content.mime_type.is_empty() {
            self.body.push_str(&format!(
                "<cmism:mimeType>{}</cmism:mimeType>",
                escape(content.mime_type)
            ));
        }
        if !content.filename.is_empty() {
            self.body.push_str(&format!(
                "<cmism:filename>{}</cmism:filename>",
                escape(content.filename)
            ));
        }
        self.body.push_str("<cmism:stream>");
        self.body.push_str(&STANDARD.encode(content.data));
        self.body.push_str("</cmism:stream></cmism:contentStream>");
        self
    }

    fn payload(&self) -> String {
        format!("{}</cmism:{}>", self.body, self.operation)
    }
}

/// The element inside `soap:Body` of a successful answer, plus the MTOM
/// parts it may reference.
#[derive(Debug)]
pub struct SoapResponse {
    pub body: XmlElement,
    multipart: Option<MultipartBody>,
}

impl SoapResponse {
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.body.child(ns::CMISM, name)
    }

    pub fn require(&self, name: &str) -> CmisResult<&XmlElement> {
        self.child(name).ok_or_else(|| {
            CmisError::runtime(format!("{} answer without cmism:{name}", self.body.name))
        })
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.child(name).map(|c| c.text.clone())
    }

    /// Bytes of the `cmism:stream` under `cmism:<container>`, inline base64
    /// or an XOP reference. A referenced MTOM part is moved out of the
    /// answer, not copied.
    pub fn into_stream(mut self, container: &str) -> CmisResult<Vec<u8>> {
        let content = self.body.child(ns::CMISM, container).ok_or_else(|| {
            CmisError::runtime(format!("{} answer without cmism:{container}", self.body.name))
        })?;
        let Some(stream) = content.child(ns::CMISM, "stream") else {
            return Ok(Vec::new());
        };
        if let Some(include) = stream.child(ns::XOP, "Include") {
            let href = include.attr("href").unwrap_or_default().to_string();
            return self
                .multipart
                .as_mut()
                .and_then(|m| m.take_attachment(&href))
                .ok_or_else(|| CmisError::runtime(format!("Missing MTOM part {href}")));
        }
        let compact: String = stream.text.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| CmisError::runtime(format!("Invalid base64 content stream: {e}")))
    }
}

fn unqualified_child<'a>(element: &'a XmlElement, name: &str) -> Option<&'a XmlElement> {
    element.children.iter().find(|c| c.name == name)
}

/// Error carried by a `soap:Fault`: the `cmisFault` type picks the kind,
/// `faultstring` is the message.
pub fn fault_error(fault: &XmlElement) -> CmisError {
    let cmis_fault = unqualified_child(fault, "detail").and_then(|d| d.find(ns::CMISM, "cmisFault"));
    let kind = cmis_fault
        .and_then(|f| f.child_text(ns::CMISM, "type"))
        .map(|t| CmisErrorKind::from_name(&t))
        .unwrap_or(CmisErrorKind::Runtime);
    let message = unqualified_child(fault, "faultstring")
        .map(|s| s.text.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| cmis_fault.and_then(|f| f.child_text(ns::CMISM, "message")))
        .unwrap_or_else(|| "SOAP fault".to_string());
    CmisError::new(kind, message)
}

/// Sends CMIS messaging calls to the service endpoints.
pub struct SoapClient {
    http: HttpSession,
}

impl SoapClient {
    pub fn new(http: HttpSession) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpSession {
        &self.http
    }

    fn security_header(&self) -> String {
        if self.http.username().is_empty() {
            return String::new();
        }
        let created = Utc::now();
        let expires = created + Duration::hours(1);
        let stamp = |t: chrono::DateTime<Utc>| t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        format!(
            "<soap:Header><wsse:Security xmlns:wsse=\"{}\" xmlns:wsu=\"{}\">\
             <wsu:Timestamp><wsu:Created>{}</wsu:Created><wsu:Expires>{}</wsu:Expires></wsu:Timestamp>\
             <wsse:UsernameToken><wsse:Username>{}</wsse:Username>\
             <wsse:Password Type=\"{PASSWORD_TEXT}\">{}</wsse:Password>\
             <wsu:Created>{}</wsu:Created></wsse:UsernameToken>\
             </wsse:Security></soap:Header>",
            ns::WSSE,
            ns::WSU,
            stamp(created),
            stamp(expires),
            escape(self.http.username()),
            escape(self.http.password()),
            stamp(created),
        )
    }

    pub fn envelope(&self, request: &SoapRequest) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <soap:Envelope xmlns:soap=\"{}\" xmlns:cmis=\"{}\" xmlns:cmism=\"{}\">\
             {}<soap:Body>{}</soap:Body></soap:Envelope>",
            ns::SOAP_ENV,
            ns::CMIS,
            ns::CMISM,
            self.security_header(),
            request.payload(),
        )
    }

    /// POST a call to `url` and return the answer element.
    ///
    /// Faults arrive with HTTP 500, so the body is inspected before the
    /// status.
    pub fn call(&self, url: &str, request: &SoapRequest) -> CmisResult<SoapResponse> {
        debug!("SOAP {} -> {url}", request.operation());
        let http_request = HttpRequest::new(Method::POST, url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", "\"\"")
            .body(self.envelope(request));
        let response = self.http.send_unchecked(&http_request)?;
        let status = response.status;
        let success = response.is_success();
        let content_type = response.header("Content-Type").unwrap_or_default().to_string();
        let bytes = response.bytes()?;

        let (envelope, multipart) = if is_multipart(&content_type) {
            let mut parts = parse_multipart(&content_type, &bytes)?;
            (std::mem::take(&mut parts.root), Some(parts))
        } else {
            (bytes, None)
        };

        let document = match XmlElement::parse_bytes(&envelope) {
            Ok(document) => document,
            Err(_) if !success => {
                return Err(CmisError::from_status(status, &String::from_utf8_lossy(&envelope)))
            }
            Err(e) => return Err(e),
        };
        let body = document
            .child(ns::SOAP_ENV, "Body")
            .ok_or_else(|| CmisError::runtime(format!("No SOAP body in answer from {url}")))?;
        if let Some(fault) = body.child(ns::SOAP_ENV, "Fault") {
            return Err(fault_error(fault));
        }
        if !success {
            return Err(CmisError::from_status(status, &String::from_utf8_lossy(&envelope)));
        }
        let answer = body.children.first().cloned().ok_or_else(|| {
            CmisError::runtime(format!("Empty SOAP body for {}", request.operation()))
        })?;
        Ok(SoapResponse {
            body: answer,
            multipart,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
