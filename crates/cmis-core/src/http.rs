//! HTTP plumbing shared by every binding.
//!
//! Bindings never talk to `reqwest` directly. They build [`HttpRequest`]s and
//! send them through an [`HttpSession`], which attaches credentials, logs the
//! exchange and applies the single OAuth2 refresh-and-retry on 401. The
//! session executes requests through an [`HttpTransport`]; the default one
//! is a blocking `reqwest` client, tests plug in
//! [`MockTransport`](crate::testing::MockTransport).

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, info};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::error::{CmisError, CmisResult};
use crate::oauth2::OAuth2Handler;
use crate::xml::XmlElement;

/// RFC 3986 unreserved characters stay as they are.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a value for use inside a URL path segment or query.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

// ── Request / response ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body as text, empty when there is none.
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}

/// A response whose body is still streaming from the server.
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish()
    }
}

impl HttpResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Box<dyn Read + Send>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn from_bytes(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self::new(status, headers, Box::new(Cursor::new(body)))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn bytes(mut self) -> CmisResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn text(self) -> CmisResult<String> {
        let bytes = self.bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn json<T: DeserializeOwned>(self) -> CmisResult<T> {
        let bytes = self.bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn xml(self) -> CmisResult<XmlElement> {
        let bytes = self.bytes()?;
        XmlElement::parse_bytes(&bytes)
    }

    /// Hand the body over as a stream, dropping it closes the transfer.
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.body
    }
}

// ── Transport ───────────────────────────────────────────────────────

/// Executes one HTTP exchange. Non-2xx statuses are not errors here.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> CmisResult<HttpResponse>;
}

/// Blocking `reqwest` transport with a cookie store, needed by the OAuth2
/// login flow.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(no_ssl_check: bool, timeout: Option<Duration>) -> CmisResult<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(no_ssl_check);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CmisError::runtime(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> CmisResult<HttpResponse> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        Ok(HttpResponse::new(status, headers, Box::new(response)))
    }
}

// ── Authenticated session ───────────────────────────────────────────

/// Where an OAuth2 access token goes on resource requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TokenPlacement {
    /// `Authorization: Bearer <token>`
    #[default]
    AuthorizationHeader,
    /// Appended as a query parameter with the given name.
    QueryParameter(String),
}

/// Credential-carrying HTTP client used by the bindings.
pub struct HttpSession {
    transport: Arc<dyn HttpTransport>,
    username: String,
    password: String,
    oauth2: Option<OAuth2Handler>,
    placement: TokenPlacement,
    default_headers: Vec<(String, String)>,
    verbose: bool,
}

impl HttpSession {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            username: username.into(),
            password: password.into(),
            oauth2: None,
            placement: TokenPlacement::default(),
            default_headers: Vec::new(),
            verbose: false,
        }
    }

    pub fn with_oauth2(mut self, handler: OAuth2Handler) -> Self {
        self.oauth2 = Some(handler);
        self
    }

    pub fn with_token_placement(mut self, placement: TokenPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn oauth2(&self) -> Option<&OAuth2Handler> {
        self.oauth2.as_ref()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Run the OAuth2 authorization flow unless a token is already held.
    pub fn authenticate(&self) -> CmisResult<()> {
        match &self.oauth2 {
            Some(handler) if !handler.has_token() => {
                handler.authenticate(self.transport.as_ref(), &self.username, &self.password)
            }
            _ => Ok(()),
        }
    }

    fn authorize(&self, request: &HttpRequest) -> CmisResult<HttpRequest> {
        let mut request = request.clone();
        for (name, value) in &self.default_headers {
            if request.header_value(name).is_none() {
                request.headers.push((name.clone(), value.clone()));
            }
        }

        let token = self.oauth2.as_ref().and_then(|h| h.access_token());
        match (token, &self.placement) {
            (Some(token), TokenPlacement::AuthorizationHeader) => {
                request
                    .headers
                    .push(("Authorization".into(), format!("Bearer {token}")));
            }
            (Some(token), TokenPlacement::QueryParameter(name)) => {
                let mut url = url::Url::parse(&request.url)?;
                url.query_pairs_mut().append_pair(name, &token);
                request.url = url.to_string();
            }
            (None, _) if !self.username.is_empty() => {
                let credentials = STANDARD.encode(format!("{}:{}", self.username, self.password));
                request
                    .headers
                    .push(("Authorization".into(), format!("Basic {credentials}")));
            }
            (None, _) => {}
        }
        Ok(request)
    }

    fn execute_logged(&self, request: &HttpRequest) -> CmisResult<HttpResponse> {
        let request = self.authorize(request)?;
        debug!("{} {}", request.method, request.url);
        if self.verbose && request.body.is_some() {
            debug!("Request body:\n{}", request.body_text());
        }

        let response = self.transport.execute(&request)?;
        debug!("{} {} -> {}", request.method, request.url, response.status);
        if !self.verbose {
            return Ok(response);
        }
        let status = response.status;
        let headers = response.headers.clone();
        let body = response.bytes()?;
        debug!("Response body:\n{}", String::from_utf8_lossy(&body));
        Ok(HttpResponse::from_bytes(status, headers, body))
    }

    /// Send a request and return whatever the server answered.
    ///
    /// A 401 while an OAuth2 token is held triggers one token refresh and one
    /// retry; a second 401 is reported as permission denied.
    pub fn send_unchecked(&self, request: &HttpRequest) -> CmisResult<HttpResponse> {
        let response = self.execute_logged(request)?;
        if response.status != 401 {
            return Ok(response);
        }
        let Some(handler) = self.oauth2.as_ref().filter(|h| h.has_token()) else {
            return Ok(response);
        };

        info!("Access token rejected by {}, refreshing", request.url);
        drop(response);
        handler.refresh(self.transport.as_ref())?;

        let retried = self.execute_logged(request)?;
        if retried.status == 401 {
            return Err(CmisError::permission_denied(format!(
                "Access to {} denied after refreshing the access token",
                request.url
            )));
        }
        Ok(retried)
    }

    /// Send a request, mapping non-2xx statuses to errors.
    pub fn send(&self, request: &HttpRequest) -> CmisResult<HttpResponse> {
        let response = self.send_unchecked(request)?;
        if response.is_success() {
            return Ok(response);
        }
        let status = response.status;
        let body = response.text().unwrap_or_default();
        Err(CmisError::from_status(status, &body))
    }

    pub fn get(&self, url: &str) -> CmisResult<HttpResponse> {
        self.send(&HttpRequest::get(url))
    }

    pub fn post(
        &self,
        url: &str,
        body: impl Into<Vec<u8>>,
        content_type: &str,
    ) -> CmisResult<HttpResponse> {
        self.send(
            &HttpRequest::new(Method::POST, url)
                .header("Content-Type", content_type)
                .body(body),
        )
    }

    pub fn put(
        &self,
        url: &str,
        body: impl Into<Vec<u8>>,
        content_type: &str,
    ) -> CmisResult<HttpResponse> {
        self.send(
            &HttpRequest::new(Method::PUT, url)
                .header("Content-Type", content_type)
                .body(body),
        )
    }

    pub fn delete(&self, url: &str) -> CmisResult<()> {
        self.send(&HttpRequest::new(Method::DELETE, url))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
