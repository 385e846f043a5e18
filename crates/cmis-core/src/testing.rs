//! In-memory HTTP transport for tests.
//!
//! Canned responses are registered per method and URL; requests are recorded
//! so tests can assert on what was sent. Clones share state.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::CmisResult;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};

#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    expectations: Vec<Expectation>,
    requests: Vec<HttpRequest>,
}

#[derive(Clone)]
struct Expectation {
    method: String,
    url: String,
    body_contains: Vec<String>,
    once: bool,
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Expectation {
    fn matches(&self, request: &HttpRequest) -> bool {
        if !self.method.eq_ignore_ascii_case(request.method.as_str()) {
            return false;
        }
        if !url_matches(&self.url, &request.url) {
            return false;
        }
        let body = request.body_text();
        self.body_contains.iter().all(|needle| body.contains(needle))
    }
}

/// Exact match, or match ignoring the request's query string.
fn url_matches(expected: &str, actual: &str) -> bool {
    expected == actual || actual.split('?').next() == Some(expected)
}

/// Builder returned by [`MockTransport::expect`].
pub struct ExpectationBuilder {
    mock: MockTransport,
    expectation: Expectation,
}

impl ExpectationBuilder {
    /// Only match requests whose body contains `needle`.
    pub fn with_body_containing(mut self, needle: impl Into<String>) -> Self {
        self.expectation.body_contains.push(needle.into());
        self
    }

    pub fn with_response_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.expectation.headers.push((name.into(), value.into()));
        self
    }

    /// Serve this response a single time.
    pub fn once(mut self) -> Self {
        self.expectation.once = true;
        self
    }

    pub fn respond(mut self, status: u16, body: impl Into<Vec<u8>>) {
        self.expectation.status = status;
        self.expectation.body = body.into();
        self.mock.lock().expectations.push(self.expectation);
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a response for `method url`. The first registered match wins.
    pub fn expect(&self, method: &str, url: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            mock: self.clone(),
            expectation: Expectation {
                method: method.to_string(),
                url: url.to_string(),
                body_contains: Vec::new(),
                once: false,
                status: 200,
                headers: Vec::new(),
                body: Vec::new(),
            },
        }
    }

    /// Drop every registered response, keeping the request log.
    pub fn reset(&self) {
        self.lock().expectations.clear();
    }

    /// Every request executed so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Requests sent to `method url`, query strings ignored.
    pub fn requests_to(&self, method: &str, url: &str) -> Vec<HttpRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method.as_str().eq_ignore_ascii_case(method) && url_matches(url, &r.url))
            .cloned()
            .collect()
    }
}

impl HttpTransport for MockTransport {
    fn execute(&self, request: &HttpRequest) -> CmisResult<HttpResponse> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let Some(index) = state.expectations.iter().position(|e| e.matches(request)) else {
            let body = format!("No mock response for {} {}", request.method, request.url);
            return Ok(HttpResponse::from_bytes(404, Vec::new(), body.into_bytes()));
        };
        let expectation = if state.expectations[index].once {
            state.expectations.remove(index)
        } else {
            state.expectations[index].clone()
        };
        Ok(HttpResponse::from_bytes(
            expectation.status,
            expectation.headers,
            expectation.body,
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn unmatched_request_is_404() {
        let mock = MockTransport::new();
        let response = mock.execute(&HttpRequest::get("http://host/a")).unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn once_is_consumed_then_falls_through() {
        let mock = MockTransport::new();
        mock.expect("GET", "http://host/a").once().respond(401, "");
        mock.expect("GET", "http://host/a").respond(200, "ok");
        let req = HttpRequest::get("http://host/a");
        assert_eq!(mock.execute(&req).unwrap().status, 401);
        assert_eq!(mock.execute(&req).unwrap().status, 200);
        assert_eq!(mock.execute(&req).unwrap().status, 200);
    }

    #[test]
    fn matches_on_body_and_ignores_query() {
        let mock = MockTransport::new();
        mock.expect("POST", "http://host/svc")
            .with_body_containing("getObject")
            .respond(200, "object");
        mock.expect("POST", "http://host/svc").respond(200, "other");

        let req = HttpRequest::new(Method::POST, "http://host/svc?x=1").body("<getObject/>");
        assert_eq!(mock.execute(&req).unwrap().text().unwrap(), "object");
        let req = HttpRequest::new(Method::POST, "http://host/svc").body("<getChildren/>");
        assert_eq!(mock.execute(&req).unwrap().text().unwrap(), "other");
        assert_eq!(mock.requests_to("post", "http://host/svc").len(), 2);
    }
}
