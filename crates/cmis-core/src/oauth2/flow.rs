//! Ways of obtaining an OAuth2 authorization code.

use log::debug;
use reqwest::Method;

use super::scrape::{find_auth_code, find_form};
use super::OAuth2Data;
use crate::error::{CmisError, CmisResult};
use crate::http::{HttpRequest, HttpTransport};

/// Obtains an authorization code for the given client registration.
pub trait AuthorizationFlow: Send + Sync {
    fn authorization_code(
        &self,
        transport: &dyn HttpTransport,
        data: &OAuth2Data,
        username: &str,
        password: &str,
    ) -> CmisResult<String>;
}

/// A code obtained out of band, e.g. from a browser redirect.
pub struct StaticCodeFlow {
    code: String,
}

impl StaticCodeFlow {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl AuthorizationFlow for StaticCodeFlow {
    fn authorization_code(
        &self,
        _transport: &dyn HttpTransport,
        _data: &OAuth2Data,
        _username: &str,
        _password: &str,
    ) -> CmisResult<String> {
        Ok(self.code.clone())
    }
}

/// Drives a provider's login and consent pages like a browser would:
/// login form, then approval form, then the code on the final page.
#[derive(Debug, Clone)]
pub struct FormScrapingFlow {
    pub username_field: String,
    pub password_field: String,
    pub approve_field: String,
}

impl Default for FormScrapingFlow {
    fn default() -> Self {
        Self {
            username_field: "Email".into(),
            password_field: "Passwd".into(),
            approve_field: "submit_access".into(),
        }
    }
}

impl FormScrapingFlow {
    fn fetch(
        &self,
        transport: &dyn HttpTransport,
        request: HttpRequest,
        step: &str,
    ) -> CmisResult<String> {
        debug!("OAuth2 {step}: {} {}", request.method, request.url);
        let response = transport.execute(&request)?;
        if !response.is_success() {
            return Err(CmisError::permission_denied(format!(
                "OAuth2 {step} failed with HTTP {}",
                response.status
            )));
        }
        response.text()
    }

    fn post_form(
        &self,
        transport: &dyn HttpTransport,
        url: &str,
        body: String,
        step: &str,
    ) -> CmisResult<String> {
        let request = HttpRequest::new(Method::POST, url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body);
        self.fetch(transport, request, step)
    }
}

impl AuthorizationFlow for FormScrapingFlow {
    fn authorization_code(
        &self,
        transport: &dyn HttpTransport,
        data: &OAuth2Data,
        username: &str,
        password: &str,
    ) -> CmisResult<String> {
        if username.is_empty() || password.is_empty() {
            return Err(CmisError::permission_denied(
                "Username and password are required to authorize",
            ));
        }

        let auth_url = data.authorization_url()?;
        let login_page = self.fetch(transport, HttpRequest::get(auth_url.as_str()), "login page")?;

        let mut login = find_form(&login_page, &auth_url, None)?;
        login.set(&self.username_field, username);
        login.set(&self.password_field, password);
        let approval_page = self.post_form(transport, &login.action, login.encode(), "login")?;

        let mut approval = find_form(&approval_page, &login.action, None)?;
        approval.set(&self.approve_field, "true");
        let code_page =
            self.post_form(transport, &approval.action, approval.encode(), "approval")?;

        find_auth_code(&code_page)
            .ok_or_else(|| CmisError::permission_denied("No authorization code in approval response"))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
