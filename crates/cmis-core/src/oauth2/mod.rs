//! OAuth2 authorization-code support for the REST bindings.
//!
//! [`OAuth2Handler`] owns the token pair of a session:
//!   1. Obtain an authorization code through a pluggable [`AuthorizationFlow`].
//!   2. Exchange the code for access + refresh tokens.
//!   3. Refresh the access token when a resource request is rejected.

mod flow;
mod scrape;

pub use flow::{AuthorizationFlow, FormScrapingFlow, StaticCodeFlow};
pub use scrape::{find_auth_code, find_form, HtmlForm};

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::{CmisError, CmisResult};
use crate::http::{HttpRequest, HttpTransport};

/// Client registration and endpoints of an OAuth2 provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Data {
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub client_secret: String,
}

impl OAuth2Data {
    /// Whether every field needed by the authorization-code grant is set.
    pub fn is_complete(&self) -> bool {
        [
            &self.auth_url,
            &self.token_url,
            &self.scope,
            &self.redirect_uri,
            &self.client_id,
            &self.client_secret,
        ]
        .iter()
        .all(|v| !v.is_empty())
    }

    /// URL the user (or the scraping flow) opens to obtain a code.
    pub fn authorization_url(&self) -> CmisResult<String> {
        let url = url::Url::parse_with_params(
            &self.auth_url,
            &[
                ("scope", self.scope.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
            ],
        )?;
        Ok(url.to_string())
    }
}

/// An access token with its optional refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuth2Token {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| Utc::now() >= exp).unwrap_or(false)
    }
}

/// Raw JSON answer of a token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
}

impl From<TokenResponse> for OAuth2Token {
    fn from(resp: TokenResponse) -> Self {
        Self {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            token_type: resp.token_type.unwrap_or_else(|| "Bearer".into()),
            expires_at: resp
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }
}

/// Token state of one session. The token is replaced in place on refresh.
pub struct OAuth2Handler {
    data: OAuth2Data,
    token: RwLock<Option<OAuth2Token>>,
    flow: Box<dyn AuthorizationFlow>,
}

impl OAuth2Handler {
    /// Handler using the login-form scraping flow.
    pub fn new(data: OAuth2Data) -> Self {
        Self {
            data,
            token: RwLock::new(None),
            flow: Box::new(FormScrapingFlow::default()),
        }
    }

    pub fn with_flow(mut self, flow: Box<dyn AuthorizationFlow>) -> Self {
        self.flow = flow;
        self
    }

    /// Start from an already known token pair, skipping authorization.
    pub fn with_tokens(self, access_token: &str, refresh_token: &str) -> Self {
        self.set_token(OAuth2Token {
            access_token: access_token.to_string(),
            refresh_token: Some(refresh_token.to_string()).filter(|t| !t.is_empty()),
            token_type: "Bearer".into(),
            expires_at: None,
        });
        self
    }

    pub fn data(&self) -> &OAuth2Data {
        &self.data
    }

    pub fn token(&self) -> Option<OAuth2Token> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: OAuth2Token) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn access_token(&self) -> Option<String> {
        self.token().map(|t| t.access_token)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.token().and_then(|t| t.refresh_token)
    }

    pub fn has_token(&self) -> bool {
        self.token()
            .map(|t| !t.access_token.is_empty())
            .unwrap_or(false)
    }

    /// Run the authorization flow and exchange its code for tokens.
    pub fn authenticate(
        &self,
        transport: &dyn HttpTransport,
        username: &str,
        password: &str,
    ) -> CmisResult<()> {
        if !self.data.is_complete() {
            return Err(CmisError::invalid("Incomplete OAuth2 configuration"));
        }
        let code = self
            .flow
            .authorization_code(transport, &self.data, username, password)?;
        self.exchange_code(transport, &code)
    }

    /// Exchange an authorization code for a token pair.
    pub fn exchange_code(&self, transport: &dyn HttpTransport, code: &str) -> CmisResult<()> {
        if code.is_empty() {
            return Err(CmisError::permission_denied("Empty OAuth2 authorization code"));
        }
        debug!("Exchanging authorization code for tokens");
        let token = self.post_token(
            transport,
            &[
                ("code", code),
                ("client_id", self.data.client_id.as_str()),
                ("client_secret", self.data.client_secret.as_str()),
                ("redirect_uri", self.data.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
        )?;
        self.set_token(token);
        Ok(())
    }

    /// Replace the access token using the stored refresh token.
    pub fn refresh(&self, transport: &dyn HttpTransport) -> CmisResult<()> {
        let refresh_token = self
            .refresh_token()
            .ok_or_else(|| CmisError::permission_denied("No OAuth2 refresh token available"))?;

        info!("Refreshing OAuth2 access token");
        let mut token = self.post_token(
            transport,
            &[
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.data.client_id.as_str()),
                ("client_secret", self.data.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ],
        )?;
        // Providers may omit the refresh token on refresh.
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token);
        }
        self.set_token(token);
        Ok(())
    }

    fn post_token(
        &self,
        transport: &dyn HttpTransport,
        params: &[(&str, &str)],
    ) -> CmisResult<OAuth2Token> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        let request = HttpRequest::new(Method::POST, self.data.token_url.as_str())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body);

        let response = transport.execute(&request)?;
        if !response.is_success() {
            let status = response.status;
            let body = response.text().unwrap_or_default();
            return Err(CmisError::permission_denied(format!(
                "OAuth2 token request failed with HTTP {status}: {}",
                body.trim()
            )));
        }
        let token: TokenResponse = response
            .json()
            .map_err(|e| CmisError::permission_denied(format!("Invalid token response: {e}")))?;
        Ok(token.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
