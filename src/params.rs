//! Session configuration.

use serde::{Deserialize, Serialize};

use cmis_core::OAuth2Data;

/// Wire binding a session talks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingKind {
    AtomPub,
    WebServices,
    GoogleDrive,
    OneDrive,
    SharePoint,
}

impl BindingKind {
    /// Guess the binding from the endpoint URL. `None` when the URL does
    /// not identify one: AtomPub and then Web Services are tried in turn.
    pub fn detect(url: &str) -> Option<Self> {
        let lower = url.to_ascii_lowercase();
        if lower.contains("googleapis.com/drive") || lower.contains("/drive/v2") {
            Some(Self::GoogleDrive)
        } else if lower.contains("apis.live.net") {
            Some(Self::OneDrive)
        } else if lower.contains("/_api/web") {
            Some(Self::SharePoint)
        } else if lower.ends_with("wsdl") || lower.contains("?wsdl") || lower.contains("/services") {
            Some(Self::WebServices)
        } else if lower.contains("/atom") {
            Some(Self::AtomPub)
        } else {
            None
        }
    }

    /// OAuth2 is mandatory for the consumer cloud APIs.
    pub fn requires_oauth2(&self) -> bool {
        matches!(self, Self::GoogleDrive | Self::OneDrive)
    }
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AtomPub => "AtomPub",
            Self::WebServices => "Web Services",
            Self::GoogleDrive => "Google Drive",
            Self::OneDrive => "OneDrive",
            Self::SharePoint => "SharePoint",
        };
        f.write_str(name)
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionParams {
    pub binding_url: String,
    /// Empty selects the first repository of the endpoint.
    pub repository_id: String,
    pub username: String,
    pub password: String,
    pub oauth2: Option<OAuth2Data>,
    /// Tokens saved from an earlier session; skips the authorization flow.
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Log request and response bodies.
    pub verbose: bool,
    /// Detected from `binding_url` when unset.
    pub binding: Option<BindingKind>,
    pub no_ssl_check: bool,
}

impl SessionParams {
    pub fn new(binding_url: impl Into<String>) -> Self {
        Self {
            binding_url: binding_url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_repository(mut self, repository_id: impl Into<String>) -> Self {
        self.repository_id = repository_id.into();
        self
    }

    pub fn with_oauth2(mut self, oauth2: OAuth2Data) -> Self {
        self.oauth2 = Some(oauth2);
        self
    }

    pub fn with_tokens(mut self, access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_binding(mut self, binding: BindingKind) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn binding(&self) -> Option<BindingKind> {
        self.binding.or_else(|| BindingKind::detect(&self.binding_url))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
