//! Error types shared by every CMIS binding.
//!
//! All public API surfaces return `CmisResult<T>`. The error kind carries the
//! CMIS error vocabulary (`objectNotFound`, `invalidArgument`, …) so callers
//! can branch on it regardless of the wire binding that produced it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Convenience alias.
pub type CmisResult<T> = Result<T, CmisError>;

/// CMIS error kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmisErrorKind {
    /// Unknown id, path or repository.
    ObjectNotFound,
    /// Malformed request parameters or unknown type id.
    InvalidArgument,
    /// Authentication or authorization failure.
    PermissionDenied,
    /// Network failure, malformed server response, parse failure.
    Runtime,
    /// Operation not implemented by the binding.
    Unsupported,
    /// Any other server-declared kind (`constraint`, `updateConflict`, …).
    Other(String),
}

impl CmisErrorKind {
    /// Wire name of the kind, as found in SOAP faults and exposed to callers.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ObjectNotFound => "objectNotFound",
            Self::InvalidArgument => "invalidArgument",
            Self::PermissionDenied => "permissionDenied",
            Self::Runtime => "runtime",
            Self::Unsupported => "notSupported",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Map a wire name back to a kind. Unknown names are kept verbatim.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "objectNotFound" => Self::ObjectNotFound,
            "invalidArgument" => Self::InvalidArgument,
            "permissionDenied" => Self::PermissionDenied,
            "runtime" | "" => Self::Runtime,
            "notSupported" => Self::Unsupported,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CmisErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CMIS error: a kind from the fixed vocabulary plus a readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmisError {
    pub kind: CmisErrorKind,
    pub message: String,
}

impl fmt::Display for CmisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for CmisError {}

impl CmisError {
    pub fn new(kind: CmisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build an error from a non-success HTTP status and its response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            400 => CmisErrorKind::InvalidArgument,
            401 | 403 => CmisErrorKind::PermissionDenied,
            404 => CmisErrorKind::ObjectNotFound,
            405 | 501 => CmisErrorKind::Unsupported,
            409 => CmisErrorKind::Other("constraint".to_string()),
            _ => CmisErrorKind::Runtime,
        };
        let excerpt: String = body.trim().chars().take(500).collect();
        let message = if excerpt.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {excerpt}")
        };
        Self::new(kind, message)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(CmisErrorKind::ObjectNotFound, msg)
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(CmisErrorKind::InvalidArgument, msg)
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::new(CmisErrorKind::PermissionDenied, msg)
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::new(CmisErrorKind::Runtime, msg)
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::new(CmisErrorKind::Unsupported, msg)
    }

    /// Wire name of the error kind.
    pub fn kind_name(&self) -> &str {
        self.kind.as_str()
    }
}

impl From<reqwest::Error> for CmisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::runtime(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            Self::runtime(format!("Connection failed: {err}"))
        } else {
            Self::runtime(format!("HTTP error: {err}"))
        }
    }
}

impl From<serde_json::Error> for CmisError {
    fn from(err: serde_json::Error) -> Self {
        Self::runtime(format!("JSON error: {err}"))
    }
}

impl From<quick_xml::Error> for CmisError {
    fn from(err: quick_xml::Error) -> Self {
        Self::runtime(format!("XML error: {err}"))
    }
}

impl From<quick_xml::events::attributes::AttrError> for CmisError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::runtime(format!("XML attribute error: {err}"))
    }
}

impl From<url::ParseError> for CmisError {
    fn from(err: url::ParseError) -> Self {
        Self::invalid(format!("URL parse error: {err}"))
    }
}

impl From<std::io::Error> for CmisError {
    fn from(err: std::io::Error) -> Self {
        Self::runtime(format!("I/O error: {err}"))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
