//! # CMIS over OneDrive
//!
//! Exposes a OneDrive (Live Connect v5) account through the CMIS object
//! model. The access token travels as the `access_token` query parameter.
//!
//! Folders and albums map to `cmis:folder`, every other item to
//! `cmis:document`. Listings carry complete items, so children are built
//! without extra round trips. Versioning is not available.

pub mod utils;
pub mod session;
pub mod object;
pub mod folder;
pub mod document;

#[cfg(test)]
mod fixtures;

pub use document::OneDriveDocument;
pub use folder::OneDriveFolder;
pub use session::{OneDriveContext, OneDriveSession, DEFAULT_BASE_URL};
pub use utils::{to_cmis_key, to_onedrive_key};
