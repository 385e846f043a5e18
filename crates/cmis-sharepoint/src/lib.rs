//! # CMIS over SharePoint
//!
//! Exposes a SharePoint web through its REST API (`…/_api/Web`) with
//! OData verbose JSON.
//!
//! - Object ids are resource URIs (`__metadata.uri`)
//! - `SP.Folder` maps to `cmis:folder`, `SP.File` to `cmis:document`
//! - Modifying requests carry a form digest fetched from `contextinfo`
//! - Check-out, check-in and version history use the native file API
//!
//! Requests are authenticated with OAuth2 bearer tokens when OAuth2
//! settings are given, with the session credentials otherwise.

pub mod utils;
pub mod session;
pub mod object;
pub mod folder;
pub mod document;

#[cfg(test)]
mod fixtures;

pub use document::SharePointDocument;
pub use folder::SharePointFolder;
pub use session::{SharePointContext, SharePointSession};
pub use utils::{to_cmis_key, to_sharepoint_key};
