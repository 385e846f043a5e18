//! # CMIS over Google Drive
//!
//! Exposes a Google Drive account through the CMIS object model.
//!
//! ## Features
//!
//! - **Session** – OAuth2 authentication, a single fixed repository rooted at
//!   the `root` alias, local `cmis:document` / `cmis:folder` types
//! - **Objects** – files and folders discriminated by the Drive folder MIME
//!   type, Drive keys translated to CMIS property ids and back
//! - **Navigation** – `/children` and `/parents` listings, path lookup by title
//! - **Content** – download or export links, media uploads with conversion
//!   for Google Docs formats
//!
//! Drive has no checkout model: versioning operations fail with
//! `notSupported`.

pub mod utils;
pub mod session;
pub mod object;
pub mod folder;
pub mod document;

#[cfg(test)]
mod fixtures;

pub use document::GDriveDocument;
pub use folder::GDriveFolder;
pub use session::{GDriveContext, GDriveSession, DEFAULT_BASE_URL, UPLOAD_URL};
pub use utils::{to_cmis_key, to_gdrive_key, FOLDER_MIME_TYPE};
