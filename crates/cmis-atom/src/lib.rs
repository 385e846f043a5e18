//! # CMIS AtomPub Binding
//!
//! CMIS over the Atom Publishing Protocol.
//!
//! ## Features
//!
//! - **Discovery** – service document workspaces, collections and URI templates
//! - **Navigation** – objects follow the links of their own Atom entries
//!   (`down`, `up`, `self`, `edit-media`, `version-history`, …)
//! - **Content** – streamed downloads with `Content-Transfer-Encoding`
//!   decoding, base64 `cmisra:content` uploads
//! - **Versioning** – check-out through the checkedout collection, check-in
//!   by PUT on the private working copy

pub mod uri_template;
pub mod transfer;
pub mod workspace;
pub mod entry;
pub mod object;
pub mod folder;
pub mod document;
pub mod session;

#[cfg(test)]
mod fixtures;

pub use document::AtomDocument;
pub use folder::AtomFolder;
pub use object::AtomObject;
pub use session::AtomSession;
pub use transfer::{Base64Encoder, TransferDecoder, TransferEncoding};
pub use uri_template::{create_url, UriTemplate};
pub use workspace::{AtomWorkspace, Collection, UriTemplateKind};
