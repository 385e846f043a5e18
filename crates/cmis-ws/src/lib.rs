//! # CMIS Web Services Binding
//!
//! CMIS over SOAP 1.1.
//!
//! ## Features
//!
//! - **Discovery** – WSDL download (with the `?wsdl` retry) and service
//!   endpoint map
//! - **Envelopes** – SOAP 1.1 requests with a WS-Security UsernameToken
//!   header, `cmisFault` mapping onto the error kinds
//! - **Services** – RepositoryService, ObjectService, NavigationService and
//!   VersioningService calls
//! - **Content** – MTOM/XOP multipart answers and inline base64 streams

pub mod wsdl;
pub mod mtom;
pub mod soap;
pub mod services;
pub mod object;
pub mod folder;
pub mod document;
pub mod session;

#[cfg(test)]
mod fixtures;

pub use document::WsDocument;
pub use folder::WsFolder;
pub use object::WsObject;
pub use services::WsContext;
pub use session::WsSession;
pub use soap::{SoapClient, SoapRequest, SoapResponse};
pub use wsdl::{fetch_wsdl, ServiceMap};
