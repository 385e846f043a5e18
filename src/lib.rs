//! # CMIS
//!
//! Client for Content Management Interoperability Services repositories.
//!
//! ## Features
//!
//! - **AtomPub** – service document discovery, URI templates, link-driven
//!   navigation ([`atom`])
//! - **Web Services** – WSDL discovery and SOAP 1.1 calls with WS-Security
//!   ([`ws`])
//! - **Google Drive, OneDrive, SharePoint** – vendor REST APIs mapped onto
//!   the same object model ([`gdrive`], [`onedrive`], [`sharepoint`])
//! - **One object model** – folders, documents, versioning, types and
//!   properties behave the same whatever the binding ([`core`])
//!
//! ```no_run
//! use cmis::{create_session, SessionParams};
//!
//! let params = SessionParams::new("http://localhost:8080/inmemory/atom")
//!     .with_credentials("admin", "admin");
//! let session = create_session(&params)?;
//! for child in session.get_root_folder()?.get_children()? {
//!     println!("{}", child.name());
//! }
//! # Ok::<(), cmis::CmisError>(())
//! ```

pub mod params;
pub mod factory;

pub use cmis_atom as atom;
pub use cmis_core as core;
pub use cmis_gdrive as gdrive;
pub use cmis_onedrive as onedrive;
pub use cmis_sharepoint as sharepoint;
pub use cmis_ws as ws;

pub use cmis_core::{
    AllowableActions, CmisError, CmisErrorKind, CmisObject, CmisResult, ContentHolder, Document,
    DocumentPtr, Fileable, Folder, FolderPtr, OAuth2Data, ObjectAction, ObjectPtr, ObjectType,
    Property, PropertyMap, Repository, Session, UnfileObjects, Versionable,
};
pub use factory::{create_session, create_session_with, get_repositories, get_repositories_with};
pub use params::{BindingKind, SessionParams};
