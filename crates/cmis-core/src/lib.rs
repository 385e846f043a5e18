//! # CMIS Core
//!
//! Binding-independent half of the CMIS client.
//!
//! ## Features
//!
//! - **Object model** – `CmisObject`, `Folder`, `Document` capability traits
//!   with per-object lazy property, type and allowable-action caches
//! - **Properties** – typed multi-valued values with canonical string forms
//!   and `cmis:propertyXxx` XML marshalling
//! - **Types & repositories** – type definitions resolved lazily by id,
//!   repository descriptions and capabilities
//! - **HTTP** – pluggable blocking transport, Basic auth, OAuth2 bearer
//!   tokens with one refresh-and-retry on 401
//! - **OAuth2** – authorization-code grant with pluggable authorization flows
//! - **Testing** – in-memory mock transport

pub mod error;
pub mod xml;
pub mod property;
pub mod allowable_actions;
pub mod object_type;
pub mod repository;
pub mod object;
pub mod session;
pub mod http;
pub mod oauth2;
pub mod json;
pub mod testing;

pub use allowable_actions::{AllowableActions, ObjectAction};
pub use error::{CmisError, CmisErrorKind, CmisResult};
pub use http::{
    encode_component, HttpRequest, HttpResponse, HttpSession, HttpTransport, ReqwestTransport,
    TokenPlacement,
};
pub use oauth2::{AuthorizationFlow, FormScrapingFlow, OAuth2Data, OAuth2Handler, StaticCodeFlow};
pub use object::{
    CmisObject, ContentHolder, ContentStream, Document, DocumentPtr, Fileable, Folder, FolderPtr,
    ObjectCore, ObjectPtr, UnfileObjects, Versionable,
};
pub use object_type::{BaseType, ContentStreamAllowed, LocalTypes, ObjectType, TypeResolver};
pub use property::{Property, PropertyKind, PropertyMap, PropertyType, PropertyValues};
pub use repository::Repository;
pub use session::Session;
