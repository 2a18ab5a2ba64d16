//! SAML 2.0 service provider protocol engine.
//!
//! Implements the SP side of Web Browser SSO: AuthnRequest construction,
//! the HTTP-Redirect and HTTP-POST bindings, enveloped XML signatures
//! over exclusive canonicalization, response parsing and validation, and
//! the pending-login state that ties a request to its response.
//!
//! [`flow::SpEngine`] is the front door; the submodules are public for
//! callers that need the pieces individually.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod error;
pub mod flow;
pub mod request;
pub mod response;
pub mod signature;
pub mod store;
pub mod types;
pub mod validate;
pub mod xml;

pub use error::{SamlError, SamlResult};
pub use flow::{InitiatedLogin, LoginDispatch, LoginOptions, SpEngine};
pub use types::{
    DecodedSamlResponse, IdentityProviderConfig, NameIdFormat, SamlBinding,
    ServiceProviderConfig, ValidationResult,
};
pub use validate::validate_saml_response;
