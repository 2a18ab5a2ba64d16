//! SAML binding codec.
//!
//! Implements the two transport encodings the simulator speaks:
//!
//! - **HTTP-Redirect** - requests are raw-DEFLATE compressed, base64
//!   encoded, then URL-encoded into a GET query string
//! - **HTTP-POST** - messages are base64 encoded into form fields
//!
//! Responses arrive exclusively via HTTP-POST, so response decoding is
//! base64-only and never inflates.

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

/// SAML message type for binding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// AuthnRequest message.
    Request,
    /// Response message.
    Response,
}

impl SamlMessageType {
    /// Returns the form/query parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}
