//! SAML error types.
//!
//! Covers the failure surface of the engine: binding codec errors, XML
//! parsing, signature creation, and relay/correlation store lookups.
//! Signature verification failures are not errors; they are reported
//! through `ValidationResult`.

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Invalid SAML request format or content.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid SAML response format or content.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// XML signature creation failed.
    #[error("signature creation failed: {0}")]
    SignatureCreation(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// Deflate compression or decompression error.
    #[error("deflate error: {0}")]
    Deflate(String),

    /// Pending login session not found.
    #[error("session not found")]
    SessionNotFound,

    /// Pending login session expired before it was consumed.
    #[error("session expired")]
    SessionExpired,

    /// Cryptographic operation error.
    #[error("crypto error: {0}")]
    Crypto(String),
}

impl From<roxmltree::Error> for SamlError {
    fn from(err: roxmltree::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}

impl From<std::io::Error> for SamlError {
    fn from(err: std::io::Error) -> Self {
        Self::Deflate(err.to_string())
    }
}

impl From<spsim_crypto::CryptoError> for SamlError {
    fn from(err: spsim_crypto::CryptoError) -> Self {
        Self::Crypto(err.to_string())
    }
}
