//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material could not be parsed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Signing operation failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// PEM armor is missing or malformed.
    #[error("invalid PEM: {0}")]
    Pem(String),

    /// Key generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Certificate parsing or creation failed.
    #[error("certificate error: {0}")]
    Certificate(String),
}
