//! Enveloped XML-DSig support.
//!
//! One profile is spoken on both sides: RSA-SHA256 signatures, SHA-256
//! reference digests, exclusive canonicalization, and the
//! enveloped-signature transform. SHA-1 era URIs are rejected during
//! verification rather than grandfathered in.

mod signer;
mod verifier;

pub use signer::*;
pub use verifier::*;

use crate::types::{canonicalization_algorithms, digest_algorithms, signature_algorithms};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256.
    #[default]
    RsaSha256,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
        }
    }

    /// Returns the corresponding digest algorithm URI.
    #[must_use]
    pub const fn digest_uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => digest_algorithms::SHA256,
        }
    }

    /// Parses a signature algorithm from its URI.
    ///
    /// Unknown or deprecated URIs (SHA-1, ECDSA variants) return `None`.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            _ => None,
        }
    }
}

/// Canonicalization algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalizationAlgorithm {
    /// Exclusive C14N without comments.
    #[default]
    ExclusiveC14N,
}

impl CanonicalizationAlgorithm {
    /// Returns the URI for this canonicalization algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::ExclusiveC14N => canonicalization_algorithms::EXCLUSIVE_C14N,
        }
    }

    /// Parses a canonicalization algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            canonicalization_algorithms::EXCLUSIVE_C14N => Some(Self::ExclusiveC14N),
            _ => None,
        }
    }
}

/// Outcome of checking one element for an enveloped signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    /// No signature is a direct child of the element.
    NotSigned,
    /// A signature is present and verified.
    Valid,
    /// A signature is present but failed verification.
    Invalid(String),
}

impl SignatureCheck {
    /// Whether a signature was present at all.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        !matches!(self, Self::NotSigned)
    }

    /// Whether a signature was present and verified.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}
