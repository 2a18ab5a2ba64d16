//! Cryptographic primitives for the SAML SP simulator.
//!
//! Provides exactly what the protocol engine needs and nothing more:
//!
//! - SHA-256 digests for XML-DSig references
//! - RSA PKCS#1 v1.5 / SHA-256 signing and verification
//! - PEM/DER conversions for keys and certificates
//! - Self-signed signing material generation for new service providers
//! - Base-36 message ID generation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod hash;
pub mod keygen;
pub mod pem;
pub mod random;
pub mod signature;

pub use error::{CryptoError, CryptoResult};
pub use hash::sha256;
pub use keygen::{generate_signing_material, SigningMaterial};
pub use signature::{rsa_sha256_sign, rsa_sha256_verify};
