//! RSA PKCS#1 v1.5 signatures with SHA-256.
//!
//! The XML-DSig profile used by the vast majority of deployed IdPs signs
//! with `rsa-sha256`, so that is the only algorithm this module speaks.

use aws_lc_rs::{
    rand::SystemRandom,
    signature::{self, RsaKeyPair, UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA256},
};

use crate::error::{CryptoError, CryptoResult};

/// Signs data with RSA PKCS#1 v1.5 / SHA-256.
///
/// # Arguments
///
/// * `key_der` - RSA private key in DER format (PKCS#1 or PKCS#8)
/// * `data` - Data to sign
///
/// # Errors
///
/// Returns an error if the key cannot be parsed or signing fails.
pub fn rsa_sha256_sign(key_der: &[u8], data: &[u8]) -> CryptoResult<Vec<u8>> {
    let key_pair = RsaKeyPair::from_der(key_der)
        .or_else(|_| RsaKeyPair::from_pkcs8(key_der))
        .map_err(|e| CryptoError::InvalidKey(format!("Invalid RSA key: {e}")))?;

    let rng = SystemRandom::new();
    let mut sig = vec![0u8; key_pair.public_modulus_len()];

    key_pair
        .sign(&signature::RSA_PKCS1_SHA256, &rng, data, &mut sig)
        .map_err(|e| CryptoError::Signing(format!("RSA signing failed: {e}")))?;

    Ok(sig)
}

/// Verifies an RSA PKCS#1 v1.5 / SHA-256 signature.
///
/// # Arguments
///
/// * `public_key_der` - RSA public key in DER format (`SubjectPublicKeyInfo`)
/// * `data` - Original data that was signed
/// * `sig` - Signature to verify
///
/// A bad signature is not an error; it returns `Ok(false)`.
pub fn rsa_sha256_verify(public_key_der: &[u8], data: &[u8], sig: &[u8]) -> CryptoResult<bool> {
    let public_key = UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, public_key_der);

    match public_key.verify(data, sig) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}
