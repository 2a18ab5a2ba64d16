//! Signing material generation.
//!
//! Generates a fresh 2048-bit RSA keypair and a matching self-signed
//! certificate so a service provider record can be created without any
//! external tooling. The certificate exists only so IdPs that insist on
//! `KeyInfo` have something to pin; nothing validates its chain.

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;

use crate::error::{CryptoError, CryptoResult};

const RSA_BITS: usize = 2048;

/// Generated signing material as PEM strings.
#[derive(Debug, Clone)]
pub struct SigningMaterial {
    /// PKCS#8 private key PEM.
    pub private_key_pem: String,
    /// Self-signed X.509 certificate PEM.
    pub certificate_pem: String,
}

/// Generates an RSA keypair and a self-signed certificate.
///
/// # Arguments
///
/// * `common_name` - The subject CN for the certificate
///
/// # Errors
///
/// Returns an error if key generation or certificate assembly fails.
pub fn generate_signing_material(common_name: &str) -> CryptoResult<SigningMaterial> {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, RSA_BITS)
        .map_err(|e| CryptoError::KeyGeneration(format!("RSA generation failed: {e}")))?;

    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyGeneration(format!("PKCS#8 encoding failed: {e}")))?
        .to_string();

    let key_pair = KeyPair::from_pem(&private_key_pem)
        .map_err(|e| CryptoError::Certificate(format!("Key import failed: {e}")))?;

    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);

    let certificate = params
        .self_signed(&key_pair)
        .map_err(|e| CryptoError::Certificate(format!("Self-signing failed: {e}")))?;

    Ok(SigningMaterial {
        private_key_pem,
        certificate_pem: certificate.pem(),
    })
}
