//! Digest functions.
//!
//! The SAML 2.0 signature profile this crate targets standardizes on
//! SHA-256 for both the reference digest and the signature method.

use aws_lc_rs::digest;

/// Computes a SHA-256 hash of the input data.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    digest::digest(&digest::SHA256, data).as_ref().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_produces_correct_length() {
        let result = sha256(b"test");
        assert_eq!(result.len(), 32);
    }

    #[test]
    fn sha256_known_value() {
        // SHA-256("abc")
        let result = sha256(b"abc");
        assert_eq!(
            result[..4],
            [0xba, 0x78, 0x16, 0xbf],
        );
    }

    #[test]
    fn different_inputs_produce_different_hashes() {
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }
}
