//! Enveloped XML signature verification.
//!
//! Verification only accepts a `<ds:Signature>` that is a direct child of
//! the element under test. Signatures elsewhere in the document never
//! vouch for it, which defeats signature-wrapping payloads that move a
//! valid signature next to attacker-controlled content.

use base64::Engine;
use roxmltree::Node;

use crate::error::{SamlError, SamlResult};
use crate::types::ENVELOPED_SIGNATURE;
use crate::xml::c14n::canonicalize_subtree;
use crate::xml::find::{base64_text, dsig_child, first_dsig};

use super::{CanonicalizationAlgorithm, SignatureAlgorithm, SignatureCheck};

/// XML signature verifier holding the trust anchors for one IdP.
pub struct XmlSignatureVerifier {
    /// Trusted X.509 certificates in DER format.
    trusted_certificates: Vec<Vec<u8>>,
}

impl XmlSignatureVerifier {
    /// Creates a verifier from DER certificates.
    #[must_use]
    pub fn new(trusted_certificates: Vec<Vec<u8>>) -> Self {
        Self {
            trusted_certificates,
        }
    }

    /// Creates a verifier from PEM certificates.
    pub fn from_pem<S: AsRef<str>>(certificate_pems: &[S]) -> SamlResult<Self> {
        let trusted_certificates = certificate_pems
            .iter()
            .map(|pem| spsim_crypto::pem::certificate_to_der(pem.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SamlError::Crypto(e.to_string()))?;

        Ok(Self::new(trusted_certificates))
    }

    /// Checks the enveloped signature of one element.
    ///
    /// Returns [`SignatureCheck::NotSigned`] when the element carries no
    /// direct-child signature at all; presence without validity is always
    /// [`SignatureCheck::Invalid`] with the reason.
    #[must_use]
    pub fn check_element(&self, target: Node<'_, '_>) -> SignatureCheck {
        let Some(signature) = dsig_child(target, "Signature") else {
            return SignatureCheck::NotSigned;
        };

        match self.verify_signature(target, signature) {
            Ok(()) => SignatureCheck::Valid,
            Err(reason) => SignatureCheck::Invalid(reason),
        }
    }

    fn verify_signature(&self, target: Node<'_, '_>, signature: Node<'_, '_>) -> Result<(), String> {
        let signed_info =
            dsig_child(signature, "SignedInfo").ok_or("SignedInfo element missing")?;

        let c14n_uri = dsig_child(signed_info, "CanonicalizationMethod")
            .and_then(|n| n.attribute("Algorithm"))
            .ok_or("CanonicalizationMethod missing")?;
        CanonicalizationAlgorithm::from_uri(c14n_uri)
            .ok_or_else(|| format!("Unsupported canonicalization algorithm: {c14n_uri}"))?;

        let sig_uri = dsig_child(signed_info, "SignatureMethod")
            .and_then(|n| n.attribute("Algorithm"))
            .ok_or("SignatureMethod missing")?;
        let algorithm = SignatureAlgorithm::from_uri(sig_uri)
            .ok_or_else(|| format!("Unsupported signature algorithm: {sig_uri}"))?;

        let reference = dsig_child(signed_info, "Reference").ok_or("Reference missing")?;
        self.verify_reference(target, signature, reference, algorithm)?;

        // The signature covers SignedInfo, canonicalized the same way as
        // when it was produced.
        let canonical_signed_info = canonicalize_subtree(signed_info, None);

        let signature_b64 = dsig_child(signature, "SignatureValue")
            .map(base64_text)
            .ok_or("SignatureValue missing")?;
        let signature_bytes = base64::engine::general_purpose::STANDARD
            .decode(&signature_b64)
            .map_err(|e| format!("SignatureValue is not valid base64: {e}"))?;

        let certificate = self.select_certificate(signature)?;
        let public_key = spsim_crypto::pem::public_key_from_cert_der(&certificate)
            .map_err(|e| e.to_string())?;

        let valid = spsim_crypto::rsa_sha256_verify(
            &public_key,
            canonical_signed_info.as_bytes(),
            &signature_bytes,
        )
        .map_err(|e| e.to_string())?;

        if valid {
            Ok(())
        } else {
            Err("Signature value does not verify against SignedInfo".to_string())
        }
    }

    fn verify_reference(
        &self,
        target: Node<'_, '_>,
        signature: Node<'_, '_>,
        reference: Node<'_, '_>,
        algorithm: SignatureAlgorithm,
    ) -> Result<(), String> {
        let target_id = target
            .attribute("ID")
            .or_else(|| target.attribute("Id"))
            .ok_or("Signed element has no ID attribute")?;

        let uri = reference.attribute("URI").ok_or("Reference URI missing")?;
        if uri.strip_prefix('#') != Some(target_id) {
            return Err(format!(
                "Reference URI '{uri}' does not point at the signed element"
            ));
        }

        if let Some(transforms) = first_dsig(reference, "Transforms") {
            for transform in transforms.children().filter(|n| n.is_element()) {
                let transform_uri = transform
                    .attribute("Algorithm")
                    .ok_or("Transform algorithm missing")?;
                if transform_uri != ENVELOPED_SIGNATURE
                    && CanonicalizationAlgorithm::from_uri(transform_uri).is_none()
                {
                    return Err(format!("Unsupported transform: {transform_uri}"));
                }
            }
        }

        let digest_uri = first_dsig(reference, "DigestMethod")
            .and_then(|n| n.attribute("Algorithm"))
            .ok_or("DigestMethod missing")?;
        if digest_uri != algorithm.digest_uri() {
            return Err(format!("Unsupported digest algorithm: {digest_uri}"));
        }

        let expected_digest = first_dsig(reference, "DigestValue")
            .map(base64_text)
            .ok_or("DigestValue missing")?;
        let expected_digest = base64::engine::general_purpose::STANDARD
            .decode(&expected_digest)
            .map_err(|e| format!("DigestValue is not valid base64: {e}"))?;

        // Enveloped transform plus exclusive C14N: canonicalize the target
        // with the signature subtree removed.
        let canonical = canonicalize_subtree(target, Some(signature.id()));
        let actual_digest = spsim_crypto::sha256(canonical.as_bytes());

        if actual_digest != expected_digest {
            return Err("Digest mismatch for signed element".to_string());
        }
        Ok(())
    }

    /// Picks the certificate to verify against.
    ///
    /// An embedded `KeyInfo` certificate is only honored when it matches a
    /// trust anchor, or when no anchors are configured at all. Otherwise
    /// the first anchor is used directly.
    fn select_certificate(&self, signature: Node<'_, '_>) -> Result<Vec<u8>, String> {
        let embedded = first_dsig(signature, "X509Certificate")
            .map(base64_text)
            .map(|b64| {
                base64::engine::general_purpose::STANDARD
                    .decode(&b64)
                    .map_err(|e| format!("Embedded certificate is not valid base64: {e}"))
            })
            .transpose()?;

        match (embedded, self.trusted_certificates.is_empty()) {
            (Some(cert), true) => Ok(cert),
            (Some(cert), false) => {
                if self.trusted_certificates.contains(&cert) {
                    Ok(cert)
                } else {
                    Err("Embedded certificate does not match any trust anchor".to_string())
                }
            }
            (None, false) => Ok(self.trusted_certificates[0].clone()),
            (None, true) => Err("No certificate available for verification".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::XmlSigner;

    fn material() -> &'static spsim_crypto::SigningMaterial {
        use std::sync::OnceLock;
        static MATERIAL: OnceLock<spsim_crypto::SigningMaterial> = OnceLock::new();
        MATERIAL.get_or_init(|| {
            spsim_crypto::generate_signing_material("verifier.example.com").unwrap()
        })
    }

    fn signed_doc() -> String {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_resp1"><saml:Issuer>https://idp.example.com</saml:Issuer><samlp:Status/></samlp:Response>"#;
        let signer =
            XmlSigner::from_pem(&material().private_key_pem, Some(material().certificate_pem.as_str()))
                .unwrap();
        signer.sign(xml, "_resp1").unwrap()
    }

    #[test]
    fn signed_document_verifies() {
        let signed = signed_doc();
        let doc = roxmltree::Document::parse(&signed).unwrap();
        let verifier = XmlSignatureVerifier::from_pem(&[&material().certificate_pem]).unwrap();

        assert_eq!(
            verifier.check_element(doc.root_element()),
            SignatureCheck::Valid
        );
    }

    #[test]
    fn unsigned_element_reports_not_signed() {
        let xml = r#"<Doc ID="_u1"><Child/></Doc>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let verifier = XmlSignatureVerifier::from_pem(&[&material().certificate_pem]).unwrap();

        assert_eq!(
            verifier.check_element(doc.root_element()),
            SignatureCheck::NotSigned
        );
    }

    #[test]
    fn non_dsig_signature_child_is_ignored() {
        let xml = r#"<Doc ID="_u2"><Signature>impostor</Signature></Doc>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let verifier = XmlSignatureVerifier::new(Vec::new());

        assert_eq!(
            verifier.check_element(doc.root_element()),
            SignatureCheck::NotSigned
        );
    }

    #[test]
    fn tampered_content_fails_digest() {
        let signed = signed_doc().replace("https://idp.example.com", "https://evil.example.com");
        let doc = roxmltree::Document::parse(&signed).unwrap();
        let verifier = XmlSignatureVerifier::from_pem(&[&material().certificate_pem]).unwrap();

        match verifier.check_element(doc.root_element()) {
            SignatureCheck::Invalid(reason) => assert!(reason.contains("Digest")),
            other => panic!("expected digest failure, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_transform_is_rejected() {
        let signed = signed_doc().replace(
            "http://www.w3.org/2000/09/xmldsig#enveloped-signature",
            "http://www.w3.org/TR/1999/REC-xslt-19991116",
        );
        let doc = roxmltree::Document::parse(&signed).unwrap();
        let verifier = XmlSignatureVerifier::from_pem(&[&material().certificate_pem]).unwrap();

        match verifier.check_element(doc.root_element()) {
            SignatureCheck::Invalid(reason) => assert!(reason.contains("transform")),
            other => panic!("expected transform rejection, got {other:?}"),
        }
    }

    #[test]
    fn untrusted_signer_is_rejected() {
        let signed = signed_doc();
        let doc = roxmltree::Document::parse(&signed).unwrap();
        let other = spsim_crypto::generate_signing_material("other.example.com").unwrap();
        let verifier = XmlSignatureVerifier::from_pem(&[&other.certificate_pem]).unwrap();

        match verifier.check_element(doc.root_element()) {
            SignatureCheck::Invalid(reason) => assert!(reason.contains("trust anchor")),
            other => panic!("expected trust failure, got {other:?}"),
        }
    }

    #[test]
    fn signature_elsewhere_does_not_vouch() {
        // A valid signature on the response must not count for the
        // assertion nested inside it.
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_outer"><saml:Issuer>idp</saml:Issuer><saml:Assertion ID="_inner"><saml:Issuer>idp</saml:Issuer></saml:Assertion></samlp:Response>"#;
        let signer =
            XmlSigner::from_pem(&material().private_key_pem, Some(material().certificate_pem.as_str()))
                .unwrap();
        let signed = signer.sign(xml, "_outer").unwrap();
        let doc = roxmltree::Document::parse(&signed).unwrap();
        let verifier = XmlSignatureVerifier::from_pem(&[&material().certificate_pem]).unwrap();

        let assertion = crate::xml::find::first_local(doc.root(), "Assertion").unwrap();
        assert_eq!(verifier.check_element(assertion), SignatureCheck::NotSigned);
        assert_eq!(
            verifier.check_element(doc.root_element()),
            SignatureCheck::Valid
        );
    }
}
