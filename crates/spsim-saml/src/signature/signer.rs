//! Enveloped XML signature creation.
//!
//! Two-phase signing: the digest and signature values are computed over
//! canonicalized forms of the parsed document, then the final document is
//! assembled by splicing the `<ds:Signature>` element in immediately
//! after the target's `Issuer`. The input is never mutated in place.

use base64::Engine;

use crate::error::{SamlError, SamlResult};
use crate::types::ENVELOPED_SIGNATURE;
use crate::xml::c14n::canonicalize_subtree;

use super::SignatureAlgorithm;

/// XML document signer.
pub struct XmlSigner {
    /// The private key in DER format.
    private_key_der: Vec<u8>,
    /// The X.509 certificate in DER format, embedded as `KeyInfo` when set.
    certificate_der: Option<Vec<u8>>,
}

impl XmlSigner {
    /// Creates a new signer from DER key material.
    #[must_use]
    pub fn new(private_key_der: Vec<u8>, certificate_der: Option<Vec<u8>>) -> Self {
        Self {
            private_key_der,
            certificate_der,
        }
    }

    /// Creates a new signer from PEM-encoded key and certificate.
    pub fn from_pem(private_key_pem: &str, certificate_pem: Option<&str>) -> SamlResult<Self> {
        let private_key_der = spsim_crypto::pem::private_key_to_der(private_key_pem)
            .map_err(|e| SamlError::Crypto(e.to_string()))?;

        let certificate_der = certificate_pem
            .map(spsim_crypto::pem::certificate_to_der)
            .transpose()
            .map_err(|e| SamlError::Crypto(e.to_string()))?;

        Ok(Self::new(private_key_der, certificate_der))
    }

    /// Signs the element carrying the given ID inside an XML document.
    ///
    /// # Arguments
    ///
    /// * `xml` - The XML document to sign
    /// * `reference_id` - The ID of the element to sign (without the '#' prefix)
    ///
    /// # Returns
    ///
    /// The document with a `<ds:Signature>` inserted into the referenced
    /// element. Any failure is reported as [`SamlError::SignatureCreation`];
    /// there is no fallback to returning the unsigned input.
    pub fn sign(&self, xml: &str, reference_id: &str) -> SamlResult<String> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| SamlError::SignatureCreation(format!("Unparseable input: {e}")))?;

        let target = doc
            .descendants()
            .find(|n| {
                n.is_element()
                    && (n.attribute("ID") == Some(reference_id)
                        || n.attribute("Id") == Some(reference_id))
            })
            .ok_or_else(|| {
                SamlError::SignatureCreation(format!(
                    "Element with ID '{reference_id}' not found"
                ))
            })?;

        // Digest over the canonicalized unsigned target. The enveloped
        // transform removes the signature we are about to insert, so the
        // digest of the final document equals this one.
        let canonical_target = canonicalize_subtree(target, None);
        let digest = spsim_crypto::sha256(canonical_target.as_bytes());
        let digest_b64 = base64::engine::general_purpose::STANDARD.encode(digest);

        let signed_info = build_signed_info(reference_id, &digest_b64);

        // SignedInfo is canonicalized standalone; exclusive C14N re-emits
        // the ds declaration on it, so the verifier sees identical bytes.
        let si_doc = roxmltree::Document::parse(&signed_info)
            .map_err(|e| SamlError::SignatureCreation(format!("SignedInfo assembly: {e}")))?;
        let canonical_signed_info = canonicalize_subtree(si_doc.root_element(), None);

        let signature_value =
            spsim_crypto::rsa_sha256_sign(&self.private_key_der, canonical_signed_info.as_bytes())
                .map_err(|e| SamlError::SignatureCreation(format!("RSA signing failed: {e}")))?;
        let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature_value);

        let signature_element =
            build_signature_element(&signed_info, &signature_b64, self.certificate_der.as_deref());

        let insert_position = find_insert_position(xml, reference_id)?;
        Ok(insert_signature(xml, insert_position, &signature_element))
    }
}

/// Builds the SignedInfo element.
fn build_signed_info(reference_id: &str, digest_b64: &str) -> String {
    let algorithm = SignatureAlgorithm::RsaSha256;
    format!(
        r##"<ds:SignedInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
<ds:CanonicalizationMethod Algorithm="{}"/>
<ds:SignatureMethod Algorithm="{}"/>
<ds:Reference URI="#{}">
<ds:Transforms>
<ds:Transform Algorithm="{}"/>
<ds:Transform Algorithm="{}"/>
</ds:Transforms>
<ds:DigestMethod Algorithm="{}"/>
<ds:DigestValue>{}</ds:DigestValue>
</ds:Reference>
</ds:SignedInfo>"##,
        super::CanonicalizationAlgorithm::ExclusiveC14N.uri(),
        algorithm.uri(),
        reference_id,
        ENVELOPED_SIGNATURE,
        super::CanonicalizationAlgorithm::ExclusiveC14N.uri(),
        algorithm.digest_uri(),
        digest_b64
    )
}

/// Builds the complete Signature element.
fn build_signature_element(
    signed_info: &str,
    signature_value: &str,
    certificate_der: Option<&[u8]>,
) -> String {
    let mut signature = format!(
        r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
{signed_info}
<ds:SignatureValue>{signature_value}</ds:SignatureValue>"#
    );

    if let Some(cert) = certificate_der {
        let cert_b64 = base64::engine::general_purpose::STANDARD.encode(cert);
        signature.push_str(&format!(
            r#"
<ds:KeyInfo>
<ds:X509Data>
<ds:X509Certificate>{cert_b64}</ds:X509Certificate>
</ds:X509Data>
</ds:KeyInfo>"#
        ));
    }

    signature.push_str("\n</ds:Signature>");
    signature
}

/// Finds the byte offset at which to splice the signature: immediately
/// after the target element's `Issuer`, or after the opening tag when no
/// `Issuer` is present.
fn find_insert_position(xml: &str, reference_id: &str) -> SamlResult<usize> {
    let id_pattern = format!("ID=\"{reference_id}\"");
    let alt_pattern = format!("Id=\"{reference_id}\"");

    let id_pos = xml
        .find(&id_pattern)
        .or_else(|| xml.find(&alt_pattern))
        .ok_or_else(|| {
            SamlError::SignatureCreation(format!("Element with ID '{reference_id}' not found"))
        })?;

    let tag_end = xml[id_pos..]
        .find('>')
        .map(|pos| id_pos + pos + 1)
        .ok_or_else(|| SamlError::SignatureCreation("Malformed XML element".to_string()))?;

    Ok(find_issuer_end(xml, tag_end).unwrap_or(tag_end))
}

/// Finds the end of the first Issuer element after the given position.
fn find_issuer_end(xml: &str, after: usize) -> Option<usize> {
    let search_area = &xml[after..];

    for pattern in &["</saml:Issuer>", "</Issuer>", "</saml2:Issuer>"] {
        if let Some(pos) = search_area.find(pattern) {
            return Some(after + pos + pattern.len());
        }
    }
    None
}

/// Inserts the signature into the XML document.
fn insert_signature(xml: &str, position: usize, signature: &str) -> String {
    format!("{}{}{}", &xml[..position], signature, &xml[position..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_info_names_the_full_profile() {
        let si = build_signed_info("_abc", "ZGlnZXN0");
        assert!(si.contains(r##"URI="#_abc""##));
        assert!(si.contains("http://www.w3.org/2001/10/xml-exc-c14n#"));
        assert!(si.contains("http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"));
        assert!(si.contains("http://www.w3.org/2000/09/xmldsig#enveloped-signature"));
        assert!(si.contains("http://www.w3.org/2001/04/xmlenc#sha256"));
        assert!(si.contains("<ds:DigestValue>ZGlnZXN0</ds:DigestValue>"));
    }

    #[test]
    fn signature_lands_after_issuer() {
        let xml = r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_r1"><saml:Issuer>sp</saml:Issuer><samlp:NameIDPolicy/></samlp:AuthnRequest>"#;
        let pos = find_insert_position(xml, "_r1").unwrap();
        assert_eq!(&xml[pos - "</saml:Issuer>".len()..pos], "</saml:Issuer>");

        let spliced = insert_signature(xml, pos, "<ds:Signature/>");
        assert!(spliced.contains("</saml:Issuer><ds:Signature/><samlp:NameIDPolicy/>"));
    }

    #[test]
    fn insert_falls_back_to_opening_tag_without_issuer() {
        let xml = r#"<Doc ID="_r2"><Child/></Doc>"#;
        let pos = find_insert_position(xml, "_r2").unwrap();
        assert_eq!(pos, xml.find('>').unwrap() + 1);
    }

    #[test]
    fn signing_unknown_reference_fails() {
        let signer = XmlSigner::new(vec![1, 2, 3], None);
        let err = signer.sign(r#"<Doc ID="_present"/>"#, "_missing");
        assert!(matches!(err, Err(SamlError::SignatureCreation(_))));
    }

    #[test]
    fn signing_with_garbage_key_propagates_error() {
        let signer = XmlSigner::new(b"not a key".to_vec(), None);
        let err = signer.sign(r#"<Doc ID="_r3"><Issuer>x</Issuer></Doc>"#, "_r3");
        assert!(matches!(err, Err(SamlError::SignatureCreation(_))));
    }
}
