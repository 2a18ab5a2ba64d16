//! SAML response validation.
//!
//! Produces a granular [`ValidationResult`] rather than a pass/fail bool
//! so callers can show exactly which element was signed and whether each
//! signature held up.

use tracing::{debug, warn};

use crate::error::SamlResult;
use crate::signature::{SignatureCheck, XmlSignatureVerifier};
use crate::types::{ServiceProviderConfig, ValidationResult};
use crate::xml::find::first_local;

/// Validates the signatures of a SAML response against the SP's IdP trust.
///
/// At least one of the response and the assertion must carry a valid
/// signature; a document signed nowhere is rejected outright. Errors here
/// are structural (unparseable XML, bad trust anchor PEM); a response that
/// merely fails validation still returns `Ok` with the reasons recorded.
pub fn validate_saml_response(
    xml: &str,
    sp: &ServiceProviderConfig,
) -> SamlResult<ValidationResult> {
    let mut result = ValidationResult::default();

    let Some(certificate) = sp.idp.certificate.as_deref() else {
        warn!(sp_id = %sp.id, "No IdP certificate configured, cannot validate signatures");
        result
            .errors
            .push("No IdP certificate configured".to_string());
        return Ok(result);
    };

    let verifier = XmlSignatureVerifier::from_pem(&[certificate])?;
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();

    let response_check = verifier.check_element(root);
    result.response_signed = response_check.is_signed();
    result.response_signature_valid = response_check.is_valid();
    if let SignatureCheck::Invalid(reason) = &response_check {
        result.errors.push(format!("Response signature: {reason}"));
    }

    let assertion_check = first_local(root, "Assertion")
        .map(|a| verifier.check_element(a))
        .unwrap_or(SignatureCheck::NotSigned);
    result.assertion_signed = assertion_check.is_signed();
    result.assertion_signature_valid = assertion_check.is_valid();
    if let SignatureCheck::Invalid(reason) = &assertion_check {
        result.errors.push(format!("Assertion signature: {reason}"));
    }

    if !response_check.is_signed() && !assertion_check.is_signed() {
        result
            .errors
            .push("Neither the response nor the assertion is signed".to_string());
    }

    result.is_valid = result.errors.is_empty()
        && (response_check.is_valid() || assertion_check.is_valid());

    debug!(
        sp_id = %sp.id,
        is_valid = result.is_valid,
        response_signed = result.response_signed,
        assertion_signed = result.assertion_signed,
        "Validated SAML response"
    );

    Ok(result)
}
