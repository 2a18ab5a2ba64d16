//! Decoded response types.

use serde::{Deserialize, Serialize};

/// Outcome of verifying the signatures on a SAML response.
///
/// Every field is reported independently so partially-signed and
/// partially-valid documents can be inspected rather than collapsed
/// into a single boolean.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Overall verdict: at least one signature present and every
    /// present signature valid.
    pub is_valid: bool,
    /// Whether the `Response` element carries its own signature.
    pub response_signed: bool,
    /// Whether the `Assertion` element carries its own signature.
    pub assertion_signed: bool,
    /// Whether the response signature verified (false when absent).
    pub response_signature_valid: bool,
    /// Whether the assertion signature verified (false when absent).
    pub assertion_signature_valid: bool,
    /// Human-readable failure descriptions, one per problem found.
    pub errors: Vec<String>,
}

/// A parsed and verified SAML response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedSamlResponse {
    /// Subject `NameID` value, if present.
    pub name_id: Option<String>,
    /// Assertion attributes in document order; each name maps to its
    /// values in document order. Duplicate attribute names are merged
    /// into the first occurrence.
    pub attributes: Vec<(String, Vec<String>)>,
    /// The decoded response XML as received.
    pub raw_xml: String,
    /// `InResponseTo` from the response root, if present.
    pub request_id: Option<String>,
    /// RelayState returned alongside the response, if any.
    pub relay_state: Option<String>,
    /// Signature verification outcome.
    pub validation: ValidationResult,
}
