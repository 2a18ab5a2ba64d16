//! HTTP-POST binding.
//!
//! POST messages are base64 over the raw UTF-8 XML bytes; there is no
//! compression in this binding.

use base64::Engine;

use crate::error::{SamlError, SamlResult};

use super::SamlMessageType;

/// Encodes an XML message for the HTTP-POST binding.
#[must_use]
pub fn encode_for_post(xml: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(xml)
}

/// Decodes a SAML response delivered via HTTP-POST.
///
/// This is base64-only: a conformant IdP never compresses a POST
/// response, and a compressed payload here decodes to binary garbage
/// that fails UTF-8 validation rather than being silently inflated.
pub fn decode_response(encoded: &str) -> SamlResult<String> {
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    String::from_utf8(decoded)
        .map_err(|e| SamlError::InvalidResponse(format!("Invalid UTF-8 in message: {e}")))
}

/// Builds the form fields for a POST dispatch.
///
/// Returns `(name, value)` pairs ready to render as hidden inputs.
#[must_use]
pub fn post_form_fields(
    encoded: &str,
    message_type: SamlMessageType,
    relay_state: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut fields = vec![(message_type.form_param(), encoded.to_string())];
    if let Some(rs) = relay_state {
        fields.push(("RelayState", rs.to_string()));
    }
    fields
}
