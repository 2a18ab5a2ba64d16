//! HTTP-Redirect binding.
//!
//! SAML 2.0 HTTP-Redirect carries the message in a URL query parameter:
//! raw DEFLATE (no zlib header), base64, then URL-encoding.

use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::{SamlError, SamlResult};

use super::SamlMessageType;

/// Encodes an XML message for the HTTP-Redirect binding.
///
/// Returns the base64 payload (not yet URL-encoded).
pub fn encode_for_redirect(xml: &str) -> SamlResult<String> {
    let compressed = deflate_compress(xml.as_bytes())?;
    Ok(base64::engine::general_purpose::STANDARD.encode(compressed))
}

/// Decodes a request produced by [`encode_for_redirect`]: base64, then
/// raw inflate.
pub fn decode_request(encoded: &str) -> SamlResult<String> {
    let compressed = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    let xml_bytes = deflate_decompress(&compressed)?;
    String::from_utf8(xml_bytes)
        .map_err(|e| SamlError::InvalidRequest(format!("Invalid UTF-8 in message: {e}")))
}

/// Builds the redirect URL for an already-encoded message.
///
/// Appends with `&` when the SSO URL already carries a query string.
#[must_use]
pub fn redirect_url(
    sso_url: &str,
    encoded: &str,
    message_type: SamlMessageType,
    relay_state: Option<&str>,
) -> String {
    let separator = if sso_url.contains('?') { '&' } else { '?' };
    let mut url = format!(
        "{}{}{}={}",
        sso_url,
        separator,
        message_type.form_param(),
        urlencoding::encode(encoded)
    );

    if let Some(rs) = relay_state {
        url.push_str(&format!("&RelayState={}", urlencoding::encode(rs)));
    }

    url
}

/// Extracts the SAML parameters from a redirect URL.
///
/// Returns `(encoded_message, relay_state)` with URL-decoding already
/// applied by the query parser.
pub fn parse_redirect_url(url: &str) -> SamlResult<(String, Option<String>)> {
    let parsed = url::Url::parse(url)
        .map_err(|e| SamlError::InvalidRequest(format!("Invalid URL: {e}")))?;

    let mut message = None;
    let mut relay_state = None;

    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "SAMLRequest" | "SAMLResponse" => message = Some(value.to_string()),
            "RelayState" => relay_state = Some(value.to_string()),
            _ => {}
        }
    }

    let message = message.ok_or_else(|| {
        SamlError::InvalidRequest("No SAMLRequest or SAMLResponse parameter".to_string())
    })?;

    Ok((message, relay_state))
}

/// Compresses data using raw DEFLATE at maximum compression.
fn deflate_compress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(data)
        .map_err(|e| SamlError::Deflate(format!("Compression error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| SamlError::Deflate(format!("Compression finish error: {e}")))
}

/// Decompresses raw DEFLATE data.
fn deflate_decompress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| SamlError::Deflate(format!("Decompression error: {e}")))?;
    Ok(decompressed)
}
