//! SAML response parsing.
//!
//! Extraction is deliberately lenient about namespace prefixes and
//! structure; trust decisions live in the validation layer, not here.

use crate::error::{SamlError, SamlResult};
use crate::xml::find::{all_local, first_local, node_text};

/// Content extracted from a SAML response document.
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    /// Subject NameID, when present.
    pub name_id: Option<String>,
    /// Assertion attributes in document order. Values of duplicate
    /// attribute names are merged under the first occurrence.
    pub attributes: Vec<(String, Vec<String>)>,
    /// `InResponseTo` from the response root, when present.
    pub request_id: Option<String>,
}

/// Parses a SAML response document and extracts subject and attributes.
pub fn parse_response(xml: &str) -> SamlResult<ParsedResponse> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();

    if root.tag_name().name() != "Response" {
        return Err(SamlError::InvalidResponse(format!(
            "Expected Response root element, found {}",
            root.tag_name().name()
        )));
    }

    let name_id = first_local(root, "NameID").map(node_text);
    let request_id = root.attribute("InResponseTo").map(str::to_string);

    let mut attributes: Vec<(String, Vec<String>)> = Vec::new();
    for attribute in all_local(root, "Attribute") {
        let Some(name) = attribute.attribute("Name") else {
            continue;
        };

        let values: Vec<String> = attribute
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "AttributeValue")
            .map(node_text)
            .collect();

        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => existing.extend(values),
            None => attributes.push((name.to_string(), values)),
        }
    }

    Ok(ParsedResponse {
        name_id,
        attributes,
        request_id,
    })
}
