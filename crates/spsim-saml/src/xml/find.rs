//! Namespace-agnostic element lookup.
//!
//! Real-world IdPs bind the SAML namespaces to whatever prefixes they
//! like (`saml2`, `saml2p`, default namespaces, ...), so structural
//! lookups match on local name only. Signature internals are the
//! exception: those are matched against the XML-DSig namespace.

use roxmltree::Node;

use crate::types::XMLDSIG_NS;

/// Returns the first descendant element with the given local name.
pub fn first_local<'a, 'input>(
    scope: Node<'a, 'input>,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    scope
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == local_name)
}

/// Returns all descendant elements with the given local name, in document order.
pub fn all_local<'a, 'input>(scope: Node<'a, 'input>, local_name: &str) -> Vec<Node<'a, 'input>> {
    scope
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == local_name)
        .collect()
}

/// Returns the first descendant element in the XML-DSig namespace with the
/// given local name.
pub fn first_dsig<'a, 'input>(
    scope: Node<'a, 'input>,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    scope.descendants().find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace() == Some(XMLDSIG_NS)
    })
}

/// Returns the direct child element in the XML-DSig namespace with the
/// given local name.
pub fn dsig_child<'a, 'input>(
    parent: Node<'a, 'input>,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    parent.children().find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace() == Some(XMLDSIG_NS)
    })
}

/// Returns the concatenated text content of a node, whitespace-trimmed.
pub fn node_text(node: Node<'_, '_>) -> String {
    let mut out = String::new();
    for child in node.descendants() {
        if child.is_text() {
            out.push_str(child.text().unwrap_or(""));
        }
    }
    out.trim().to_string()
}

/// Returns base64 content with all embedded whitespace removed.
///
/// `DigestValue` and `SignatureValue` are routinely line-folded.
pub fn base64_text(node: Node<'_, '_>) -> String {
    node_text(node).chars().filter(|c| !c.is_whitespace()).collect()
}
