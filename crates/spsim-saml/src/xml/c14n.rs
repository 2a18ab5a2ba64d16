//! Exclusive Canonical XML 1.0 (exc-C14N), subtree form.
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//!
//! Only "visibly utilized" namespace declarations are output: a namespace
//! is utilized if its prefix is used by the element's tag name or by one
//! of its attributes. Declarations inherited from ancestors outside the
//! canonicalized subtree are re-emitted on the apex element, which is what
//! makes a `SignedInfo` canonicalized in isolation byte-equal to the same
//! element canonicalized inside its document.
//!
//! This implementation canonicalizes whole element subtrees, with an
//! optional excluded node for the enveloped-signature transform. Comments
//! are always stripped; InclusiveNamespaces prefix lists are not
//! supported since SAML signatures do not use them.

use std::collections::{BTreeMap, HashSet};

use roxmltree::{Node, NodeId, NodeType};

/// Canonicalizes the subtree rooted at `apex`.
///
/// `exclude` names a node whose entire subtree is omitted from the output
/// (the signature being verified, per the enveloped-signature transform).
#[must_use]
pub fn canonicalize_subtree(apex: Node<'_, '_>, exclude: Option<NodeId>) -> String {
    let mut out = String::new();
    process_node(apex, exclude, &BTreeMap::new(), &mut out);
    out
}

fn process_node(
    node: Node<'_, '_>,
    exclude: Option<NodeId>,
    rendered_ns: &BTreeMap<String, String>,
    out: &mut String,
) {
    if Some(node.id()) == exclude {
        return;
    }

    match node.node_type() {
        NodeType::Element => process_element(node, exclude, rendered_ns, out),
        NodeType::Text => {
            out.push_str(&escape_text(node.text().unwrap_or("")));
        }
        NodeType::PI => {
            out.push_str("<?");
            out.push_str(node.tag_name().name());
            if let Some(value) = node.text() {
                if !value.is_empty() {
                    out.push(' ');
                    out.push_str(&value.replace('\r', "&#xD;"));
                }
            }
            out.push_str("?>");
        }
        // Comments are stripped; Root never appears below an apex element.
        NodeType::Comment | NodeType::Root => {}
    }
}

fn process_element(
    node: Node<'_, '_>,
    exclude: Option<NodeId>,
    rendered_ns: &BTreeMap<String, String>,
    out: &mut String,
) {
    // Visibly utilized prefixes: the element's own prefix plus every
    // prefixed attribute.
    let mut utilized: HashSet<String> = HashSet::new();
    utilized.insert(element_prefix(&node).unwrap_or("").to_string());
    for attr in node.attributes() {
        if let Some(prefix) = attr_prefix(&node, &attr) {
            if !prefix.is_empty() {
                utilized.insert(prefix.to_string());
            }
        }
    }

    let inscope = collect_inscope_namespaces(&node);

    let mut ns_decls: Vec<NsDecl> = Vec::new();
    for prefix in &utilized {
        if prefix == "xml" {
            continue;
        }
        if let Some(uri) = inscope.get(prefix) {
            if rendered_ns.get(prefix) != Some(uri) {
                ns_decls.push(NsDecl {
                    prefix: prefix.clone(),
                    uri: uri.clone(),
                });
            }
        } else if prefix.is_empty() {
            // Default namespace utilized but not in scope: undeclare it
            // if an ancestor rendered a non-empty default.
            if rendered_ns.get("").is_some_and(|uri| !uri.is_empty()) {
                ns_decls.push(NsDecl {
                    prefix: String::new(),
                    uri: String::new(),
                });
            }
        }
    }
    ns_decls.sort();

    let mut attrs: Vec<Attr> = Vec::new();
    for attr in node.attributes() {
        let qualified_name = match attr_prefix(&node, &attr) {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, attr.name()),
            _ => attr.name().to_string(),
        };
        attrs.push(Attr {
            ns_uri: attr.namespace().unwrap_or("").to_string(),
            local_name: attr.name().to_string(),
            qualified_name,
            value: attr.value().to_string(),
        });
    }
    attrs.sort();

    let elem_name = match element_prefix(&node) {
        Some(prefix) if !prefix.is_empty() => {
            format!("{}:{}", prefix, node.tag_name().name())
        }
        _ => node.tag_name().name().to_string(),
    };

    out.push('<');
    out.push_str(&elem_name);
    for decl in &ns_decls {
        decl.render(out);
    }
    for attr in &attrs {
        attr.render(out);
    }
    out.push('>');

    let mut child_rendered_ns = rendered_ns.clone();
    for decl in &ns_decls {
        child_rendered_ns.insert(decl.prefix.clone(), decl.uri.clone());
    }

    for child in node.children() {
        process_node(child, exclude, &child_rendered_ns, out);
    }

    out.push_str("</");
    out.push_str(&elem_name);
    out.push('>');
}

/// Prefix of an element's tag name, resolved through the in-scope
/// declarations. An element in the default namespace (or none) yields
/// `None`.
fn element_prefix<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.tag_name()
        .namespace()
        .and_then(|uri| node.lookup_prefix(uri))
}

/// Prefix of an attribute, with XML-namespace attributes normalized to
/// `xml`. Unqualified attributes yield `None`.
fn attr_prefix<'a>(
    node: &Node<'a, '_>,
    attr: &roxmltree::Attribute<'a, '_>,
) -> Option<&'a str> {
    let ns_uri = attr.namespace()?;
    if ns_uri == "http://www.w3.org/XML/1998/namespace" {
        return Some("xml");
    }
    node.lookup_prefix(ns_uri)
}

/// Collects all in-scope namespace declarations for an element, nearer
/// declarations overriding more distant ones.
fn collect_inscope_namespaces(node: &Node<'_, '_>) -> BTreeMap<String, String> {
    let mut ns_stack: Vec<BTreeMap<String, String>> = Vec::new();

    let mut current = Some(*node);
    while let Some(n) = current {
        if n.is_element() {
            let mut level = BTreeMap::new();
            for ns in n.namespaces() {
                level.insert(ns.name().unwrap_or("").to_string(), ns.uri().to_string());
            }
            ns_stack.push(level);
        }
        current = n.parent();
    }

    let mut result = BTreeMap::new();
    for level in ns_stack.into_iter().rev() {
        for (prefix, uri) in level {
            if uri.is_empty() {
                result.remove(&prefix);
            } else {
                result.insert(prefix, uri);
            }
        }
    }
    result
}

/// Escape text node content per C14N rules.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape attribute values per C14N rules.
fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A namespace declaration pending output.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NsDecl {
    prefix: String,
    uri: String,
}

impl NsDecl {
    fn render(&self, out: &mut String) {
        if self.prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(&self.prefix);
            out.push_str("=\"");
        }
        out.push_str(&escape_attr(&self.uri));
        out.push('"');
    }
}

impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Default namespace sorts first, then by prefix.
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute pending output.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attr {
    ns_uri: String,
    local_name: String,
    qualified_name: String,
    value: String,
}

impl Attr {
    fn render(&self, out: &mut String) {
        out.push(' ');
        out.push_str(&self.qualified_name);
        out.push_str("=\"");
        out.push_str(&escape_attr(&self.value));
        out.push('"');
    }
}

impl Ord for Attr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Unqualified attributes first by local name, then qualified
        // by (namespace URI, local name).
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(&other.local_name),
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(&other.ns_uri)
                .then(self.local_name.cmp(&other.local_name)),
        }
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
