//! AuthnRequest construction.
//!
//! Requests are emitted as compact single-line XML so the signed form has
//! no whitespace ambiguity between builder, signer, and any verifier on
//! the IdP side.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::{SamlBinding, ServiceProviderConfig, SAMLP_NS, SAML_NS};

/// Per-initiation options for an AuthnRequest.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthnRequestOptions {
    /// Ask the IdP to re-authenticate even with a live session.
    pub force_authn: bool,
    /// Allow the IdP to create a new identifier for the subject.
    pub allow_create: bool,
}

/// A freshly built AuthnRequest and its correlation handles.
#[derive(Debug, Clone)]
pub struct AuthnRequestContext {
    /// The generated message ID (`_<timestamp36><random36>`).
    pub request_id: String,
    /// Issue instant stamped into the request.
    pub issue_instant: DateTime<Utc>,
    /// The unsigned request XML.
    pub xml: String,
}

/// Builds an unsigned AuthnRequest for the given service provider.
///
/// The `ProtocolBinding` always names HTTP-POST: that is the only binding
/// the assertion consumer endpoint accepts, independent of how the request
/// itself travels to the IdP. `ForceAuthn="true"` (paired with
/// `IsPassive="false"`) is emitted only when forced, and
/// `NameIDPolicy/@AllowCreate` mirrors the option in both states.
#[must_use]
pub fn build_authn_request(
    sp: &ServiceProviderConfig,
    acs_url: &str,
    options: &AuthnRequestOptions,
) -> AuthnRequestContext {
    let issue_instant = Utc::now();
    let request_id = spsim_crypto::random::message_id(issue_instant.timestamp_millis() as u128);

    let force_attrs = if options.force_authn {
        r#" ForceAuthn="true" IsPassive="false""#
    } else {
        ""
    };

    let xml = format!(
        concat!(
            r#"<samlp:AuthnRequest xmlns:samlp="{samlp}" xmlns:saml="{saml}""#,
            r#" ID="{id}" Version="2.0" IssueInstant="{instant}""#,
            r#" Destination="{destination}""#,
            r#" AssertionConsumerServiceURL="{acs}""#,
            r#" ProtocolBinding="{binding}"{force}>"#,
            r#"<saml:Issuer>{issuer}</saml:Issuer>"#,
            r#"<samlp:NameIDPolicy Format="{format}" AllowCreate="{allow_create}"/>"#,
            r#"</samlp:AuthnRequest>"#
        ),
        samlp = SAMLP_NS,
        saml = SAML_NS,
        id = request_id,
        instant = issue_instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        destination = escape_attr(&sp.idp.sso_url),
        acs = escape_attr(acs_url),
        binding = SamlBinding::HttpPost.uri(),
        force = force_attrs,
        issuer = escape_text(&sp.entity_id),
        format = sp.name_id_format.uri(),
        allow_create = options.allow_create,
    );

    AuthnRequestContext {
        request_id,
        issue_instant,
        xml,
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IdentityProviderConfig, NameIdFormat};
    use crate::xml::find::{first_local, node_text};

    fn sp() -> ServiceProviderConfig {
        ServiceProviderConfig {
            id: "acme".to_string(),
            name: "Acme".to_string(),
            entity_id: "https://sp.example.com/acme".to_string(),
            name_id_format: NameIdFormat::Email,
            signing_key: None,
            signing_certificate: None,
            encryption_key: None,
            encryption_certificate: None,
            sign_authn_request: false,
            idp: IdentityProviderConfig {
                entity_id: "https://idp.example.com".to_string(),
                sso_url: "https://idp.example.com/sso?tenant=a&env=test".to_string(),
                sso_binding: SamlBinding::HttpRedirect,
                want_authn_requests_signed: false,
                certificate: None,
                slo_url: None,
                slo_binding: None,
                raw_metadata: None,
            },
        }
    }

    #[test]
    fn builds_well_formed_request() {
        let ctx = build_authn_request(&sp(), "https://app.example.com/sp/acme/acs", &AuthnRequestOptions::default());

        let doc = roxmltree::Document::parse(&ctx.xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.tag_name().name(), "AuthnRequest");
        assert_eq!(root.tag_name().namespace(), Some(SAMLP_NS));
        assert_eq!(root.attribute("ID"), Some(ctx.request_id.as_str()));
        assert_eq!(root.attribute("Version"), Some("2.0"));
        assert_eq!(
            root.attribute("Destination"),
            Some("https://idp.example.com/sso?tenant=a&env=test")
        );
        assert_eq!(
            root.attribute("AssertionConsumerServiceURL"),
            Some("https://app.example.com/sp/acme/acs")
        );
        assert_eq!(
            root.attribute("ProtocolBinding"),
            Some("urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST")
        );

        let issuer = first_local(doc.root(), "Issuer").unwrap();
        assert_eq!(node_text(issuer), "https://sp.example.com/acme");

        let policy = first_local(doc.root(), "NameIDPolicy").unwrap();
        assert_eq!(policy.attribute("Format"), Some(NameIdFormat::Email.uri()));
        assert_eq!(policy.attribute("AllowCreate"), Some("false"));
    }

    #[test]
    fn request_id_shape() {
        let ctx = build_authn_request(&sp(), "https://a/acs", &AuthnRequestOptions::default());
        assert!(ctx.request_id.starts_with('_'));
        assert!(ctx.request_id[1..]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        // timestamp36 (8-9 chars for current epochs) + 11 random chars
        assert!(ctx.request_id.len() >= 16);
    }

    #[test]
    fn force_authn_emits_both_markers() {
        let options = AuthnRequestOptions {
            force_authn: true,
            allow_create: true,
        };
        let ctx = build_authn_request(&sp(), "https://a/acs", &options);

        let doc = roxmltree::Document::parse(&ctx.xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.attribute("ForceAuthn"), Some("true"));
        assert_eq!(root.attribute("IsPassive"), Some("false"));

        let policy = first_local(doc.root(), "NameIDPolicy").unwrap();
        assert_eq!(policy.attribute("AllowCreate"), Some("true"));
    }

    #[test]
    fn passive_request_omits_force_markers() {
        let ctx = build_authn_request(&sp(), "https://a/acs", &AuthnRequestOptions::default());
        let doc = roxmltree::Document::parse(&ctx.xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.attribute("ForceAuthn"), None);
        assert_eq!(root.attribute("IsPassive"), None);
    }

    #[test]
    fn issue_instant_is_utc_iso8601() {
        let ctx = build_authn_request(&sp(), "https://a/acs", &AuthnRequestOptions::default());
        let doc = roxmltree::Document::parse(&ctx.xml).unwrap();
        let instant = doc.root_element().attribute("IssueInstant").unwrap();
        assert!(instant.ends_with('Z'));
        assert!(instant.parse::<DateTime<Utc>>().is_ok());
    }
}
