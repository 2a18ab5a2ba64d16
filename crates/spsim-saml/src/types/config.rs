//! Service provider and identity provider configuration.

use serde::{Deserialize, Serialize};

use super::constants::{NameIdFormat, SamlBinding};

/// Configuration for one simulated service provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceProviderConfig {
    /// Stable identifier, used to derive per-SP endpoint paths.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// SAML entity ID emitted as the `Issuer`.
    pub entity_id: String,
    /// Requested name ID format for the `NameIDPolicy`.
    #[serde(default)]
    pub name_id_format: NameIdFormat,
    /// PEM private key for request signing.
    #[serde(default)]
    pub signing_key: Option<String>,
    /// PEM certificate matching `signing_key`.
    #[serde(default)]
    pub signing_certificate: Option<String>,
    /// PEM private key reserved for assertion decryption.
    ///
    /// Stored for metadata completeness; assertion encryption is not
    /// part of this engine.
    #[serde(default)]
    pub encryption_key: Option<String>,
    /// PEM certificate matching `encryption_key`.
    #[serde(default)]
    pub encryption_certificate: Option<String>,
    /// Whether outgoing AuthnRequests are signed.
    #[serde(default)]
    pub sign_authn_request: bool,
    /// The identity provider this SP sends requests to.
    pub idp: IdentityProviderConfig,
}

impl ServiceProviderConfig {
    /// Derives the assertion consumer service URL from the application base URL.
    ///
    /// The ACS only supports the HTTP-POST binding.
    #[must_use]
    pub fn acs_url(&self, base_url: &str) -> String {
        format!("{}/sp/{}/acs", base_url.trim_end_matches('/'), self.id)
    }

    /// Returns the signing key and certificate when both are configured.
    ///
    /// A lone key or a lone certificate is treated as unconfigured.
    #[must_use]
    pub fn signing_material(&self) -> Option<(&str, &str)> {
        match (&self.signing_key, &self.signing_certificate) {
            (Some(key), Some(cert)) => Some((key.as_str(), cert.as_str())),
            _ => None,
        }
    }
}

/// Configuration for the identity provider an SP talks to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    /// SAML entity ID of the IdP.
    pub entity_id: String,
    /// Single sign-on endpoint URL.
    pub sso_url: String,
    /// Binding used to deliver the AuthnRequest.
    #[serde(default)]
    pub sso_binding: SamlBinding,
    /// Whether the IdP requires signed AuthnRequests.
    #[serde(default)]
    pub want_authn_requests_signed: bool,
    /// PEM certificate used to verify response signatures.
    #[serde(default)]
    pub certificate: Option<String>,
    /// Single logout endpoint URL, if published.
    #[serde(default)]
    pub slo_url: Option<String>,
    /// Binding for the single logout endpoint.
    #[serde(default)]
    pub slo_binding: Option<SamlBinding>,
    /// Raw IdP metadata document, kept for display and re-import.
    #[serde(default)]
    pub raw_metadata: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp() -> ServiceProviderConfig {
        ServiceProviderConfig {
            id: "acme".to_string(),
            name: "Acme Test SP".to_string(),
            entity_id: "https://sp.example.com/acme".to_string(),
            name_id_format: NameIdFormat::Email,
            signing_key: None,
            signing_certificate: None,
            encryption_key: None,
            encryption_certificate: None,
            sign_authn_request: false,
            idp: IdentityProviderConfig {
                entity_id: "https://idp.example.com".to_string(),
                sso_url: "https://idp.example.com/sso".to_string(),
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
    fn acs_url_derivation() {
        let sp = sp();
        assert_eq!(
            sp.acs_url("https://app.example.com"),
            "https://app.example.com/sp/acme/acs"
        );
        assert_eq!(
            sp.acs_url("https://app.example.com/"),
            "https://app.example.com/sp/acme/acs"
        );
    }

    #[test]
    fn signing_material_requires_both_halves() {
        let mut sp = sp();
        assert!(sp.signing_material().is_none());

        sp.signing_key = Some("key".to_string());
        assert!(sp.signing_material().is_none());

        sp.signing_certificate = Some("cert".to_string());
        assert!(sp.signing_material().is_some());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "id": "acme",
            "name": "Acme",
            "entity_id": "https://sp.example.com/acme",
            "idp": {
                "entity_id": "https://idp.example.com",
                "sso_url": "https://idp.example.com/sso"
            }
        }"#;
        let sp: ServiceProviderConfig = serde_json::from_str(json).unwrap();
        assert!(!sp.sign_authn_request);
        assert_eq!(sp.idp.sso_binding, SamlBinding::HttpRedirect);
    }
}
