//! SP-initiated login orchestration.
//!
//! The engine ties the building blocks together: build and optionally
//! sign an AuthnRequest, dispatch it over the IdP's SSO binding, park the
//! response posted back to the ACS, and hand the decoded result to the
//! browser exactly once.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bindings::{
    decode_response, encode_for_post, encode_for_redirect, post_form_fields, redirect_url,
    SamlMessageType,
};
use crate::error::{SamlError, SamlResult};
use crate::request::{build_authn_request, AuthnRequestOptions};
use crate::response::parse_response;
use crate::signature::XmlSigner;
use crate::store::{
    CorrelationStore, InMemoryCorrelationStore, InMemoryResponseRelay, RelayedResponse,
    ResponseRelay,
};
use crate::types::{DecodedSamlResponse, SamlBinding, ServiceProviderConfig};
use crate::validate::validate_saml_response;

/// Options for one login attempt.
#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    /// Ask the IdP to re-authenticate even with an active session.
    pub force_authn: bool,
    /// Allow the IdP to create a new identifier for the subject.
    pub allow_create: bool,
    /// Opaque state echoed back with the response.
    pub relay_state: Option<String>,
}

/// How the AuthnRequest reaches the IdP.
#[derive(Debug, Clone)]
pub enum LoginDispatch {
    /// 302 to this URL.
    Redirect {
        /// Fully assembled SSO URL with query parameters.
        url: String,
    },
    /// Auto-submitting form POST.
    Post {
        /// Form action, the IdP's SSO URL.
        action: String,
        /// Hidden form fields in render order.
        fields: Vec<(&'static str, String)>,
    },
}

/// An initiated login, ready for dispatch.
#[derive(Debug, Clone)]
pub struct InitiatedLogin {
    /// ID of the AuthnRequest, recorded for correlation.
    pub request_id: String,
    /// How to deliver the request to the IdP.
    pub dispatch: LoginDispatch,
}

/// The SP-side SAML protocol engine.
pub struct SpEngine {
    base_url: String,
    correlation: Arc<dyn CorrelationStore>,
    relay: Arc<dyn ResponseRelay>,
}

impl SpEngine {
    /// Creates an engine with in-memory stores.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_stores(
            base_url,
            Arc::new(InMemoryCorrelationStore::new()),
            Arc::new(InMemoryResponseRelay::with_default_ttl()),
        )
    }

    /// Creates an engine over caller-provided stores.
    #[must_use]
    pub fn with_stores(
        base_url: impl Into<String>,
        correlation: Arc<dyn CorrelationStore>,
        relay: Arc<dyn ResponseRelay>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            correlation,
            relay,
        }
    }

    /// Starts a login: builds the AuthnRequest, signs it when the SP is
    /// configured to, records the request ID, and prepares the dispatch
    /// for the IdP's SSO binding.
    ///
    /// A signing SP with incomplete key material fails with
    /// [`SamlError::SignatureCreation`]; the request is never sent
    /// unsigned as a fallback.
    pub async fn initiate_login(
        &self,
        sp: &ServiceProviderConfig,
        options: &LoginOptions,
    ) -> SamlResult<InitiatedLogin> {
        let acs_url = sp.acs_url(&self.base_url);
        let context = build_authn_request(
            sp,
            &acs_url,
            &AuthnRequestOptions {
                force_authn: options.force_authn,
                allow_create: options.allow_create,
            },
        );

        let xml = if sp.sign_authn_request {
            let (key, cert) = sp.signing_material().ok_or_else(|| {
                SamlError::SignatureCreation(
                    "Request signing enabled but signing material is incomplete".to_string(),
                )
            })?;
            XmlSigner::from_pem(key, Some(cert))?.sign(&context.xml, &context.request_id)?
        } else {
            context.xml
        };

        self.correlation.put(&sp.id, &context.request_id).await?;

        let relay_state = options.relay_state.as_deref();
        let dispatch = match sp.idp.sso_binding {
            SamlBinding::HttpRedirect => {
                let encoded = encode_for_redirect(&xml)?;
                LoginDispatch::Redirect {
                    url: redirect_url(
                        &sp.idp.sso_url,
                        &encoded,
                        SamlMessageType::Request,
                        relay_state,
                    ),
                }
            }
            SamlBinding::HttpPost => LoginDispatch::Post {
                action: sp.idp.sso_url.clone(),
                fields: post_form_fields(
                    &encode_for_post(&xml),
                    SamlMessageType::Request,
                    relay_state,
                ),
            },
        };

        info!(
            sp_id = %sp.id,
            request_id = %context.request_id,
            binding = sp.idp.sso_binding.uri(),
            signed = sp.sign_authn_request,
            "Initiated SAML login"
        );

        Ok(InitiatedLogin {
            request_id: context.request_id,
            dispatch,
        })
    }

    /// Accepts a response posted to the ACS and parks it for one pickup.
    ///
    /// Returns the ID under which the response is retrievable. The payload
    /// is stored as received; decoding and validation happen at pickup.
    pub async fn receive_response(
        &self,
        sp_id: &str,
        saml_response: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        let response_id = spsim_crypto::random::message_id(
            chrono::Utc::now().timestamp_millis() as u128,
        );

        self.relay
            .store(
                &response_id,
                RelayedResponse {
                    sp_id: sp_id.to_string(),
                    saml_response: saml_response.to_string(),
                    relay_state: relay_state.map(str::to_string),
                },
            )
            .await?;

        info!(sp_id, response_id = %response_id, "Received SAML response at ACS");
        Ok(response_id)
    }

    /// Picks up a parked response, decodes it, and validates its signatures.
    ///
    /// Correlation against the outstanding request ID is advisory: an
    /// unknown or missing `InResponseTo` is logged but never fails the
    /// login, so IdP-initiated responses still complete.
    pub async fn complete_login(
        &self,
        sp: &ServiceProviderConfig,
        response_id: &str,
    ) -> SamlResult<DecodedSamlResponse> {
        let relayed = self.relay.take_once(response_id).await?;
        if relayed.sp_id != sp.id {
            return Err(SamlError::InvalidResponse(
                "Response was received for a different service provider".to_string(),
            ));
        }

        let xml = decode_response(&relayed.saml_response)?;
        let parsed = parse_response(&xml)?;
        let validation = validate_saml_response(&xml, sp)?;

        match &parsed.request_id {
            Some(request_id) => {
                if !self.correlation.take(&sp.id, request_id).await? {
                    warn!(
                        sp_id = %sp.id,
                        request_id = %request_id,
                        "InResponseTo does not match any outstanding request"
                    );
                }
            }
            None => {
                warn!(sp_id = %sp.id, "Response carries no InResponseTo, treating as IdP-initiated");
            }
        }

        Ok(DecodedSamlResponse {
            name_id: parsed.name_id,
            attributes: parsed.attributes,
            raw_xml: xml,
            request_id: parsed.request_id,
            relay_state: relayed.relay_state,
            validation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::parse_redirect_url;
    use crate::types::IdentityProviderConfig;

    fn sp(sso_binding: SamlBinding) -> ServiceProviderConfig {
        ServiceProviderConfig {
            id: "flow-sp".to_string(),
            entity_id: "https://sp.example.com/flow".to_string(),
            idp: IdentityProviderConfig {
                entity_id: "https://idp.example.com".to_string(),
                sso_url: "https://idp.example.com/sso".to_string(),
                sso_binding,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn redirect_dispatch_roundtrips_through_the_binding() {
        let engine = SpEngine::new("https://app.example.com");
        let login = engine
            .initiate_login(
                &sp(SamlBinding::HttpRedirect),
                &LoginOptions {
                    relay_state: Some("/dashboard".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let LoginDispatch::Redirect { url } = login.dispatch else {
            panic!("expected redirect dispatch");
        };
        let (encoded, relay_state) = parse_redirect_url(&url).unwrap();
        let xml = crate::bindings::decode_request(&encoded).unwrap();

        assert!(xml.contains(&format!(r#"ID="{}""#, login.request_id)));
        assert!(xml.contains(r#"AssertionConsumerServiceURL="https://app.example.com/sp/flow-sp/acs""#));
        assert_eq!(relay_state.as_deref(), Some("/dashboard"));
    }

    #[tokio::test]
    async fn post_dispatch_carries_base64_request() {
        let engine = SpEngine::new("https://app.example.com");
        let login = engine
            .initiate_login(&sp(SamlBinding::HttpPost), &LoginOptions::default())
            .await
            .unwrap();

        let LoginDispatch::Post { action, fields } = login.dispatch else {
            panic!("expected POST dispatch");
        };
        assert_eq!(action, "https://idp.example.com/sso");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "SAMLRequest");
        // POST payloads are plain base64, never deflated.
        assert!(crate::bindings::decode_response(&fields[0].1)
            .unwrap()
            .contains("AuthnRequest"));
    }

    #[tokio::test]
    async fn signing_without_material_fails_loudly() {
        let engine = SpEngine::new("https://app.example.com");
        let mut sp = sp(SamlBinding::HttpRedirect);
        sp.sign_authn_request = true;

        let err = engine.initiate_login(&sp, &LoginOptions::default()).await;
        assert!(matches!(err, Err(SamlError::SignatureCreation(_))));
    }

    #[tokio::test]
    async fn completing_for_the_wrong_sp_is_rejected() {
        let engine = SpEngine::new("https://app.example.com");
        let response_id = engine
            .receive_response("other-sp", "cmVzcA==", None)
            .await
            .unwrap();

        let err = engine
            .complete_login(&sp(SamlBinding::HttpPost), &response_id)
            .await;
        assert!(matches!(err, Err(SamlError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn unknown_response_id_maps_to_session_not_found() {
        let engine = SpEngine::new("https://app.example.com");
        let err = engine
            .complete_login(&sp(SamlBinding::HttpPost), "_missing")
            .await;
        assert!(matches!(err, Err(SamlError::SessionNotFound)));
    }
}
