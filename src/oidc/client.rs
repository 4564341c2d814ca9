//! OIDC client
//!
//! Builds authorize/logout redirect URLs and performs the
//! authorization-code-for-token exchange against the provider's
//! `{issuer}/v1/...` endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::Config;
use crate::error::{AuthError, Result};
use crate::platform::HttpClient;

/// Token endpoint response
///
/// `id_token` is the only field the flow requires; everything else the
/// provider sends is retained for the request lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Client for one registered OIDC application
#[derive(Debug, Clone)]
pub struct OidcClient {
    client_id: String,
    issuer: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl OidcClient {
    pub fn new(
        client_id: impl Into<String>,
        issuer: &str,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            issuer: issuer.trim_end_matches('/').to_string(),
            redirect_uri: redirect_uri.into(),
            scopes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.client_id.clone(),
            &config.issuer,
            config.redirect_uri.clone(),
            config.scopes.clone(),
        )
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Build the authorize redirect URL for one login attempt
    pub fn build_authorize_url(&self, state: &str, code_challenge: &str, nonce: &str) -> String {
        let scope = self.scopes.join(" ");
        let query = encode_query(&[
            ("client_id", &self.client_id),
            ("redirect_uri", &self.redirect_uri),
            ("response_type", "code"),
            ("response_mode", "query"),
            ("scope", &scope),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("nonce", nonce),
        ]);

        format!("{}/v1/authorize?{}", self.issuer, query)
    }

    /// Exchange an authorization code for tokens
    ///
    /// POSTs the form-encoded grant to `{issuer}/v1/token`. The verifier
    /// proves possession of the PKCE secret minted at login start.
    pub fn exchange_code_for_tokens(
        &self,
        code: &str,
        code_verifier: &str,
        http: &dyn HttpClient,
    ) -> Result<TokenResponse> {
        let endpoint = format!("{}/v1/token", self.issuer);
        let body = encode_query(&[
            ("grant_type", "authorization_code"),
            ("client_id", &self.client_id),
            ("redirect_uri", &self.redirect_uri),
            ("code", code),
            ("code_verifier", code_verifier),
        ]);

        tracing::debug!(endpoint = %endpoint, "exchanging authorization code for tokens");

        let response = http
            .post(
                &endpoint,
                &[
                    ("Accept", "application/json"),
                    ("Content-Type", "application/x-www-form-urlencoded"),
                ],
                body.as_bytes(),
            )
            .map_err(|e| AuthError::transport(e.to_string()))?;

        // The provider reports grant failures as JSON too, so parse before
        // looking at the status.
        let data: serde_json::Value = response
            .json()
            .map_err(|_| AuthError::malformed_response("token endpoint returned non-JSON body"))?;

        if !data.is_object() {
            return Err(AuthError::malformed_response(
                "token endpoint returned a non-object body",
            ));
        }

        if response.status >= 400 {
            let error = data
                .get("error_description")
                .and_then(|v| v.as_str())
                .or_else(|| data.get("error").and_then(|v| v.as_str()))
                .unwrap_or("unknown_error");
            return Err(AuthError::token_exchange(error));
        }

        serde_json::from_value(data)
            .map_err(|e| AuthError::malformed_response(format!("invalid token response: {}", e)))
    }

    /// Build the provider logout redirect URL
    pub fn build_logout_url(&self, id_token_hint: &str, post_logout_redirect_uri: &str) -> String {
        let query = encode_query(&[
            ("id_token_hint", id_token_hint),
            ("post_logout_redirect_uri", post_logout_redirect_uri),
        ]);

        format!("{}/v1/logout?{}", self.issuer, query)
    }
}

/// Build a query string with every component percent-encoded per RFC 3986
///
/// The form-urlencoded serializer would emit `+` for spaces; the provider
/// contract uses `%20`.
fn encode_query(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode everything outside the RFC 3986 unreserved set
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{:02X}", byte));
            }
        }
    }
    out
}
