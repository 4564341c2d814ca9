//! Id-token verification
//!
//! Parses a compact JWT and checks signature, issuer, audience, expiry,
//! issue time, and nonce before handing any claim to the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::base64_url_decode;
use super::keys::KeyStore;
use crate::error::{AuthError, Result};
use crate::platform::{Clock, HttpClient};

/// Allowance for provider/relying-party clock skew on `iat`
const MAX_CLOCK_SKEW_SECS: u64 = 300;

/// Validated OIDC claims
///
/// Only constructed after every verification check has passed. Missing
/// numeric claims default to zero, which makes a token without `exp`
/// expired rather than eternal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub iss: String,

    #[serde(default)]
    pub sub: String,

    /// Audience (string or array in the wire format)
    #[serde(default, deserialize_with = "deserialize_audience")]
    pub aud: Vec<String>,

    #[serde(default)]
    pub exp: u64,

    #[serde(default)]
    pub iat: u64,

    pub nonce: Option<String>,

    pub email: Option<String>,

    pub preferred_username: Option<String>,

    /// Additional provider-specific claims
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Deserialize audience as either string or array of strings
fn deserialize_audience<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct AudienceVisitor;

    impl<'de> Visitor<'de> for AudienceVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("string or array of strings")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Vec<String>, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_unit<E>(self) -> std::result::Result<Vec<String>, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Vec<String>, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut values = Vec::new();
            while let Some(value) = seq.next_element()? {
                values.push(value);
            }
            Ok(values)
        }
    }

    deserializer.deserialize_any(AudienceVisitor)
}

/// Compact JWT header (the fields verification needs)
#[derive(Deserialize)]
struct Header {
    #[serde(default)]
    alg: String,
    kid: Option<String>,
}

/// Verifies provider-issued id tokens
///
/// Owns the key cache so resolved keys persist across verifications for
/// the verifier's lifetime.
pub struct JwtVerifier {
    issuer: String,
    client_id: String,
    keys: KeyStore,
}

impl JwtVerifier {
    pub fn new(issuer: &str, client_id: impl Into<String>) -> Self {
        let issuer = issuer.trim_end_matches('/').to_string();
        Self {
            keys: KeyStore::new(&issuer),
            issuer,
            client_id: client_id.into(),
        }
    }

    /// Verify a compact id token and return its claims
    ///
    /// The signature check runs before any claim is inspected; a failure
    /// at any step discards the token entirely.
    pub fn verify(
        &self,
        jwt: &str,
        expected_nonce: Option<&str>,
        http: &dyn HttpClient,
        clock: &dyn Clock,
    ) -> Result<Claims> {
        let parts: Vec<&str> = jwt.split('.').collect();
        if parts.len() != 3 {
            return Err(AuthError::malformed_token("expected three segments"));
        }

        let header_bytes = base64_url_decode(parts[0])
            .map_err(|_| AuthError::malformed_token("invalid header encoding"))?;
        let header: Header = serde_json::from_slice(&header_bytes)
            .map_err(|e| AuthError::malformed_token(format!("invalid header: {}", e)))?;

        let payload_bytes = base64_url_decode(parts[1])
            .map_err(|_| AuthError::malformed_token("invalid payload encoding"))?;
        let claims: Claims = serde_json::from_slice(&payload_bytes)
            .map_err(|e| AuthError::malformed_token(format!("invalid payload: {}", e)))?;

        let signature = base64_url_decode(parts[2])
            .map_err(|_| AuthError::malformed_token("invalid signature encoding"))?;

        // Pinning the algorithm closes the `none`/HMAC confusion hole: a
        // token must never choose how it gets verified.
        if header.alg != "RS256" {
            return Err(AuthError::unsupported_algorithm(header.alg));
        }

        let kid = header
            .kid
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(AuthError::MissingKeyId)?;

        let key = self.keys.get(kid, http)?;

        let signed = format!("{}.{}", parts[0], parts[1]);
        key.verify(signed.as_bytes(), &signature)?;

        let now = clock.now_secs();

        if claims.iss != self.issuer {
            return Err(AuthError::IssuerMismatch);
        }

        if !claims.aud.iter().any(|aud| *aud == self.client_id) {
            return Err(AuthError::AudienceMismatch);
        }

        if claims.exp < now {
            return Err(AuthError::TokenExpired);
        }

        if claims.iat > now + MAX_CLOCK_SKEW_SECS {
            return Err(AuthError::TokenIssuedInFuture);
        }

        if let Some(expected) = expected_nonce {
            if claims.nonce.as_deref() != Some(expected) {
                return Err(AuthError::NonceMismatch);
            }
        }

        tracing::debug!(sub = %claims.sub, "id token verified");
        Ok(claims)
    }
}
