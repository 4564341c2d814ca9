//! JWKS retrieval and key reconstruction
//!
//! Fetches the provider's published signing keys, rebuilds each RSA key
//! from its JWK modulus/exponent via the DER encoder, and caches the
//! result by key id.

use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

use super::base64_url_decode;
use crate::der;
use crate::error::{AuthError, Result};
use crate::platform::HttpClient;

/// A single JSON Web Key as published by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: Option<String>,
    pub kty: String,
    pub n: Option<String>,
    pub e: Option<String>,
    pub alg: Option<String>,
}

/// The provider's key set document
#[derive(Debug, Clone, Deserialize)]
pub struct JwksDocument {
    pub keys: Vec<Jwk>,
}

/// An RSA public key ready for signature verification
#[derive(Debug, Clone)]
pub struct VerificationKey {
    pem: String,
    key: RsaPublicKey,
}

impl VerificationKey {
    /// Reconstruct a verification key from an RSA JWK
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        if jwk.kty != "RSA" {
            return Err(AuthError::invalid_jwk(format!(
                "unsupported key type '{}'",
                jwk.kty
            )));
        }

        let n = jwk
            .n
            .as_deref()
            .ok_or_else(|| AuthError::invalid_jwk("missing modulus"))?;
        let e = jwk
            .e
            .as_deref()
            .ok_or_else(|| AuthError::invalid_jwk("missing exponent"))?;

        let n = base64_url_decode(n).map_err(|_| AuthError::invalid_jwk("undecodable modulus"))?;
        let e = base64_url_decode(e).map_err(|_| AuthError::invalid_jwk("undecodable exponent"))?;

        let spki = der::rsa_public_key_to_spki(&n, &e);
        let key = RsaPublicKey::from_public_key_der(&spki)
            .map_err(|e| AuthError::invalid_jwk(format!("unusable public key: {}", e)))?;

        Ok(Self {
            pem: der::spki_to_pem(&spki),
            key,
        })
    }

    /// Standard PEM encoding of the key
    pub fn pem(&self) -> &str {
        &self.pem
    }

    /// Verify a PKCS#1 v1.5 SHA-256 signature over `message`
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let digest = Sha256::digest(message);
        self.key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .map_err(|_| AuthError::SignatureVerification)
    }
}

/// Per-kid key cache backed by the provider's JWKS endpoint
///
/// Entries live for the process lifetime and are never evicted: keys are
/// immutable once issued, and the provider contract forbids reusing a kid
/// across rotations. The lock is not held across the network fetch, so
/// two racing requests may both fetch; the insert is idempotent.
pub struct KeyStore {
    jwks_url: String,
    keys: Mutex<HashMap<String, VerificationKey>>,
}

impl KeyStore {
    pub fn new(issuer: &str) -> Self {
        Self {
            jwks_url: format!("{}/v1/keys", issuer.trim_end_matches('/')),
            keys: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the verification key for a kid, fetching the JWKS on a miss
    pub fn get(&self, kid: &str, http: &dyn HttpClient) -> Result<VerificationKey> {
        if let Some(key) = self.lock_keys().get(kid) {
            tracing::debug!(kid = %kid, "JWKS cache hit");
            return Ok(key.clone());
        }

        tracing::debug!(url = %self.jwks_url, kid = %kid, "fetching JWKS");
        let jwks = self.fetch(http)?;

        let jwk = jwks
            .keys
            .iter()
            .find(|k| k.kid.as_deref() == Some(kid))
            .ok_or_else(|| AuthError::key_not_found(kid))?;

        let key = VerificationKey::from_jwk(jwk)?;
        self.lock_keys()
            .entry(kid.to_string())
            .or_insert_with(|| key.clone());

        Ok(key)
    }

    fn fetch(&self, http: &dyn HttpClient) -> Result<JwksDocument> {
        let response = http
            .get(&self.jwks_url, &[("Accept", "application/json")])
            .map_err(|e| AuthError::jwks_fetch(e.to_string()))?;

        if response.status != 200 {
            return Err(AuthError::jwks_fetch(format!("HTTP {}", response.status)));
        }

        response
            .json()
            .map_err(|e| AuthError::jwks_fetch(format!("invalid JWKS: {}", e)))
    }

    fn lock_keys(&self) -> std::sync::MutexGuard<'_, HashMap<String, VerificationKey>> {
        // A poisoned lock only means a panic elsewhere; the map is still usable.
        self.keys.lock().unwrap_or_else(|e| e.into_inner())
    }
}
