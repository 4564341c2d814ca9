//! Mock implementations of platform traits and RSA fixtures for testing

use std::collections::HashMap;
use std::sync::Mutex;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::{AuthError, Result};
use crate::oidc::Jwk;
use crate::platform::{Clock, Environment, HttpClient, HttpResponse, SessionStore};

/// One outbound request observed by [`MockHttp`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub url: String,
    pub body: Vec<u8>,
}

/// Mock HTTP client with pre-configured responses
///
/// Responses match on URL substring; unmatched requests fail as transport
/// errors. Every request is recorded for assertions.
pub struct MockHttp {
    responses: Vec<(String, HttpResponse)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockHttp {
    pub fn new(responses: Vec<(String, HttpResponse)>) -> Self {
        Self {
            responses,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, method: &str, url: &str, body: &[u8]) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            url: url.to_string(),
            body: body.to_vec(),
        });

        for (pattern, response) in &self.responses {
            if url.contains(pattern) {
                return Ok(HttpResponse {
                    status: response.status,
                    body: response.body.clone(),
                });
            }
        }
        Err(AuthError::transport(format!(
            "no mock response for {} {}",
            method, url
        )))
    }
}

impl HttpClient for MockHttp {
    fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.respond("GET", url, &[])
    }

    fn post(&self, url: &str, _headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse> {
        self.respond("POST", url, body)
    }
}

/// Mock clock with a fixed timestamp
pub struct MockClock(pub u64);

impl Clock for MockClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}

/// Mock environment backed by an in-memory HashMap
pub struct MockEnv {
    vars: HashMap<String, String>,
}

impl MockEnv {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

impl Environment for MockEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::config(format!("variable '{}' not found", name)))
    }
}

/// Mock session store backed by an in-memory HashMap
pub struct MockSession {
    store: Mutex<HashMap<String, serde_json::Value>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }
}

impl SessionStore for MockSession {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.store.lock().unwrap().get(key).cloned())
    }

    fn put(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.store.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.store.lock().unwrap().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.store.lock().unwrap().clear();
        Ok(())
    }
}

/// Generate a fresh RSA key pair at runtime (never touches disk)
///
/// Returns the private key as PKCS#1 PEM for signing plus the public key
/// for JWKS fixtures.
pub fn generate_rsa_keypair() -> (String, RsaPublicKey) {
    use rsa::pkcs1::EncodeRsaPrivateKey;

    let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation failed");
    let private_pem = private_key
        .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
        .expect("private key PEM export failed")
        .to_string();
    let public_key = private_key.to_public_key();
    (private_pem, public_key)
}

/// Build the JWK for a public key as the provider would publish it
pub fn test_jwk(kid: &str, public_key: &RsaPublicKey) -> Jwk {
    Jwk {
        kid: Some(kid.to_string()),
        kty: "RSA".to_string(),
        n: Some(URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be())),
        e: Some(URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be())),
        alg: Some("RS256".to_string()),
    }
}

/// Serialized JWKS document body for [`MockHttp`]
pub fn jwks_body(kid: &str, public_key: &RsaPublicKey) -> Vec<u8> {
    serde_json::json!({
        "keys": [{
            "kid": kid,
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }]
    })
    .to_string()
    .into_bytes()
}

/// Mint a signed RS256 token with the given kid and claims
pub fn mint_rs256_token(private_pem: &str, kid: &str, claims: &serde_json::Value) -> String {
    let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
    header.kid = Some(kid.to_string());

    let key = jsonwebtoken::EncodingKey::from_rsa_pem(private_pem.as_bytes())
        .expect("invalid signing key");

    jsonwebtoken::encode(&header, claims, &key).expect("token encoding failed")
}
