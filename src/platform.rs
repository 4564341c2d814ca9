//! Platform abstraction traits
//!
//! These traits define the boundary between the core login logic and its
//! external collaborators: the HTTP transport, the wall clock, process
//! configuration, and the per-user session store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AuthError, Result};

/// HTTP client for outbound requests (token exchange, JWKS retrieval)
///
/// Calls are blocking. Implementations should impose a bounded timeout;
/// a timed-out call surfaces as a transport error.
pub trait HttpClient {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;
    fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse>;
}

/// HTTP response from an outbound request
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Parse body as UTF-8 string
    pub fn text(&self) -> std::result::Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Clock for current time (enables testing with deterministic timestamps)
pub trait Clock {
    fn now_secs(&self) -> u64;
}

/// Environment variable access
pub trait Environment {
    fn get_var(&self, name: &str) -> Result<String>;
}

/// Per-user session store
///
/// A small keyed bag scoped to one browser session, surviving exactly one
/// redirect round trip. Holds the PKCE bundle, the token response, the
/// verified claims, and the one-shot error message.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    fn put(&self, key: &str, value: serde_json::Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Typed session get: deserialize the stored JSON value
pub fn session_get<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(value) => {
            let value: T = serde_json::from_value(value)
                .map_err(|e| AuthError::session(format!("session deserialization error: {}", e)))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Typed session put: serialize to a JSON value
pub fn session_put<T: Serialize>(store: &dyn SessionStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)
        .map_err(|e| AuthError::session(format!("session serialization error: {}", e)))?;
    store.put(key, value)
}

/// Typed session take: read and delete in one step
///
/// Single-use fields (the PKCE bundle, the stored tokens on logout) must
/// never be observable twice; the delete happens even when the stored
/// value fails to deserialize.
pub fn session_take<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Result<Option<T>> {
    let value = store.get(key)?;
    store.remove(key)?;
    match value {
        Some(value) => {
            let value: T = serde_json::from_value(value)
                .map_err(|e| AuthError::session(format!("session deserialization error: {}", e)))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}
