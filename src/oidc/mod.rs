//! OIDC protocol support
//!
//! Authorize/token/logout requests, JWKS key resolution, and id-token
//! verification.

mod client;
mod keys;
mod verify;

pub use client::{OidcClient, TokenResponse};
pub use keys::{Jwk, JwksDocument, KeyStore, VerificationKey};
pub use verify::{Claims, JwtVerifier};

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

/// Base64url decode, tolerating padded input
pub(crate) fn base64_url_decode(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| URL_SAFE.decode(input))
}
