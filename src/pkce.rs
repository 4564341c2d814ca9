//! PKCE artifact generation
//!
//! Random state/nonce values and the code-verifier/code-challenge pair for
//! the Authorization Code + PKCE flow (RFC 7636, S256 only).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AuthError, Result};

/// Byte length of the CSRF `state` value
pub const STATE_BYTES: usize = 32;

/// Byte length of the id-token `nonce` value
pub const NONCE_BYTES: usize = 16;

/// Default character length of the code verifier
pub const VERIFIER_LENGTH: usize = 128;

/// Generate a random hex token of `byte_length` bytes
///
/// Used for both the CSRF `state` and the id-token `nonce`.
pub fn generate_state(byte_length: usize) -> Result<String> {
    let bytes = random_bytes(byte_length)?;
    Ok(hex_encode(&bytes))
}

/// Generate a random code verifier of `length` characters
///
/// `length` is clamped to the RFC 7636 range [43, 128]. The output is
/// base64url without padding, so it stays within the verifier alphabet.
pub fn generate_code_verifier(length: usize) -> Result<String> {
    let length = length.clamp(43, 128);
    // Enough bytes that the encoding covers `length` characters.
    let bytes = random_bytes((length * 3 + 3) / 4)?;
    let mut verifier = URL_SAFE_NO_PAD.encode(&bytes);
    verifier.truncate(length);
    Ok(verifier)
}

/// Compute the S256 code challenge for a verifier
///
/// base64url(SHA-256(verifier)), no padding. Deterministic: the challenge
/// sent at authorize time must re-derive from the verifier sent at token
/// time, which is the PKCE binding property.
pub fn code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Fill a buffer from the OS CSPRNG
///
/// Random-source exhaustion is fatal for the login attempt; the process
/// must not fall back to a weaker source.
fn random_bytes(length: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::random_source(e.to_string()))?;
    Ok(bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
