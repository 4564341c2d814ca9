//! portal-auth-core: OIDC Authorization Code + PKCE login core
//!
//! Authenticates end users against an external OpenID Connect provider and
//! independently verifies the returned id token, including rebuilding each
//! RSA verification key from the provider's JWK material. The HTTP
//! transport, wall clock, process environment, and per-user session store
//! are injected behind platform traits; this crate performs no I/O of its
//! own.

pub mod config;
pub mod der;
pub mod error;
pub mod flow;
pub mod oidc;
pub mod pkce;
pub mod platform;

#[cfg(test)]
pub mod test_support;
