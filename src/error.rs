//! Error types for the login flow and token verification

use thiserror::Error;

/// Result type alias for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Authentication error
///
/// Every variant is terminal for the current login attempt; nothing is
/// retried. The caller decides user-facing presentation and logging.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token request failed: {message}")]
    Transport { message: String },

    #[error("token request error: {message}")]
    TokenExchange { message: String },

    #[error("unexpected provider response: {message}")]
    MalformedResponse { message: String },

    #[error("malformed token: {message}")]
    MalformedToken { message: String },

    #[error("unsupported token algorithm '{alg}'")]
    UnsupportedAlgorithm { alg: String },

    #[error("token key ID missing")]
    MissingKeyId,

    #[error("unable to locate key '{kid}' for token")]
    KeyNotFound { kid: String },

    #[error("invalid JWK: {message}")]
    InvalidJwk { message: String },

    #[error("unable to fetch JWKS: {message}")]
    JwksFetch { message: String },

    #[error("unable to verify token signature")]
    SignatureVerification,

    #[error("token issuer mismatch")]
    IssuerMismatch,

    #[error("token audience mismatch")]
    AudienceMismatch,

    #[error("token expired")]
    TokenExpired,

    #[error("token issued in the future")]
    TokenIssuedInFuture,

    #[error("nonce mismatch")]
    NonceMismatch,

    #[error("{message}")]
    SessionExpired { message: String },

    #[error("state mismatch, potential CSRF detected")]
    StateMismatch,

    #[error("authorization code missing")]
    MissingAuthorizationCode,

    #[error("random source failure: {message}")]
    RandomSource { message: String },

    #[error("session store error: {message}")]
    Session { message: String },

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl AuthError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn token_exchange(message: impl Into<String>) -> Self {
        Self::TokenExchange {
            message: message.into(),
        }
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::MalformedToken {
            message: message.into(),
        }
    }

    pub fn unsupported_algorithm(alg: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { alg: alg.into() }
    }

    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    pub fn invalid_jwk(message: impl Into<String>) -> Self {
        Self::InvalidJwk {
            message: message.into(),
        }
    }

    pub fn jwks_fetch(message: impl Into<String>) -> Self {
        Self::JwksFetch {
            message: message.into(),
        }
    }

    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::SessionExpired {
            message: message.into(),
        }
    }

    pub fn random_source(message: impl Into<String>) -> Self {
        Self::RandomSource {
            message: message.into(),
        }
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
