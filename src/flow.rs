//! Login flow orchestration
//!
//! Drives one authentication attempt end to end: mint and persist the
//! PKCE bundle, hand the browser to the provider, then consume the
//! callback (age check, state check, code exchange, id-token
//! verification) and persist the outcome in the session.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::config::{Config, PKCE_MAX_AGE_SECS};
use crate::error::{AuthError, Result};
use crate::oidc::{Claims, JwtVerifier, OidcClient, TokenResponse};
use crate::pkce;
use crate::platform::{session_put, session_take, Clock, HttpClient, SessionStore};

/// Session key for the in-flight PKCE bundle
pub const PKCE_SESSION_KEY: &str = "pkce";
/// Session key for the raw token response
pub const TOKENS_KEY: &str = "tokens";
/// Session key for the verified claims
pub const USER_KEY: &str = "user";
/// Session key for the one-shot error message
pub const AUTH_ERROR_KEY: &str = "auth_error";

/// PKCE artifacts for one login attempt
///
/// Created at login start, consumed exactly once at the callback. A reused
/// or expired bundle fails the attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkceSession {
    pub state: String,
    pub code_verifier: String,
    pub nonce: String,
    pub created_at: u64,
}

/// Query parameters delivered to the callback endpoint
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
}

/// The authentication flow for one configured application
///
/// Owns the OIDC client and the verifier (and with it the process-lifetime
/// key cache); intended to be constructed once and shared.
pub struct AuthFlow {
    client: OidcClient,
    verifier: JwtVerifier,
    post_logout_redirect: String,
}

impl AuthFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            client: OidcClient::from_config(config),
            verifier: JwtVerifier::new(&config.issuer, config.client_id.clone()),
            post_logout_redirect: config.post_logout_redirect.clone(),
        }
    }

    /// Begin a login attempt
    ///
    /// Stores a fresh PKCE bundle in the session and returns the authorize
    /// URL to redirect the browser to.
    pub fn start_login(&self, session: &dyn SessionStore, clock: &dyn Clock) -> Result<String> {
        let state = pkce::generate_state(pkce::STATE_BYTES)?;
        let code_verifier = pkce::generate_code_verifier(pkce::VERIFIER_LENGTH)?;
        let code_challenge = pkce::code_challenge(&code_verifier);
        let nonce = pkce::generate_state(pkce::NONCE_BYTES)?;

        let bundle = PkceSession {
            state: state.clone(),
            code_verifier,
            nonce: nonce.clone(),
            created_at: clock.now_secs(),
        };
        session_put(session, PKCE_SESSION_KEY, &bundle)?;

        Ok(self.client.build_authorize_url(&state, &code_challenge, &nonce))
    }

    /// Complete a login attempt from the provider callback
    ///
    /// On success the session holds the token response under `tokens` and
    /// the verified claims under `user`. On failure a one-shot message is
    /// stored under `auth_error` and the error is returned.
    pub fn handle_callback(
        &self,
        params: &CallbackParams,
        session: &dyn SessionStore,
        http: &dyn HttpClient,
        clock: &dyn Clock,
    ) -> Result<Claims> {
        match self.run_callback(params, session, http, clock) {
            Ok(claims) => Ok(claims),
            Err(err) => {
                tracing::warn!(error = %err, "login callback failed");
                let _ = session_put(session, AUTH_ERROR_KEY, &flash_message(&err));
                Err(err)
            }
        }
    }

    fn run_callback(
        &self,
        params: &CallbackParams,
        session: &dyn SessionStore,
        http: &dyn HttpClient,
        clock: &dyn Clock,
    ) -> Result<Claims> {
        // The bundle is consumed up front: whatever happens below, this
        // callback can never be replayed.
        let bundle: Option<PkceSession> = session_take(session, PKCE_SESSION_KEY)?;
        let bundle = bundle
            .filter(|b| !b.state.is_empty() && !b.code_verifier.is_empty() && !b.nonce.is_empty())
            .ok_or_else(|| {
                AuthError::session_expired("Session expired or invalid login attempt. Please try again.")
            })?;

        if clock.now_secs().saturating_sub(bundle.created_at) > PKCE_MAX_AGE_SECS {
            return Err(AuthError::session_expired(
                "Login attempt expired. Please try again.",
            ));
        }

        let state = params.state.as_deref().unwrap_or("");
        if !constant_time_eq(state, &bundle.state) {
            return Err(AuthError::StateMismatch);
        }

        let code = params
            .code
            .as_deref()
            .ok_or(AuthError::MissingAuthorizationCode)?;

        let tokens = self
            .client
            .exchange_code_for_tokens(code, &bundle.code_verifier, http)?;

        let id_token = tokens
            .id_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::malformed_response("ID token missing in response"))?;

        let claims = self
            .verifier
            .verify(id_token, Some(&bundle.nonce), http, clock)?;

        session_put(session, TOKENS_KEY, &tokens)?;
        session_put(session, USER_KEY, &claims)?;

        Ok(claims)
    }

    /// End the local session and build the provider logout redirect
    ///
    /// Returns `None` when no id token was held; the caller then redirects
    /// locally instead of round-tripping through the provider.
    pub fn logout(&self, session: &dyn SessionStore) -> Result<Option<String>> {
        let tokens: Option<TokenResponse> = session_take(session, TOKENS_KEY)?;
        session.clear()?;

        Ok(tokens
            .and_then(|t| t.id_token)
            .filter(|t| !t.is_empty())
            .map(|id_token| {
                self.client
                    .build_logout_url(&id_token, &self.post_logout_redirect)
            }))
    }
}

/// User-facing message for a failed callback
///
/// A failed provider policy evaluation gets a remediation hint appended,
/// since the raw provider message gives the operator nothing to act on.
fn flash_message(err: &AuthError) -> String {
    let message = err.to_string();
    if message.to_lowercase().contains("policy evaluation failed") {
        format!(
            "{} Ensure the Okta user is assigned to the application and that any sign-on policies allow this flow.",
            message
        )
    } else {
        message
    }
}

/// Constant-time string comparison for the CSRF state value
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
