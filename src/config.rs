//! Configuration loaded from the process environment

use crate::error::{AuthError, Result};
use crate::platform::Environment;

/// Maximum age of a PKCE login attempt before the callback is rejected
pub const PKCE_MAX_AGE_SECS: u64 = 600;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// OIDC client ID issued by the provider
    pub client_id: String,
    /// Issuer base URL, trailing slash stripped (e.g. "https://example.okta.com/oauth2/default")
    pub issuer: String,
    /// Redirect URI registered for the authorization callback
    pub redirect_uri: String,
    /// Requested scopes, space-joined on output
    pub scopes: Vec<String>,
    /// Where the provider sends the browser after logout
    pub post_logout_redirect: String,
    /// Session cookie lifetime in seconds (consumed by the session layer)
    pub session_cookie_lifetime: u64,
}

impl Config {
    /// Load configuration from the platform environment
    ///
    /// `OKTA_CLIENT_ID` and `OKTA_ISSUER` are required; the remaining
    /// variables fall back to local-development defaults.
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let client_id = env
            .get_var("OKTA_CLIENT_ID")
            .map_err(|_| AuthError::config("OKTA_CLIENT_ID not configured"))?;
        let issuer = env
            .get_var("OKTA_ISSUER")
            .map_err(|_| AuthError::config("OKTA_ISSUER not configured"))?;
        validate_issuer_url(&issuer)?;

        let redirect_uri = env
            .get_var("OKTA_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:8000/auth/callback".to_string());
        let scopes = parse_scopes(
            &env.get_var("OKTA_SCOPES")
                .unwrap_or_else(|_| "openid profile email".to_string()),
        );
        let post_logout_redirect = env
            .get_var("OKTA_POST_LOGOUT_REDIRECT")
            .unwrap_or_else(|_| "http://localhost:8000/".to_string());
        let session_cookie_lifetime = env
            .get_var("SESSION_COOKIE_LIFETIME")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        Ok(Self {
            client_id,
            issuer: issuer.trim_end_matches('/').to_string(),
            redirect_uri,
            scopes,
            post_logout_redirect,
            session_cookie_lifetime,
        })
    }
}

/// Split a space-separated scope list, dropping empty entries
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(' ')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate issuer URL format per RFC 8414 and OpenID Connect Core 1.0
fn validate_issuer_url(issuer: &str) -> Result<()> {
    let url = url::Url::parse(issuer).map_err(|_| AuthError::config("invalid issuer URL"))?;

    let is_localhost = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1") | Some("::1"));
    if url.scheme() != "https" && !is_localhost {
        return Err(AuthError::config("issuer must use HTTPS"));
    }

    if url.query().is_some() {
        return Err(AuthError::config("issuer URL must not have query string"));
    }

    if url.fragment().is_some() {
        return Err(AuthError::config("issuer URL must not have fragment"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockEnv;
    use std::collections::HashMap;

    fn env_with(vars: &[(&str, &str)]) -> MockEnv {
        MockEnv::new(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn test_from_env_applies_defaults() {
        let env = env_with(&[
            ("OKTA_CLIENT_ID", "abc123"),
            ("OKTA_ISSUER", "https://example.okta.com/oauth2/default"),
        ]);

        let config = Config::from_env(&env).unwrap();
        assert_eq!(config.client_id, "abc123");
        assert_eq!(config.issuer, "https://example.okta.com/oauth2/default");
        assert_eq!(config.redirect_uri, "http://localhost:8000/auth/callback");
        assert_eq!(config.scopes, vec!["openid", "profile", "email"]);
        assert_eq!(config.post_logout_redirect, "http://localhost:8000/");
        assert_eq!(config.session_cookie_lifetime, 3600);
    }

    #[test]
    fn test_from_env_strips_trailing_slash_from_issuer() {
        let env = env_with(&[
            ("OKTA_CLIENT_ID", "abc123"),
            ("OKTA_ISSUER", "https://example.okta.com/oauth2/default/"),
        ]);

        let config = Config::from_env(&env).unwrap();
        assert_eq!(config.issuer, "https://example.okta.com/oauth2/default");
    }

    #[test]
    fn test_from_env_requires_client_id_and_issuer() {
        let env = env_with(&[("OKTA_ISSUER", "https://example.okta.com")]);
        assert!(Config::from_env(&env).is_err());

        let env = env_with(&[("OKTA_CLIENT_ID", "abc123")]);
        assert!(Config::from_env(&env).is_err());
    }

    #[test]
    fn test_from_env_rejects_plain_http_issuer() {
        let env = env_with(&[
            ("OKTA_CLIENT_ID", "abc123"),
            ("OKTA_ISSUER", "http://example.okta.com"),
        ]);
        assert!(Config::from_env(&env).is_err());

        // localhost is allowed for development
        let env = env_with(&[
            ("OKTA_CLIENT_ID", "abc123"),
            ("OKTA_ISSUER", "http://localhost:9090"),
        ]);
        assert!(Config::from_env(&env).is_ok());
    }

    #[test]
    fn test_parse_scopes_trims_and_drops_empties() {
        assert_eq!(
            parse_scopes("openid   profile  email "),
            vec!["openid", "profile", "email"]
        );
        assert_eq!(parse_scopes(""), Vec::<String>::new());
    }

    #[test]
    fn test_custom_scopes_and_lifetime() {
        let env = env_with(&[
            ("OKTA_CLIENT_ID", "abc123"),
            ("OKTA_ISSUER", "https://example.okta.com"),
            ("OKTA_SCOPES", "openid groups"),
            ("SESSION_COOKIE_LIFETIME", "7200"),
        ]);

        let config = Config::from_env(&env).unwrap();
        assert_eq!(config.scopes, vec!["openid", "groups"]);
        assert_eq!(config.session_cookie_lifetime, 7200);
    }
}
