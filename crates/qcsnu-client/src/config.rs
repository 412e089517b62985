//! Client configuration.
//!
//! Resolved once, at client construction:
//!
//! | Setting | Explicit | Environment | Default |
//! |---------|----------|-------------|---------|
//! | base URL | `base_url` argument | `QCSNU_BASE_URL` | `http://localhost:8000` |
//! | token | `token` argument | `QCSNU_TOKEN` | none |
//!
//! The environment is never re-read after construction.

use std::fmt;
use std::time::Duration;

use crate::auth::Token;

/// Default service URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "QCSNU_BASE_URL";

/// Environment variable holding a pre-issued token.
pub const TOKEN_ENV: &str = "QCSNU_TOKEN";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a [`QuantumClient`](crate::QuantumClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Service base URL, without trailing slash.
    pub base_url: String,
    /// Token to authenticate with, if already known.
    pub token: Option<Token>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            verify_tls: true,
        }
    }
}

impl ClientConfig {
    /// Resolve configuration purely from the environment.
    pub fn from_env() -> Self {
        Self::resolve(None, None)
    }

    /// Resolve configuration, preferring explicit values over the environment.
    pub fn resolve(base_url: Option<String>, token: Option<String>) -> Self {
        Self::resolve_with(base_url, token, |key| std::env::var(key).ok())
    }

    /// Like [`resolve`](Self::resolve), reading variables through `lookup`.
    pub fn resolve_with(
        base_url: Option<String>,
        token: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let base_url = base_url
            .or_else(|| lookup(BASE_URL_ENV))
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = token
            .or_else(|| lookup(TOKEN_ENV))
            .filter(|t| !t.trim().is_empty())
            .map(Token::new);

        Self {
            base_url: normalize_base_url(&base_url),
            token,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }

    pub fn with_token(mut self, token: impl Into<Token>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| {
            owned
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_explicit_wins_over_env() {
        let config = ClientConfig::resolve_with(
            Some("https://qc.example.org/".into()),
            Some("explicit".into()),
            env(&[(BASE_URL_ENV, "http://env:9000"), (TOKEN_ENV, "from-env")]),
        );
        assert_eq!(config.base_url, "https://qc.example.org");
        assert_eq!(config.token, Some(Token::new("explicit")));
    }

    #[test]
    fn test_env_fallback() {
        let config = ClientConfig::resolve_with(
            None,
            None,
            env(&[(BASE_URL_ENV, "http://0.0.0.0:8000"), (TOKEN_ENV, "from-env")]),
        );
        assert_eq!(config.base_url, "http://0.0.0.0:8000");
        assert_eq!(config.token, Some(Token::new("from-env")));
    }

    #[test]
    fn test_default_when_unset() {
        let config = ClientConfig::resolve_with(None, None, env(&[]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.token.is_none());
        assert!(config.verify_tls);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_blank_values_ignored() {
        let config =
            ClientConfig::resolve_with(None, None, env(&[(BASE_URL_ENV, "  "), (TOKEN_ENV, "")]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::default().with_token("s3cret");
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
