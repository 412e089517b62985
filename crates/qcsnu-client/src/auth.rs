//! Authentication types.
//!
//! The service issues an opaque token from `POST /api/token/` in exchange for
//! a username and password. The client never inspects the token; it is sent
//! verbatim as `Authorization: Token <token>` on every request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token endpoint path.
pub const TOKEN_ENDPOINT: &str = "/api/token/";

/// Scheme used in the `Authorization` header.
const AUTH_SCHEME: &str = "Token";

/// Opaque authentication token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token string.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value of the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("{AUTH_SCHEME} {}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Username/password pair sent to the token endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Response from `POST /api/token/`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
