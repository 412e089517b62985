//! Transport gateway: authenticated request/response calls.
//!
//! The job lifecycle only needs one narrow operation, [`Transport::send`],
//! which takes a method, a path relative to the service base URL, optional
//! query parameters, an optional JSON body and the caller's token, and returns
//! the status code with the parsed JSON body. [`HttpTransport`] implements it
//! with `reqwest`; tests substitute an in-memory fake.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::auth::Token;
use crate::config::ClientConfig;

/// User-Agent sent with requests.
const USER_AGENT: &str = concat!("qcsnu-rs/", env!("CARGO_PKG_VERSION"));

/// Transport-level failure: the request did not produce an HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Error raised by the HTTP client (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token cannot be encoded as a header value.
    #[error("Invalid authorization header")]
    InvalidHeader,

    /// Connection-level failure reported by a non-reqwest transport.
    #[error("Connection failed: {0}")]
    Connection(String),
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A request to the service.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path relative to the base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<Token>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            token: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_token(mut self, token: Option<Token>) -> Self {
        self.token = token;
        self
    }
}

/// Status code and parsed body of a service response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Parsed JSON body. An empty body is `Null`; a non-JSON body is
    /// `{"message": <text>}`.
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The transport gateway consumed by the client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request. Only failures to obtain a response are errors;
    /// every HTTP status, including 4xx and 5xx, is returned as a `Response`.
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: Client,
    /// Base URL without trailing slash.
    base_url: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpTransport {
    /// Build a transport from client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.token {
            let value = header::HeaderValue::from_str(&token.header_value())
                .map_err(|_| TransportError::InvalidHeader)?;
            builder = builder.header(header::AUTHORIZATION, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        debug!(status, bytes = text.len(), "Response received");

        Ok(Response::new(status, parse_body(&text)))
    }
}

/// Parse a response body, wrapping non-JSON text as `{"message": text}`.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "message": text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_json() {
        let body = parse_body(r#"{"token": "abc"}"#);
        assert_eq!(body["token"], "abc");
    }

    #[test]
    fn test_parse_body_text_and_empty() {
        assert_eq!(parse_body("   "), Value::Null);
        assert_eq!(parse_body("Bad Gateway")["message"], "Bad Gateway");
    }

    #[test]
    fn test_request_builder() {
        let req = Request::get("/api/runner/jobs/")
            .with_query("status", "running")
            .with_token(Some(Token::new("secret")));
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.query, vec![("status".into(), "running".into())]);
        assert!(!format!("{req:?}").contains("secret"));
    }

    #[test]
    fn test_response_success_range() {
        assert!(Response::new(201, Value::Null).is_success());
        assert!(!Response::new(404, Value::Null).is_success());
    }

    #[test]
    fn test_http_transport_from_default_config() {
        let config = ClientConfig::default();
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000");
        assert!(format!("{transport:?}").contains("localhost"));
    }
}
