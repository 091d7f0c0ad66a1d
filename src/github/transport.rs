//! HTTP transport for the GitHub REST API
//!
//! Requests are plain values: every [`ApiRequest`] carries its own [`Auth`],
//! headers and query string, so nothing leaks from one call into the next.
//! The [`Transport`] trait is the seam between the API handlers and the
//! network; [`ReqwestTransport`] is the production implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Result;

/// User agent sent with every request (GitHub rejects requests without one)
pub const USER_AGENT: &str = concat!("gist-shell/", env!("CARGO_PKG_VERSION"));

/// Header carrying the two-factor one-time password
pub const OTP_HEADER: &str = "X-GitHub-OTP";

/// Credentials attached to a single request
#[derive(Debug, Clone, Default)]
pub enum Auth {
    /// Anonymous request
    #[default]
    None,
    /// HTTP Basic authentication (used to create authorizations)
    Basic {
        username: String,
        password: SecretString,
    },
    /// `Authorization: token <value>` (used for gist operations)
    Token(SecretString),
}

impl Auth {
    /// Build token auth from an optional token
    pub fn from_token(token: Option<SecretString>) -> Self {
        token.map(Auth::Token).unwrap_or_default()
    }

    /// Whether the request carries any credentials
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Auth::None)
    }
}

/// A fully described API request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub auth: Auth,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            query: Vec::new(),
            auth: Auth::None,
            body: None,
        }
    }

    /// Set a header, replacing any previous value with the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Set a query parameter, replacing any previous value with the same key
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        self.query.retain(|(existing, _)| existing != &key);
        self.query.push((key, value.to_string()));
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Attach the one-time password header when a code is given
    pub fn otp(self, otp: Option<&str>) -> Self {
        match otp {
            Some(code) => self.header(OTP_HEADER, code),
            None => self,
        }
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header value (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Look up a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }
}

/// A received API response, body fully read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Header value as a string, if present and valid
    pub fn header(&self, name: impl reqwest::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends API requests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Transport backed by a shared `reqwest` client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut builder = self.client.request(request.method, request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.auth {
            Auth::None => builder,
            Auth::Basic { username, password } => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
            Auth::Token(token) => {
                builder.header(AUTHORIZATION, format!("token {}", token.expose_secret()))
            }
        };

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
