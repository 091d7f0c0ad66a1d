//! GitHub API client
//!
//! Resolves endpoint URLs against a configurable base (api.github.com or a
//! GitHub Enterprise `/api/v3` root) and dispatches requests through a
//! [`Transport`].

use reqwest::{Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::{GistError, Result};
use crate::github::error_handler::classify_response;
use crate::github::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

/// Default API root
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub API client
pub struct GitHubClient {
    transport: Box<dyn Transport>,
    api_url: Url,
}

impl GitHubClient {
    /// Create a client talking to `api_url` over HTTPS
    pub fn new(api_url: &str) -> Result<Self> {
        Self::with_transport(api_url, ReqwestTransport::new()?)
    }

    /// Create a client with a custom transport
    pub fn with_transport(api_url: &str, transport: impl Transport + 'static) -> Result<Self> {
        Ok(Self {
            transport: Box::new(transport),
            api_url: parse_api_url(api_url)?,
        })
    }

    /// Build the URL for a path below the API root
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| GistError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request for a path below the API root
    pub fn request(&self, method: Method, segments: &[&str]) -> Result<ApiRequest> {
        Ok(ApiRequest::new(method, self.endpoint(segments)?))
    }

    /// Send a request and return the response whatever its status
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(request).await?;
        debug!(status = %response.status, "received response");
        Ok(response)
    }

    /// Send a request, failing unless the response has the expected status
    pub async fn send_expecting(
        &self,
        request: ApiRequest,
        expected: StatusCode,
    ) -> Result<ApiResponse> {
        let response = self.send(request).await?;
        if response.status != expected {
            return Err(classify_response(&response));
        }
        Ok(response)
    }
}

/// Validate an API root URL and normalize it
pub fn parse_api_url(api_url: &str) -> Result<Url> {
    let mut url = Url::parse(api_url.trim())?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(GistError::InvalidUrl(api_url.to_string()));
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
