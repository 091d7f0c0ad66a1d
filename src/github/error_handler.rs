//! GitHub API error detection and classification
//!
//! Turns non-success responses into a more specific `GistError` so the CLI
//! can give actionable guidance (two-factor codes, rate limits, missing gists).

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::GistError;
use crate::github::transport::{ApiResponse, OTP_HEADER};

/// Pattern matching GitHub's rate-limit messages
static RATE_LIMIT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)rate limit (exceeded|reached)")
        .expect("Invalid regex pattern for rate limit detection")
});

/// Error body returned by the GitHub API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Classifies a non-success response into a GistError
pub fn classify_response(response: &ApiResponse) -> GistError {
    let message = extract_message(&response.body);

    match response.status {
        StatusCode::UNAUTHORIZED if requires_otp(response) => GistError::OtpRequired,
        StatusCode::UNAUTHORIZED => GistError::AuthenticationFailed(message),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
            if is_rate_limited(response, &message) =>
        {
            GistError::RateLimited
        }
        StatusCode::NOT_FOUND => GistError::RemoteNotFound(message),
        status => GistError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull the `message` field out of an error body, falling back to the raw text
fn extract_message(body: &str) -> String {
    if let Ok(error) = serde_json::from_str::<ErrorBody>(body) {
        return error.message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details provided".to_string()
    } else {
        trimmed.to_string()
    }
}

/// GitHub answers `X-GitHub-OTP: required; <method>` when a 2FA code is missing
fn requires_otp(response: &ApiResponse) -> bool {
    response
        .header(OTP_HEADER)
        .map(|value| value.trim_start().starts_with("required"))
        .unwrap_or(false)
}

/// Check if a response is a rate limit rejection
fn is_rate_limited(response: &ApiResponse, message: &str) -> bool {
    response.header("x-ratelimit-remaining") == Some("0") || RATE_LIMIT_PATTERN.is_match(message)
}
