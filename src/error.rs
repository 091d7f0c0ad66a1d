//! Custom error types for gist-shell
//!
//! User-friendly error messages for all failure scenarios.

use thiserror::Error;

/// Main error type for the gist-shell application
#[derive(Error, Debug)]
pub enum GistError {
    /// A credential set with this name already exists in the vault
    #[error("Credentials named '{0}' already exist in the vault.\n\n  → Pass --default to replace them, or choose a different --name.")]
    VaultConflict(String),

    /// The vault file (or one of its entries) is not valid
    #[error("The credential vault is corrupt: {0}\n\n  → Re-run 'gist auth login --default' to rebuild it.")]
    VaultMalformed(String),

    /// A credential set or other local resource does not exist
    #[error("{0} not found.")]
    NotFound(String),

    /// No credentials available at all
    #[error("You are not logged in to GitHub.\n\n  → Run 'gist auth login' to create a token, or set GITHUB_TOKEN.")]
    NotAuthenticated,

    /// GitHub rejected the credentials
    #[error("GitHub authentication failed: {0}\n\n  → Check your username and password (or token).")]
    AuthenticationFailed(String),

    /// The account has two-factor authentication enabled
    #[error("GitHub requires a two-factor authentication code.\n\n  → Pass the one-time password with --otp.")]
    OtpRequired,

    /// API rate limit exhausted
    #[error("GitHub API rate limit exceeded.\n\n  → Wait a few minutes, or authenticate to get a higher limit.")]
    RateLimited,

    /// The requested remote resource does not exist (or is not visible)
    #[error("GitHub resource not found: {0}\n\n  → The gist may be private or may have been deleted.")]
    RemoteNotFound(String),

    /// Non-success HTTP status from the GitHub API
    #[error("GitHub API request failed ({status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// A paginated listing stopped because a later page failed
    #[error("Listing aborted at page {page} (HTTP {status}); partial results were discarded.")]
    PageAborted {
        /// Page number that failed
        page: u32,
        /// HTTP status code of the failed page
        status: u16,
    },

    /// External git command failed
    #[error("Git operation failed: {0}\n\n  → Make sure 'git' is installed and on your PATH.")]
    Git(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid API base URL
    #[error("Invalid API URL: {0}\n\n  → Expected something like https://api.github.com or https://ghe.example.com/api/v3")]
    InvalidUrl(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Network request error
    #[error("Network request failed: {0}\n\n  → Check your internet connection.")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),
}

impl From<toml::de::Error> for GistError {
    fn from(err: toml::de::Error) -> Self {
        GistError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for GistError {
    fn from(err: toml::ser::Error) -> Self {
        GistError::Toml(err.to_string())
    }
}

impl From<url::ParseError> for GistError {
    fn from(err: url::ParseError) -> Self {
        GistError::InvalidUrl(err.to_string())
    }
}

/// Result type alias using GistError
pub type Result<T> = std::result::Result<T, GistError>;
