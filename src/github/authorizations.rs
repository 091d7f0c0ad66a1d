//! Personal access tokens through the OAuth Authorizations API
//!
//! Tokens are created with HTTP Basic authentication (plus an optional
//! two-factor code), scoped to `gist`, and tagged with a `gist-shell` note so
//! later listings and deletions only touch tokens this tool created.

use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::{debug, instrument, warn};

use crate::core::identity;
use crate::core::vault::Credentials;
use crate::error::Result;
use crate::github::client::GitHubClient;
use crate::github::error_handler::classify_response;
use crate::github::pagination::{PageCursor, Paginator};
use crate::github::transport::{ApiRequest, Auth};

/// Note marking authorizations created by gist-shell
pub const NOTE_MARKER: &str = "gist-shell";

/// Project URL attached to created authorizations
pub const NOTE_URL: &str = "https://github.com/clickyotomy/gist-shell";

/// Scopes requested for new tokens
pub const SCOPES: &[&str] = &["gist"];

/// Media type for the Authorizations API
const AUTHORIZATIONS_MEDIA_TYPE: &str = "application/vnd.github.damage-preview+json";

/// An OAuth authorization as returned by GitHub
#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    pub id: u64,
    /// Only populated in the creation response
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub note_url: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub app: AuthorizationApp,
}

/// Application an authorization belongs to
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationApp {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl Authorization {
    /// Whether the note marks this authorization as created by gist-shell
    pub fn is_gist_shell(&self) -> bool {
        self.note
            .as_deref()
            .map(|note| note.starts_with(NOTE_MARKER))
            .unwrap_or(false)
    }

    /// The parts of this authorization kept in the vault
    pub fn to_credentials(&self, username: &str) -> Credentials {
        Credentials {
            created_at: self.created_at.clone(),
            id: Some(self.id),
            token: self.token.clone(),
            username: Some(username.to_string()),
        }
    }
}

/// Body of an authorization creation request
#[derive(Debug, Serialize)]
struct CreateAuthorizationRequest<'a> {
    note: String,
    note_url: &'a str,
    scopes: &'a [&'a str],
    fingerprint: String,
}

/// Build a token note from free-form words
///
/// `"Work Laptop"` becomes `gist-shell-work-laptop`; no words gives the bare marker.
pub fn build_note(words: &str) -> String {
    let lowered = words.to_lowercase().replace('-', " ");
    let parts: Vec<&str> = lowered.split_whitespace().collect();

    if parts.is_empty() {
        return NOTE_MARKER.to_string();
    }

    std::iter::once(NOTE_MARKER)
        .chain(parts)
        .collect::<Vec<_>>()
        .join("-")
}

/// Generate a fingerprint distinguishing tokens created from this machine
///
/// Format: `<sha1-hex>; <user>; <host>; <unix-timestamp>`.
pub fn generate_fingerprint() -> String {
    let details = format!("{}; {}", identity::user_name(), identity::host_name());
    fingerprint_for(&details, Utc::now().timestamp())
}

fn fingerprint_for(details: &str, timestamp: i64) -> String {
    let digest = Sha1::digest(format!("{}--{}", details, timestamp).as_bytes());
    format!("{}; {}; {}", hex::encode(digest), details, timestamp)
}

/// Authorizations API handler
pub struct AuthorizationHandler<'a> {
    client: &'a GitHubClient,
    auth: Auth,
    otp: Option<String>,
    cursor: PageCursor,
}

impl<'a> AuthorizationHandler<'a> {
    /// Create a handler authenticating with `username` and `password`
    pub fn new(
        client: &'a GitHubClient,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            client,
            auth: Auth::Basic {
                username: username.into(),
                password,
            },
            otp: None,
            cursor: PageCursor::default(),
        }
    }

    /// Send a two-factor one-time password with every request
    pub fn with_otp(mut self, otp: Option<String>) -> Self {
        self.otp = otp;
        self
    }

    /// Pagination bounds for listing all authorizations
    pub fn with_cursor(mut self, cursor: PageCursor) -> Self {
        self.cursor = cursor;
        self
    }

    fn request(&self, method: Method, id: Option<u64>) -> Result<ApiRequest> {
        let id = id.map(|id| id.to_string());
        let mut segments = vec!["authorizations"];
        if let Some(id) = id.as_deref() {
            segments.push(id);
        }

        Ok(self
            .client
            .request(method, &segments)?
            .header(ACCEPT.as_str(), AUTHORIZATIONS_MEDIA_TYPE)
            .auth(self.auth.clone())
            .otp(self.otp.as_deref()))
    }

    /// Create a `gist`-scoped token; `words` extend the note
    #[instrument(skip(self))]
    pub async fn create(&self, words: &str) -> Result<Authorization> {
        let payload = CreateAuthorizationRequest {
            note: build_note(words),
            note_url: NOTE_URL,
            scopes: SCOPES,
            fingerprint: generate_fingerprint(),
        };

        let request = self
            .request(Method::POST, None)?
            .json(serde_json::to_value(&payload)?);

        let response = self
            .client
            .send_expecting(request, StatusCode::CREATED)
            .await?;

        response.json()
    }

    /// List gist-shell authorizations; all of them, or only those in `ids`
    ///
    /// Individual ids that cannot be fetched are skipped.
    #[instrument(skip(self))]
    pub async fn list(&self, ids: &[u64]) -> Result<Vec<Authorization>> {
        if ids.is_empty() {
            let all: Vec<Authorization> = Paginator::new(self.client, self.cursor)
                .collect(self.request(Method::GET, None)?)
                .await?;
            return Ok(all.into_iter().filter(Authorization::is_gist_shell).collect());
        }

        let mut found = Vec::new();
        for &id in ids {
            match self.get(id).await {
                Ok(authorization) if authorization.is_gist_shell() => found.push(authorization),
                Ok(authorization) => {
                    debug!(id, note = ?authorization.note, "skipping foreign authorization")
                }
                Err(e) => warn!(id, error = %e, "skipping authorization"),
            }
        }
        Ok(found)
    }

    async fn get(&self, id: u64) -> Result<Authorization> {
        let request = self.request(Method::GET, Some(id))?;
        let response = self.client.send(request).await?;
        if response.status != StatusCode::OK {
            return Err(classify_response(&response));
        }
        response.json()
    }

    /// Delete gist-shell authorizations (all, or those in `ids`)
    ///
    /// Returns `true` only if every targeted authorization was deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, ids: &[u64]) -> Result<bool> {
        let targets = self.list(ids).await?;
        let mut deleted = 0;

        for authorization in &targets {
            let request = self.request(Method::DELETE, Some(authorization.id))?;
            match self.client.send(request).await {
                Ok(response) if response.status == StatusCode::NO_CONTENT => deleted += 1,
                Ok(response) => {
                    warn!(id = authorization.id, status = %response.status, "delete rejected")
                }
                Err(e) => warn!(id = authorization.id, error = %e, "delete failed"),
            }
        }

        Ok(deleted == targets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GistError;
    use crate::github::client::GITHUB_API_URL;
    use crate::github::transport::{ApiResponse, MockTransport, OTP_HEADER};
    use reqwest::header::{HeaderName, HeaderValue};
    use secrecy::ExposeSecret;

    fn authorization_json(id: u64, note: &str) -> String {
        format!(
            r#"{{"id": {id}, "token": "", "note": "{note}", "scopes": ["gist"], "created_at": "2017-02-18T09:12:44Z", "app": {{"name": "{note} (API)", "url": "https://developer.github.com/v3/oauth_authorizations/"}}}}"#
        )
    }

    fn handler(client: &GitHubClient) -> AuthorizationHandler<'_> {
        AuthorizationHandler::new(client, "octocat", SecretString::from("hunter2"))
    }

    #[test]
    fn test_build_note() {
        assert_eq!(build_note(""), "gist-shell");
        assert_eq!(build_note("   "), "gist-shell");
        assert_eq!(build_note("Work Laptop"), "gist-shell-work-laptop");
        assert_eq!(build_note("ci-Runner  2"), "gist-shell-ci-runner-2");
    }

    #[test]
    fn test_fingerprint_format() {
        let fingerprint = fingerprint_for("alice; build.example.com", 1_700_000_000);
        assert_eq!(
            fingerprint,
            "143815c001ff132a941060b4e6d156e6528c59e4; alice; build.example.com; 1700000000"
        );
    }

    #[test]
    fn test_generated_fingerprint_has_four_parts() {
        let fingerprint = generate_fingerprint();
        let parts: Vec<&str> = fingerprint.split("; ").collect();
        assert!(parts.len() >= 4);
        assert_eq!(parts[0].len(), 40);
    }

    #[test]
    fn test_is_gist_shell() {
        let ours: Authorization =
            serde_json::from_str(&authorization_json(1, "gist-shell-laptop")).unwrap();
        let theirs: Authorization = serde_json::from_str(&authorization_json(2, "travis")).unwrap();
        assert!(ours.is_gist_shell());
        assert!(!theirs.is_gist_shell());
    }

    #[tokio::test]
    async fn test_create_sends_basic_auth_otp_and_payload() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                let body = req.body.as_ref().unwrap();
                req.method == Method::POST
                    && req.url.as_str() == "https://api.github.com/authorizations"
                    && matches!(&req.auth, Auth::Basic { username, password }
                        if username == "octocat" && password.expose_secret() == "hunter2")
                    && req.header_value(OTP_HEADER) == Some("123456")
                    && req.header_value("accept") == Some(AUTHORIZATIONS_MEDIA_TYPE)
                    && body["note"] == "gist-shell-laptop"
                    && body["scopes"] == serde_json::json!(["gist"])
                    && body["note_url"] == NOTE_URL
                    && body["fingerprint"].as_str().is_some()
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    StatusCode::CREATED,
                    r#"{"id": 77, "token": "ghp_new", "note": "gist-shell-laptop", "created_at": "2017-02-18T09:12:44Z", "app": {"name": "gist-shell-laptop (API)"}}"#,
                ))
            });
        let client = GitHubClient::with_transport(GITHUB_API_URL, transport).unwrap();

        let authorization = handler(&client)
            .with_otp(Some("123456".to_string()))
            .create("Laptop")
            .await
            .unwrap();

        assert_eq!(authorization.id, 77);
        let credentials = authorization.to_credentials("octocat");
        assert_eq!(credentials.token, "ghp_new");
        assert_eq!(credentials.username.as_deref(), Some("octocat"));
        assert_eq!(credentials.created_at.as_deref(), Some("2017-02-18T09:12:44Z"));
    }

    #[tokio::test]
    async fn test_create_requires_created_status() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            let body = r#"{"message": "Must specify two-factor authentication OTP code."}"#;
            Ok(ApiResponse::new(StatusCode::UNAUTHORIZED, body).with_header(
                HeaderName::from_static("x-github-otp"),
                HeaderValue::from_static("required; sms"),
            ))
        });
        let client = GitHubClient::with_transport(GITHUB_API_URL, transport).unwrap();

        let err = handler(&client).create("").await.unwrap_err();

        assert!(matches!(err, GistError::OtpRequired));
    }

    #[tokio::test]
    async fn test_list_all_filters_by_note() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.url.path() == "/authorizations" && req.query_value("page") == Some("1")
            })
            .times(1)
            .returning(|_| {
                let body = format!(
                    "[{}, {}, {}]",
                    authorization_json(1, "gist-shell"),
                    authorization_json(2, "travis"),
                    authorization_json(3, "gist-shell-work")
                );
                Ok(ApiResponse::new(StatusCode::OK, body))
            });
        let client = GitHubClient::with_transport(GITHUB_API_URL, transport).unwrap();

        let found = handler(&client).list(&[]).await.unwrap();

        let ids: Vec<u64> = found.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_list_by_ids_skips_failures() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(3).returning(|req| {
            let response = match req.url.path() {
                "/authorizations/1" => {
                    ApiResponse::new(StatusCode::OK, authorization_json(1, "gist-shell"))
                }
                "/authorizations/2" => {
                    ApiResponse::new(StatusCode::NOT_FOUND, r#"{"message": "Not Found"}"#)
                }
                _ => ApiResponse::new(StatusCode::OK, authorization_json(3, "travis")),
            };
            Ok(response)
        });
        let client = GitHubClient::with_transport(GITHUB_API_URL, transport).unwrap();

        let found = handler(&client).list(&[1, 2, 3]).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[tokio::test]
    async fn test_delete_reports_partial_failure() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(4).returning(|req| {
            let response = match (req.method.clone(), req.url.path()) {
                (Method::GET, "/authorizations/1") => {
                    ApiResponse::new(StatusCode::OK, authorization_json(1, "gist-shell"))
                }
                (Method::GET, _) => {
                    ApiResponse::new(StatusCode::OK, authorization_json(2, "gist-shell-x"))
                }
                (Method::DELETE, "/authorizations/1") => {
                    ApiResponse::new(StatusCode::NO_CONTENT, "")
                }
                _ => ApiResponse::new(StatusCode::FORBIDDEN, r#"{"message": "Forbidden"}"#),
            };
            Ok(response)
        });
        let client = GitHubClient::with_transport(GITHUB_API_URL, transport).unwrap();

        assert!(!handler(&client).delete(&[1, 2]).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_all_succeeds() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.method == Method::GET)
            .times(1)
            .returning(|_| {
                let body = format!(
                    "[{}, {}]",
                    authorization_json(5, "gist-shell"),
                    authorization_json(6, "gist-shell-ci")
                );
                Ok(ApiResponse::new(StatusCode::OK, body))
            });
        transport
            .expect_send()
            .withf(|req| req.method == Method::DELETE)
            .times(2)
            .returning(|_| Ok(ApiResponse::new(StatusCode::NO_CONTENT, "")));
        let client = GitHubClient::with_transport(GITHUB_API_URL, transport).unwrap();

        assert!(handler(&client).delete(&[]).await.unwrap());
    }
}
