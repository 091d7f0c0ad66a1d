//! Gist operations
//!
//! CRUD, starring, forking and history for gists, plus the primary email
//! lookup used when pushing files through git.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, CONTENT_LENGTH};
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::identity;
use crate::error::{GistError, Result};
use crate::github::client::GitHubClient;
use crate::github::error_handler::classify_response;
use crate::github::pagination::{PageCursor, Paginator};
use crate::github::transport::{ApiRequest, Auth};

/// Media types for gist payloads (raw file contents, base64 for binaries)
const GIST_MEDIA_TYPE: &str = "application/vnd.github.v3.raw+json,application/vnd.github.v3.base64+json";

/// Media type for the user email listing
const EMAIL_MEDIA_TYPE: &str = "application/vnd.github.v3.json";

/// A gist
#[derive(Debug, Clone, Deserialize)]
pub struct Gist {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
    pub html_url: String,
    /// Clone URL of the backing repository
    pub git_pull_url: String,
    /// Push URL of the backing repository
    pub git_push_url: String,
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
    #[serde(default)]
    pub owner: Option<GistOwner>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A file inside a gist
#[derive(Debug, Clone, Deserialize)]
pub struct GistFile {
    pub filename: String,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub raw_url: Option<String>,
    #[serde(default)]
    pub size: u64,
    /// Only present when fetching a single gist
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub truncated: bool,
}

/// Owner of a gist, commit or fork
#[derive(Debug, Clone, Deserialize)]
pub struct GistOwner {
    pub login: String,
}

/// A revision of a gist
#[derive(Debug, Clone, Deserialize)]
pub struct GistCommit {
    pub version: String,
    pub committed_at: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub change_status: ChangeStatus,
    #[serde(default)]
    pub user: Option<GistOwner>,
}

/// Line counts of a revision
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ChangeStatus {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub total: u64,
}

/// A fork of a gist
#[derive(Debug, Clone, Deserialize)]
pub struct GistFork {
    pub id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<GistOwner>,
}

/// An email address of the authenticated user
#[derive(Debug, Clone, Deserialize)]
pub struct UserEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Content of a file in a new gist
#[derive(Debug, Clone, Serialize)]
pub struct FileContent {
    pub content: String,
}

/// Change to an existing file; a rename when `filename` is set
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Changes for an update; `None` deletes the file
pub type FileChanges = BTreeMap<String, Option<FileChange>>;

/// Filters for listing gists
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// List the public gists of this user
    pub user: Option<String>,
    /// List the authenticated user's starred gists
    pub starred: bool,
    /// Only gists updated after this time
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct CreateGistRequest<'a> {
    description: String,
    public: bool,
    files: BTreeMap<&'a str, FileContent>,
}

#[derive(Debug, Serialize)]
struct UpdateGistRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    files: &'a FileChanges,
}

/// Description used when a gist is created without one
pub fn default_description() -> String {
    description_for(&identity::host_name(), &identity::user_name(), Utc::now())
}

fn description_for(host: &str, user: &str, at: DateTime<Utc>) -> String {
    format!(
        "Created using gist-shell from {} by {} at {} UTC.",
        host,
        user,
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Gist operations handler
pub struct GistHandler<'a> {
    client: &'a GitHubClient,
    auth: Auth,
    cursor: PageCursor,
}

impl<'a> GistHandler<'a> {
    /// Create a handler; without a token only public data is reachable
    pub fn new(client: &'a GitHubClient, token: Option<SecretString>) -> Self {
        Self {
            client,
            auth: Auth::from_token(token),
            cursor: PageCursor::default(),
        }
    }

    /// Pagination bounds for listings
    pub fn with_cursor(mut self, cursor: PageCursor) -> Self {
        self.cursor = cursor;
        self
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<ApiRequest> {
        Ok(self
            .client
            .request(method, segments)?
            .header(ACCEPT.as_str(), GIST_MEDIA_TYPE)
            .auth(self.auth.clone()))
    }

    fn require_auth(&self) -> Result<()> {
        if self.auth.is_authenticated() {
            Ok(())
        } else {
            Err(GistError::NotAuthenticated)
        }
    }

    /// Endpoint for a listing
    fn list_route(&self, options: &ListOptions) -> Result<Vec<String>> {
        let route: Vec<&str> = match (options.user.as_deref(), options.starred) {
            (Some(_), true) => {
                return Err(GistError::InvalidInput(
                    "Starred gists can only be listed for the authenticated user.".into(),
                ))
            }
            (None, true) => {
                self.require_auth()?;
                vec!["gists", "starred"]
            }
            (Some(user), false) => vec!["users", user, "gists"],
            (None, false) if self.auth.is_authenticated() => vec!["gists"],
            (None, false) => vec!["gists", "public"],
        };
        Ok(route.into_iter().map(String::from).collect())
    }

    /// List gists
    ///
    /// Anonymous calls list public gists, authenticated calls the user's own.
    #[instrument(skip(self))]
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Gist>> {
        let route = self.list_route(options)?;
        let segments: Vec<&str> = route.iter().map(String::as_str).collect();

        let mut request = self.request(Method::GET, &segments)?;
        if let Some(since) = options.since {
            request = request.query("since", since.format("%Y-%m-%dT%H:%M:%SZ"));
        }

        Paginator::new(self.client, self.cursor).collect(request).await
    }

    /// Fetch a gist, optionally at a specific revision
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str, revision: Option<&str>) -> Result<Gist> {
        let mut segments = vec!["gists", id];
        segments.extend(revision);

        let request = self.request(Method::GET, &segments)?;
        self.client
            .send_expecting(request, StatusCode::OK)
            .await?
            .json()
    }

    /// Create a gist from `filename -> content`
    #[instrument(skip(self, files))]
    pub async fn create(
        &self,
        files: &BTreeMap<String, String>,
        description: Option<&str>,
        public: bool,
    ) -> Result<Gist> {
        self.require_auth()?;
        if files.is_empty() {
            return Err(GistError::InvalidInput("A gist needs at least one file.".into()));
        }

        let payload = CreateGistRequest {
            description: description
                .map(String::from)
                .unwrap_or_else(default_description),
            public,
            files: files
                .iter()
                .map(|(name, content)| {
                    (
                        name.as_str(),
                        FileContent {
                            content: content.clone(),
                        },
                    )
                })
                .collect(),
        };

        let request = self
            .request(Method::POST, &["gists"])?
            .json(serde_json::to_value(&payload)?);

        self.client
            .send_expecting(request, StatusCode::CREATED)
            .await?
            .json()
    }

    /// Edit, rename or delete files of a gist and change its description
    #[instrument(skip(self, files))]
    pub async fn update(
        &self,
        id: &str,
        files: &FileChanges,
        description: Option<&str>,
    ) -> Result<Gist> {
        self.require_auth()?;

        let payload = UpdateGistRequest { description, files };
        let request = self
            .request(Method::PATCH, &["gists", id])?
            .json(serde_json::to_value(&payload)?);

        self.client
            .send_expecting(request, StatusCode::OK)
            .await?
            .json()
    }

    /// Delete a gist
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.require_auth()?;
        let request = self.request(Method::DELETE, &["gists", id])?;
        self.client
            .send_expecting(request, StatusCode::NO_CONTENT)
            .await?;
        Ok(())
    }

    /// Star a gist
    #[instrument(skip(self))]
    pub async fn star(&self, id: &str) -> Result<()> {
        self.require_auth()?;
        let request = self
            .request(Method::PUT, &["gists", id, "star"])?
            .header(CONTENT_LENGTH.as_str(), "0");
        self.client
            .send_expecting(request, StatusCode::NO_CONTENT)
            .await?;
        Ok(())
    }

    /// Unstar a gist
    #[instrument(skip(self))]
    pub async fn unstar(&self, id: &str) -> Result<()> {
        self.require_auth()?;
        let request = self.request(Method::DELETE, &["gists", id, "star"])?;
        self.client
            .send_expecting(request, StatusCode::NO_CONTENT)
            .await?;
        Ok(())
    }

    /// Whether the authenticated user has starred a gist
    #[instrument(skip(self))]
    pub async fn is_starred(&self, id: &str) -> Result<bool> {
        self.require_auth()?;
        let request = self.request(Method::GET, &["gists", id, "star"])?;
        let response = self.client.send(request).await?;

        match response.status {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(classify_response(&response)),
        }
    }

    /// Fork a gist into the authenticated user's account
    #[instrument(skip(self))]
    pub async fn fork(&self, id: &str) -> Result<Gist> {
        self.require_auth()?;
        let request = self.request(Method::POST, &["gists", id, "forks"])?;
        self.client
            .send_expecting(request, StatusCode::CREATED)
            .await?
            .json()
    }

    /// Revision history of a gist
    #[instrument(skip(self))]
    pub async fn commits(&self, id: &str) -> Result<Vec<GistCommit>> {
        let request = self.request(Method::GET, &["gists", id, "commits"])?;
        Paginator::new(self.client, self.cursor).collect(request).await
    }

    /// Forks of a gist
    #[instrument(skip(self))]
    pub async fn forks(&self, id: &str) -> Result<Vec<GistFork>> {
        let request = self.request(Method::GET, &["gists", id, "forks"])?;
        Paginator::new(self.client, self.cursor).collect(request).await
    }

    /// Primary email address of the authenticated user, if any
    #[instrument(skip(self))]
    pub async fn primary_email(&self) -> Result<Option<String>> {
        self.require_auth()?;
        let request = self
            .request(Method::GET, &["user", "emails"])?
            .header(ACCEPT.as_str(), EMAIL_MEDIA_TYPE);

        let mut primary = None;
        Paginator::new(self.client, self.cursor)
            .walk(request, |email: UserEmail| {
                if email.primary {
                    primary = Some(email.email);
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await?;

        debug!(found = primary.is_some(), "primary email lookup");
        Ok(primary)
    }
}
