//! Pushing files into a gist's backing repository
//!
//! The Gist API only accepts UTF-8 content. Binary files are uploaded by
//! cloning the gist with the system `git` binary, copying the files in,
//! committing and pushing back with the token as credentials.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tempfile::TempDir;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{GistError, Result};

/// Prefix of the placeholder file a gist is created with before a git upload
pub const STUB_PREFIX: &str = ".gist-shell-stub-";

/// Commit message of uploads
pub const COMMIT_MESSAGE: &str = "From gist-shell";

/// Password GitHub accepts alongside a token used as the basic-auth user
const TOKEN_PASSWORD: &str = "x-oauth-basic";

/// Placeholder file name and content for a gist awaiting a git upload
pub fn stub_file() -> (String, String) {
    let timestamp = Utc::now().timestamp();
    (
        format!("{}{}", STUB_PREFIX, timestamp),
        format!("gist-shell placeholder {}", timestamp),
    )
}

/// Push URL carrying the token as basic-auth credentials
pub fn authenticated_push_url(push_url: &str, token: &SecretString) -> Result<String> {
    let mut url = Url::parse(push_url)?;

    if url.scheme() != "https" {
        return Err(GistError::InvalidUrl(push_url.to_string()));
    }

    url.set_username(token.expose_secret())
        .and_then(|_| url.set_password(Some(TOKEN_PASSWORD)))
        .map_err(|_| GistError::InvalidUrl(push_url.to_string()))?;

    Ok(url.to_string())
}

/// Domain of the fallback commit email when no primary email is known
const NOREPLY_DOMAIN: &str = "users.noreply.github.com";

/// Author identity used for the upload commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

impl GitIdentity {
    /// Identity for `name`; without an email, `<name>@users.noreply.github.com`
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        let name = name.into();
        let email = email.unwrap_or_else(|| format!("{}@{}", name, NOREPLY_DOMAIN));
        Self { name, email }
    }
}

/// Temporary clone of a gist repository
pub struct GistRepository {
    // Removed on drop
    dir: TempDir,
}

impl GistRepository {
    /// Clone the gist at `pull_url` into a fresh temporary directory
    #[instrument(skip_all)]
    pub fn checkout(pull_url: &str) -> Result<Self> {
        let dir = TempDir::new()?;
        debug!(path = %dir.path().display(), "cloning gist");

        run_git(
            Command::new("git")
                .arg("clone")
                .arg("--quiet")
                .arg(pull_url)
                .arg(dir.path()),
            "clone",
        )?;

        Ok(Self { dir })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Staging and committing
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the commit identity for this clone only
    pub fn configure_identity(&self, identity: &GitIdentity) -> Result<()> {
        self.git(&["config", "user.name", &identity.name], "config")?;
        self.git(&["config", "user.email", &identity.email], "config")
    }

    /// Copy files into the working tree (flattened to their file names) and stage them
    pub fn add_files(&self, files: &[PathBuf]) -> Result<()> {
        for file in files {
            let name = file
                .file_name()
                .ok_or_else(|| GistError::InvalidInput(format!("Not a file: {}", file.display())))?;
            fs::copy(file, self.dir.path().join(name))?;
        }
        self.git(&["add", "--all", "."], "add")
    }

    /// Remove a tracked file (the placeholder stub)
    pub fn remove_file(&self, name: &str) -> Result<()> {
        self.git(&["rm", "--quiet", "--", name], "rm")
    }

    /// Commit everything staged
    pub fn commit(&self, message: &str) -> Result<()> {
        self.git(&["commit", "--quiet", "-m", message], "commit")
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Push operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Push the current branch to the gist with token credentials
    pub fn push(&self, push_url: &str, token: &SecretString) -> Result<()> {
        let url = authenticated_push_url(push_url, token)?;
        self.git(&["push", "--quiet", &url, "HEAD"], "push")
    }

    /// Full upload sequence: identity, files, stub removal, commit, push
    #[instrument(skip_all, fields(files = files.len()))]
    pub fn upload(
        &self,
        files: &[PathBuf],
        stub_name: Option<&str>,
        identity: &GitIdentity,
        push_url: &str,
        token: &SecretString,
    ) -> Result<()> {
        self.configure_identity(identity)?;
        self.add_files(files)?;
        if let Some(stub_name) = stub_name {
            self.remove_file(stub_name)?;
        }
        self.commit(COMMIT_MESSAGE)?;
        self.push(push_url, token)
    }

    fn git(&self, args: &[&str], action: &str) -> Result<()> {
        run_git(
            Command::new("git").current_dir(self.dir.path()).args(args),
            action,
        )
    }
}

fn run_git(cmd: &mut Command, action: &str) -> Result<()> {
    let output = cmd
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| GistError::Git(format!("Failed to execute git {}: {}", action, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GistError::Git(format!(
            "git {} failed: {}",
            action,
            stderr.trim()
        )));
    }

    Ok(())
}
