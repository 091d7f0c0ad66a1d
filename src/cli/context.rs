//! Settings resolved for a single invocation
//!
//! Command-line flags (and their environment variables) override the
//! configuration file.

use secrecy::SecretString;

use crate::cli::commands::{GlobalArgs, PagingArgs};
use crate::core::config::Config;
use crate::core::credentials::CredentialStore;
use crate::error::Result;
use crate::github::client::GitHubClient;
use crate::github::pagination::PageCursor;

/// Resolved settings for one command
#[derive(Debug, Clone)]
pub struct Context {
    config: Config,
    api_url: String,
    credential: Option<String>,
    store: CredentialStore,
}

impl Context {
    /// Resolve settings from the configuration file and `global`
    pub fn new(global: &GlobalArgs) -> Result<Self> {
        Self::from_config(Config::load()?, global)
    }

    pub fn from_config(config: Config, global: &GlobalArgs) -> Result<Self> {
        let api_url = global
            .api
            .clone()
            .unwrap_or_else(|| config.api_url.clone());
        let vault_path = match &global.vault {
            Some(path) => path.clone(),
            None => config.vault_path()?,
        };
        let credential = global.credential.clone().or_else(|| config.credential.clone());

        Ok(Self {
            config,
            api_url,
            credential,
            store: CredentialStore::new(vault_path),
        })
    }

    /// Vault entry to authenticate with; `None` means the default entry
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Client for the resolved API root
    pub fn client(&self) -> Result<GitHubClient> {
        GitHubClient::new(&self.api_url)
    }

    /// Pagination bounds, flags over configuration
    pub fn cursor(&self, paging: &PagingArgs) -> PageCursor {
        PageCursor::new(
            paging.per_page.unwrap_or(self.config.per_page),
            paging.page_limit.unwrap_or(self.config.page_limit),
        )
    }

    /// Token for gist calls, if one is available
    pub fn token(&self) -> Result<Option<SecretString>> {
        self.store.resolve_token(self.credential())
    }

    /// Token for gist calls that need authentication
    pub fn require_token(&self) -> Result<SecretString> {
        self.store.require_token(self.credential())
    }
}
