//! Application configuration management
//!
//! Handles loading and saving application settings including:
//! - GitHub API root (for GitHub Enterprise)
//! - Vault location and default credential set
//! - Pagination defaults

use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::error::{GistError, Result};
use crate::github::client::GITHUB_API_URL;

/// Directory below `$HOME` holding the vault
const VAULT_DIR: &str = ".gist-shell";

/// Vault file name
const VAULT_FILE: &str = "vault.json";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API root
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Vault file location (defaults to `~/.gist-shell/vault.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_path: Option<PathBuf>,

    /// Vault entry used when none is named (defaults to the entry flagged default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,

    /// Items requested per page in listings
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Maximum number of pages fetched by a listing
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_api_url() -> String {
    GITHUB_API_URL.to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_page_limit() -> u32 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            vault_path: None,
            credential: None,
            per_page: default_per_page(),
            page_limit: default_page_limit(),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "gist-shell", "gist-shell")
            .ok_or_else(|| GistError::Config("Could not determine config directory".into()))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Vault location: the configured path or `~/.gist-shell/vault.json`
    pub fn vault_path(&self) -> Result<PathBuf> {
        match &self.vault_path {
            Some(path) => Ok(path.clone()),
            None => default_vault_path(),
        }
    }
}

/// Default vault location below the home directory
pub fn default_vault_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| GistError::Config("Could not determine home directory".into()))?;

    Ok(base_dirs.home_dir().join(VAULT_DIR).join(VAULT_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.per_page, 100);
        assert_eq!(config.page_limit, 2);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("page_limit = 5\n").unwrap();
        assert_eq!(config.page_limit, 5);
        assert_eq!(config.per_page, 100);
        assert_eq!(config.api_url, GITHUB_API_URL);
        assert!(config.vault_path.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            api_url: "https://ghe.example.com/api/v3".to_string(),
            vault_path: Some(dir.path().join("vault.json")),
            credential: Some("work".to_string()),
            per_page: 30,
            page_limit: 4,
        };

        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "per_page = \"many\"").unwrap();

        assert!(matches!(Config::load_from(&path), Err(GistError::Toml(_))));
    }

    #[test]
    fn test_default_vault_path_is_in_dot_directory() {
        let path = Config::default().vault_path().unwrap();
        assert!(path.ends_with(".gist-shell/vault.json"));
    }
}
