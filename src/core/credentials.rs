//! Credential lookup on top of the vault
//!
//! ## Environment Variable Fallback
//!
//! For scripting and CI, a token can be supplied through `GITHUB_TOKEN`;
//! it bypasses the vault entirely.
//!
//! Priority: env var > named vault entry > default vault entry

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::core::vault::{self, Credentials, Vault, VaultEntry};
use crate::error::{GistError, Result};

// Environment variable names
const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Credential store backed by a vault file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    vault_path: PathBuf,
}

impl CredentialStore {
    pub fn new(vault_path: impl Into<PathBuf>) -> Self {
        Self {
            vault_path: vault_path.into(),
        }
    }

    /// Path of the backing vault file
    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    /// Find a GitHub token, if one is available
    ///
    /// `name` selects a vault entry; `None` uses the default entry.
    pub fn resolve_token(&self, name: Option<&str>) -> Result<Option<SecretString>> {
        let from_env = std::env::var(GITHUB_TOKEN_ENV).ok();
        self.resolve_token_with(from_env, name)
    }

    fn resolve_token_with(
        &self,
        from_env: Option<String>,
        name: Option<&str>,
    ) -> Result<Option<SecretString>> {
        // Priority 1: environment variable
        if let Some(token) = from_env.filter(|token| !token.is_empty()) {
            return Ok(Some(SecretString::from(token)));
        }

        // Priority 2: vault
        match vault::fetch(&self.vault_path, name) {
            Ok(credentials) => Ok(Some(credentials.secret_token())),
            Err(GistError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get a GitHub token, returning an error if none is available
    pub fn require_token(&self, name: Option<&str>) -> Result<SecretString> {
        self.resolve_token(name)?.ok_or(GistError::NotAuthenticated)
    }

    /// Persist credentials under `name`
    pub fn store(
        &self,
        name: &str,
        credentials: Credentials,
        default: bool,
        force: bool,
    ) -> Result<Vault> {
        vault::update(
            &self.vault_path,
            name,
            VaultEntry::new(credentials, default),
            force,
        )
    }

    /// Forget the credentials stored under `name`
    pub fn forget(&self, name: &str) -> Result<Vault> {
        vault::remove(&self.vault_path, name)
    }

    /// Load every stored entry
    pub fn vault(&self) -> Result<Vault> {
        vault::open(&self.vault_path)
    }

    /// Get a masked version of a token for display (shows first 4 and last 4 chars)
    pub fn mask_token(token: &SecretString) -> String {
        let chars: Vec<char> = token.expose_secret().chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("vault.json"))
    }

    #[test]
    fn test_mask_token() {
        let short = SecretString::from("abc");
        assert_eq!(CredentialStore::mask_token(&short), "***");

        let long = SecretString::from("ghp_1234567890abcdef");
        assert_eq!(CredentialStore::mask_token(&long), "ghp_...cdef");
    }

    #[test]
    fn test_mask_token_counts_characters() {
        let short = SecretString::from("aéééé");
        assert_eq!(CredentialStore::mask_token(&short), "*****");

        let long = SecretString::from("ééééé-token-ñññññ");
        assert_eq!(CredentialStore::mask_token(&long), "éééé...ññññ");
    }

    #[test]
    fn test_env_token_wins() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .store("ghe", Credentials::from_token("from-vault"), true, false)
            .unwrap();

        let token = store
            .resolve_token_with(Some("from-env".to_string()), None)
            .unwrap()
            .unwrap();
        assert_eq!(token.expose_secret(), "from-env");
    }

    #[test]
    fn test_empty_env_token_falls_back_to_vault() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .store("ghe", Credentials::from_token("from-vault"), true, false)
            .unwrap();

        let token = store
            .resolve_token_with(Some(String::new()), None)
            .unwrap()
            .unwrap();
        assert_eq!(token.expose_secret(), "from-vault");
    }

    #[test]
    fn test_missing_credentials_resolve_to_none() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(store.resolve_token_with(None, None).unwrap().is_none());
        assert!(store.resolve_token_with(None, Some("ghe")).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_vault_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::write(store.vault_path(), "oops").unwrap();

        assert!(matches!(
            store.resolve_token_with(None, None),
            Err(GistError::VaultMalformed(_))
        ));
    }

    #[test]
    fn test_forget_removes_entry() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .store("ghe", Credentials::from_token("t1"), true, false)
            .unwrap();

        store.forget("ghe").unwrap();

        assert!(store.vault().unwrap().is_empty());
    }
}
