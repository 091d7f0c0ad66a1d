//! Configuration CLI command handlers

use std::path::PathBuf;

use crate::cli::commands::{ConfigCommand, ConfigKey};
use crate::core::config::Config;
use crate::error::{GistError, Result};
use crate::github::client::parse_api_url;
use crate::github::pagination::PageCursor;

/// Handle configuration commands
pub fn handle_config(command: ConfigCommand) -> Result<()> {
    let mut config = Config::load()?;

    match command {
        ConfigCommand::Set { key, value } => {
            apply_set(&mut config, key, &value)?;
            config.save()?;
            println!("{} set to: {}", key_name(key), describe(&config, key)?);
        }
        ConfigCommand::Get { key } => {
            println!("{}: {}", key_name(key), describe(&config, key)?);
        }
        ConfigCommand::Remove { key } => {
            apply_remove(&mut config, key);
            config.save()?;
            println!("{} reset to default: {}", key_name(key), describe(&config, key)?);
        }
    }
    Ok(())
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::ApiUrl => "API URL",
        ConfigKey::VaultPath => "Vault path",
        ConfigKey::Credential => "Default credential",
        ConfigKey::PerPage => "Items per page",
        ConfigKey::PageLimit => "Page limit",
    }
}

fn apply_set(config: &mut Config, key: ConfigKey, value: &str) -> Result<()> {
    match key {
        ConfigKey::ApiUrl => {
            parse_api_url(value)?;
            config.api_url = value.trim().to_string();
        }
        ConfigKey::VaultPath => config.vault_path = Some(PathBuf::from(value)),
        ConfigKey::Credential => config.credential = Some(value.to_string()),
        ConfigKey::PerPage => {
            let per_page = parse_number(value)?;
            if per_page == 0 || per_page > PageCursor::MAX_PER_PAGE {
                return Err(GistError::InvalidInput(format!(
                    "Items per page must be between 1 and {}.",
                    PageCursor::MAX_PER_PAGE
                )));
            }
            config.per_page = per_page;
        }
        ConfigKey::PageLimit => {
            let page_limit = parse_number(value)?;
            if page_limit == 0 {
                return Err(GistError::InvalidInput(
                    "Page limit must be at least 1.".into(),
                ));
            }
            config.page_limit = page_limit;
        }
    }
    Ok(())
}

fn apply_remove(config: &mut Config, key: ConfigKey) {
    let defaults = Config::default();
    match key {
        ConfigKey::ApiUrl => config.api_url = defaults.api_url,
        ConfigKey::VaultPath => config.vault_path = None,
        ConfigKey::Credential => config.credential = None,
        ConfigKey::PerPage => config.per_page = defaults.per_page,
        ConfigKey::PageLimit => config.page_limit = defaults.page_limit,
    }
}

fn describe(config: &Config, key: ConfigKey) -> Result<String> {
    Ok(match key {
        ConfigKey::ApiUrl => config.api_url.clone(),
        ConfigKey::VaultPath => config.vault_path()?.display().to_string(),
        ConfigKey::Credential => config
            .credential
            .clone()
            .unwrap_or_else(|| "(entry flagged default)".to_string()),
        ConfigKey::PerPage => config.per_page.to_string(),
        ConfigKey::PageLimit => config.page_limit.to_string(),
    })
}

fn parse_number(value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| GistError::InvalidInput(format!("'{}' is not a number.", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_remove_values() {
        let mut config = Config::default();

        apply_set(&mut config, ConfigKey::PerPage, "30").unwrap();
        apply_set(&mut config, ConfigKey::Credential, "work").unwrap();
        apply_set(&mut config, ConfigKey::ApiUrl, "https://ghe.example.com/api/v3").unwrap();
        assert_eq!(config.per_page, 30);
        assert_eq!(config.credential.as_deref(), Some("work"));
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");

        apply_remove(&mut config, ConfigKey::PerPage);
        apply_remove(&mut config, ConfigKey::Credential);
        apply_remove(&mut config, ConfigKey::ApiUrl);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();

        assert!(apply_set(&mut config, ConfigKey::PerPage, "0").is_err());
        assert!(apply_set(&mut config, ConfigKey::PerPage, "101").is_err());
        assert!(apply_set(&mut config, ConfigKey::PageLimit, "many").is_err());
        assert!(apply_set(&mut config, ConfigKey::ApiUrl, "ftp://example.com").is_err());
        assert_eq!(config, Config::default());
    }
}
