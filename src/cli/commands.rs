//! CLI command definitions using clap
//!
//! Defines the command structure for the `gist` CLI tool.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// gist-shell - GitHub Gists from the command line
///
/// Creates gist-scoped tokens, keeps them in a local vault and manages
/// gists, stars, forks and revisions.
#[derive(Parser, Debug)]
#[command(name = "gist", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// GitHub API root (e.g. https://ghe.example.com/api/v3)
    #[arg(long, global = true, env = "GIST_SHELL_API")]
    pub api: Option<String>,

    /// Path of the credential vault
    #[arg(long, global = true, env = "GIST_SHELL_VAULT")]
    pub vault: Option<PathBuf>,

    /// Vault entry to authenticate with (defaults to the default entry)
    #[arg(long, global = true, env = "GIST_SHELL_CREDENTIAL")]
    pub credential: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage gist-shell tokens and stored credentials
    Auth(AuthArgs),

    #[command(flatten)]
    Gist(GistCommand),

    /// Manage configuration
    Config(ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Gist Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Gist commands, available at the top level
#[derive(Subcommand, Debug)]
pub enum GistCommand {
    /// List gists
    List {
        /// List the public gists of this user
        #[arg(long, short)]
        user: Option<String>,

        /// List your starred gists
        #[arg(long, conflicts_with = "user")]
        starred: bool,

        /// Only gists updated after this time (YYYY-MM-DDTHH:MM:SSZ)
        #[arg(long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Show a gist and its files
    Get {
        /// Gist ID
        id: String,

        /// Show the gist at this revision
        #[arg(long)]
        revision: Option<String>,
    },

    /// Create a gist from files
    Create {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Gist description
        #[arg(long, short)]
        description: Option<String>,

        /// Make the gist public
        #[arg(long)]
        public: bool,
    },

    /// Add or replace files of a gist
    Update {
        /// Gist ID
        id: String,

        /// Files to add or replace
        files: Vec<PathBuf>,

        /// New description
        #[arg(long, short)]
        description: Option<String>,

        /// File names to delete from the gist
        #[arg(long = "remove", value_name = "NAME")]
        remove: Vec<String>,
    },

    /// Delete a gist
    Delete {
        /// Gist ID
        id: String,
    },

    /// Star a gist
    Star {
        /// Gist ID
        id: String,
    },

    /// Unstar a gist
    Unstar {
        /// Gist ID
        id: String,
    },

    /// Check whether a gist is starred
    Starred {
        /// Gist ID
        id: String,
    },

    /// Fork a gist
    Fork {
        /// Gist ID
        id: String,
    },

    /// List the revisions of a gist
    Commits {
        /// Gist ID
        id: String,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// List the forks of a gist
    Forks {
        /// Gist ID
        id: String,

        #[command(flatten)]
        paging: PagingArgs,
    },
}

/// Pagination overrides for listings
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PagingArgs {
    /// Items per page (1-100)
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Maximum number of pages to fetch
    #[arg(long)]
    pub page_limit: Option<u32>,
}

fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM:SSZ: {}", e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication commands
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

/// GitHub account used to manage authorizations
#[derive(Args, Debug, Clone, Default)]
pub struct AccountArgs {
    /// GitHub username (prompted if omitted)
    #[arg(long, short)]
    pub username: Option<String>,

    /// Two-factor authentication code
    #[arg(long)]
    pub otp: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Create a gist-scoped token and store it in the vault
    Login {
        #[command(flatten)]
        account: AccountArgs,

        /// Words appended to the token note (e.g. "work laptop")
        #[arg(long)]
        note: Option<String>,

        /// Vault entry name
        #[arg(long, default_value = "default")]
        name: String,

        /// Make this the default entry (replaces an existing entry of the same name)
        #[arg(long)]
        default: bool,

        /// Replace an existing entry of the same name
        #[arg(long)]
        force: bool,
    },

    /// List tokens created by gist-shell
    List {
        /// Only these authorization IDs
        ids: Vec<u64>,

        #[command(flatten)]
        account: AccountArgs,
    },

    /// Revoke tokens created by gist-shell
    Delete {
        /// Only these authorization IDs (all gist-shell tokens if omitted)
        ids: Vec<u64>,

        #[command(flatten)]
        account: AccountArgs,
    },

    /// Show stored credentials
    Status,

    /// Remove an entry from the vault
    Logout {
        /// Vault entry name (defaults to the default entry)
        #[arg(long)]
        name: Option<String>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key
        key: ConfigKey,
        /// Value to set
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: ConfigKey,
    },
    /// Reset a configuration value to its default
    Remove {
        /// Configuration key
        key: ConfigKey,
    },
}

/// Available configuration keys
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKey {
    /// GitHub API root
    ApiUrl,
    /// Credential vault location
    VaultPath,
    /// Vault entry used by default
    Credential,
    /// Items per page in listings
    PerPage,
    /// Maximum pages fetched by a listing
    PageLimit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_since() {
        let since = parse_since("2017-02-18T09:12:44Z").unwrap();
        assert_eq!(since.to_rfc3339(), "2017-02-18T09:12:44+00:00");
        assert!(parse_since("yesterday").is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gist",
            "list",
            "--user",
            "octocat",
            "--page-limit",
            "3",
            "--api",
            "https://ghe.example.com/api/v3",
        ])
        .unwrap();

        assert_eq!(cli.global.api.as_deref(), Some("https://ghe.example.com/api/v3"));
        match cli.command {
            Commands::Gist(GistCommand::List { user, paging, .. }) => {
                assert_eq!(user.as_deref(), Some("octocat"));
                assert_eq!(paging.page_limit, Some(3));
                assert_eq!(paging.per_page, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_starred_conflicts_with_user() {
        assert!(Cli::try_parse_from(["gist", "list", "--starred", "--user", "octocat"]).is_err());
    }

    #[test]
    fn test_login_defaults() {
        let cli = Cli::try_parse_from(["gist", "auth", "login", "-u", "octocat"]).unwrap();
        match cli.command {
            Commands::Auth(AuthArgs {
                command:
                    AuthCommand::Login {
                        account,
                        name,
                        default,
                        force,
                        ..
                    },
            }) => {
                assert_eq!(account.username.as_deref(), Some("octocat"));
                assert_eq!(name, "default");
                assert!(!default && !force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_create_requires_files() {
        assert!(Cli::try_parse_from(["gist", "create"]).is_err());
    }
}
