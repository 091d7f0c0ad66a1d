//! Core functionality for gist-shell
//!
//! This module contains shared business logic including:
//! - The credential vault
//! - Token resolution
//! - Application configuration
//! - Uploads through the gist's git repository
//! - Local user and host identification

pub mod config;
pub mod credentials;
pub mod git;
pub mod identity;
pub mod vault;

pub use config::Config;
pub use credentials::CredentialStore;
pub use git::GistRepository;
pub use vault::{Credentials, Vault, VaultEntry};
