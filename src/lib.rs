//! gist-shell - GitHub Gists from the command line
//!
//! This library provides the pieces behind the `gist` command: a client for
//! the Gist and OAuth Authorizations APIs, a Link header pagination walker
//! and a local JSON credential vault.

pub mod cli;
pub mod core;
pub mod error;
pub mod github;

pub use error::{GistError, Result};
