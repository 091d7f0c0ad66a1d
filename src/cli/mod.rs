//! CLI module for gist-shell
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod auth;
pub mod commands;
pub mod config;
pub mod context;
pub mod gist;

pub use commands::{Cli, Commands};
pub use context::Context;
