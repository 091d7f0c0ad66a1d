//! GitHub API integration module
//!
//! This module provides all GitHub-related functionality:
//! - Request transport and endpoint resolution
//! - OAuth authorizations (token creation, listing, revocation)
//! - Gist operations
//! - Link header pagination
//! - Error classification

pub mod authorizations;
pub mod client;
pub mod error_handler;
pub mod gists;
pub mod pagination;
pub mod transport;

pub use authorizations::{Authorization, AuthorizationHandler};
pub use client::GitHubClient;
pub use error_handler::classify_response;
pub use gists::{Gist, GistHandler, ListOptions};
pub use pagination::{PageCursor, Paginator};
pub use transport::{ApiRequest, ApiResponse, Auth, ReqwestTransport, Transport};
