//! GitHub adapter for rulegate
//!
//! [`GithubClient`] implements [`rulegate_core::RepositoryApi`] over the
//! REST API and adds the ruleset create/update calls.

pub mod client;
pub mod config;
pub mod error;
pub mod repository;

pub use client::{GithubClient, API_VERSION};
pub use config::{GithubConfig, DEFAULT_TIMEOUT_SECS};
pub use error::GithubError;
pub use repository::{Repository, GITHUB_HOST};

/// Result type for GitHub adapter operations
pub type Result<T> = std::result::Result<T, GithubError>;
