//! Remote repository port.
//!
//! The discovery pipeline only talks to the hosting service through
//! [`RepositoryApi`]. The GitHub adapter lives in `rulegate-github`; an
//! in-memory implementation for tests lives in [`crate::fakes`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;

/// State of a pull request as reported by the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    Open,
    Closed,
}

/// The subset of a pull request the resolver needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    /// Commit at the tip of the head branch.
    pub head_sha: String,
    /// Head branch name, when the remote still knows it.
    pub head_ref: Option<String>,
    pub state: PullRequestState,
    pub merged_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn open(number: u64, head_sha: impl Into<String>) -> Self {
        Self {
            number,
            head_sha: head_sha.into(),
            head_ref: None,
            state: PullRequestState::Open,
            merged_at: None,
            updated_at: None,
        }
    }

    pub fn merged(number: u64, head_sha: impl Into<String>, merged_at: DateTime<Utc>) -> Self {
        Self {
            number,
            head_sha: head_sha.into(),
            head_ref: None,
            state: PullRequestState::Closed,
            merged_at: Some(merged_at),
            updated_at: Some(merged_at),
        }
    }

    pub fn with_head_ref(mut self, head_ref: impl Into<String>) -> Self {
        self.head_ref = Some(head_ref.into());
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Closed with a merge timestamp.
    pub fn is_merged(&self) -> bool {
        self.state == PullRequestState::Closed && self.merged_at.is_some()
    }
}

/// The app that reported a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckApp {
    pub id: i64,
    pub slug: Option<String>,
    pub name: Option<String>,
}

/// One entry of the check-run listing for a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunEntry {
    pub name: String,
    pub app: Option<CheckApp>,
}

/// One entry of the legacy combined-status listing for a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatusEntry {
    pub context: String,
    pub state: Option<String>,
}

/// Read-only access to a hosted repository.
///
/// Each call is a single request/response exchange; implementations do not
/// retry. Failures of one call are isolated by the callers.
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// Name of the repository's default branch.
    async fn default_branch(&self) -> RemoteResult<String>;

    /// Resolve a branch, tag or SHA to a full commit SHA.
    async fn resolve_ref(&self, reference: &str) -> RemoteResult<String>;

    /// Fetch one pull request by number.
    async fn pull_request(&self, number: u64) -> RemoteResult<PullRequest>;

    /// Open pull requests, most recently updated first.
    async fn list_open_pull_requests(&self) -> RemoteResult<Vec<PullRequest>>;

    /// Merged pull requests, most recently merged first.
    async fn list_merged_pull_requests(&self) -> RemoteResult<Vec<PullRequest>>;

    /// Check runs reported against a commit.
    async fn list_check_runs(&self, sha: &str) -> RemoteResult<Vec<CheckRunEntry>>;

    /// Legacy commit statuses reported against a commit.
    async fn list_commit_statuses(&self, sha: &str) -> RemoteResult<Vec<CommitStatusEntry>>;
}
