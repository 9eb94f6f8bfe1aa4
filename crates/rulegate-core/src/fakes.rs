//! In-memory fake of the repository port (testing only)
//!
//! [`MemoryRepository`] answers every [`RepositoryApi`] call from data set up
//! with builder methods, and can be told to fail specific calls.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{RemoteError, RemoteResult};
use crate::ports::{
    CheckApp, CheckRunEntry, CommitStatusEntry, PullRequest, PullRequestState, RepositoryApi,
};

/// In-memory repository backed by plain maps.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    default_branch: Option<String>,
    refs: HashMap<String, String>,
    pull_requests: Vec<PullRequest>,
    check_runs: HashMap<String, Vec<CheckRunEntry>>,
    statuses: HashMap<String, Vec<CommitStatusEntry>>,
    failing_check_runs: HashSet<String>,
    failing_statuses: HashSet<String>,
    fail_pull_request_listing: bool,
    fetched: Mutex<Vec<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default branch and register it as a resolvable ref.
    pub fn with_default_branch(mut self, branch: &str, sha: &str) -> Self {
        self.default_branch = Some(branch.to_string());
        self.refs.insert(branch.to_string(), sha.to_string());
        self
    }

    pub fn with_ref(mut self, reference: &str, sha: &str) -> Self {
        self.refs.insert(reference.to_string(), sha.to_string());
        self
    }

    pub fn with_pull_request(mut self, pr: PullRequest) -> Self {
        self.pull_requests.push(pr);
        self
    }

    pub fn with_check_run(mut self, sha: &str, name: &str, app: Option<(i64, &str)>) -> Self {
        self.check_runs
            .entry(sha.to_string())
            .or_default()
            .push(CheckRunEntry {
                name: name.to_string(),
                app: app.map(|(id, slug)| CheckApp {
                    id,
                    slug: Some(slug.to_string()),
                    name: None,
                }),
            });
        self
    }

    pub fn with_status(mut self, sha: &str, context: &str) -> Self {
        self.statuses
            .entry(sha.to_string())
            .or_default()
            .push(CommitStatusEntry {
                context: context.to_string(),
                state: Some("success".to_string()),
            });
        self
    }

    pub fn failing_check_runs_for(mut self, sha: &str) -> Self {
        self.failing_check_runs.insert(sha.to_string());
        self
    }

    pub fn failing_statuses_for(mut self, sha: &str) -> Self {
        self.failing_statuses.insert(sha.to_string());
        self
    }

    pub fn failing_pull_request_listing(mut self) -> Self {
        self.fail_pull_request_listing = true;
        self
    }

    /// SHAs whose check runs were requested, in call order.
    pub fn fetched_shas(&self) -> Vec<String> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RepositoryApi for MemoryRepository {
    async fn default_branch(&self) -> RemoteResult<String> {
        self.default_branch
            .clone()
            .ok_or_else(|| RemoteError::NotFound("default branch".to_string()))
    }

    async fn resolve_ref(&self, reference: &str) -> RemoteResult<String> {
        self.refs
            .get(reference)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("ref {reference}")))
    }

    async fn pull_request(&self, number: u64) -> RemoteResult<PullRequest> {
        self.pull_requests
            .iter()
            .find(|pr| pr.number == number)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("pull request {number}")))
    }

    async fn list_open_pull_requests(&self) -> RemoteResult<Vec<PullRequest>> {
        if self.fail_pull_request_listing {
            return Err(RemoteError::Transport("listing disabled".to_string()));
        }
        let mut open: Vec<_> = self
            .pull_requests
            .iter()
            .filter(|pr| pr.state == PullRequestState::Open)
            .cloned()
            .collect();
        open.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(open)
    }

    async fn list_merged_pull_requests(&self) -> RemoteResult<Vec<PullRequest>> {
        if self.fail_pull_request_listing {
            return Err(RemoteError::Transport("listing disabled".to_string()));
        }
        let mut merged: Vec<_> = self
            .pull_requests
            .iter()
            .filter(|pr| pr.is_merged())
            .cloned()
            .collect();
        merged.sort_by(|a, b| b.merged_at.cmp(&a.merged_at));
        Ok(merged)
    }

    async fn list_check_runs(&self, sha: &str) -> RemoteResult<Vec<CheckRunEntry>> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sha.to_string());
        if self.failing_check_runs.contains(sha) {
            return Err(RemoteError::Status {
                status: 500,
                message: "check runs unavailable".to_string(),
            });
        }
        Ok(self.check_runs.get(sha).cloned().unwrap_or_default())
    }

    async fn list_commit_statuses(&self, sha: &str) -> RemoteResult<Vec<CommitStatusEntry>> {
        if self.failing_statuses.contains(sha) {
            return Err(RemoteError::Status {
                status: 500,
                message: "statuses unavailable".to_string(),
            });
        }
        Ok(self.statuses.get(sha).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_open_pull_requests_sorted_by_update() {
        let older = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let repo = MemoryRepository::new()
            .with_pull_request(PullRequest::open(1, "a").with_updated_at(older))
            .with_pull_request(PullRequest::open(2, "b").with_updated_at(newer));

        let open = repo.list_open_pull_requests().await.unwrap();
        assert_eq!(open[0].number, 2);
        assert_eq!(open[1].number, 1);
    }

    #[tokio::test]
    async fn test_unknown_sha_has_no_checks() {
        let repo = MemoryRepository::new();
        assert!(repo.list_check_runs("zzz").await.unwrap().is_empty());
        assert!(repo.list_commit_statuses("zzz").await.unwrap().is_empty());
        assert_eq!(repo.fetched_shas(), vec!["zzz"]);
    }

    #[tokio::test]
    async fn test_missing_ref_is_not_found() {
        let repo = MemoryRepository::new();
        let err = repo.resolve_ref("ghost").await.unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(_)));
    }
}
