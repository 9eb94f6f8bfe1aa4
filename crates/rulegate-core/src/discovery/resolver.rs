//! Reference resolution.
//!
//! Turns a [`SourceSelection`] into an ordered, SHA-unique list of
//! [`ReferenceQuery`]. Priority order is default branch, explicit pull
//! requests, the latest-PR fallback, then explicit refs; when two inputs land
//! on the same commit the earlier one keeps it.

use std::collections::HashSet;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::discovery::model::{ReferenceOrigin, ReferenceQuery, ResolutionError};
use crate::ports::RepositoryApi;

/// Which sources a discovery run should inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSelection {
    pub include_default_branch: bool,
    pub pull_requests: Vec<u64>,
    /// Most recently updated open PR, else most recently merged PR.
    pub latest_pr: bool,
    pub refs: Vec<String>,
}

impl Default for SourceSelection {
    fn default() -> Self {
        Self {
            include_default_branch: true,
            pull_requests: Vec::new(),
            latest_pr: false,
            refs: Vec::new(),
        }
    }
}

impl SourceSelection {
    /// Selection with nothing enabled.
    pub fn none() -> Self {
        Self {
            include_default_branch: false,
            ..Self::default()
        }
    }

    pub fn without_default_branch(mut self) -> Self {
        self.include_default_branch = false;
        self
    }

    pub fn with_pull_request(mut self, number: u64) -> Self {
        self.pull_requests.push(number);
        self
    }

    pub fn with_latest_pr(mut self) -> Self {
        self.latest_pr = true;
        self
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.refs.push(reference.into());
        self
    }
}

/// Outcome of resolving a selection. Partial success is normal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub references: Vec<ReferenceQuery>,
    pub errors: Vec<ResolutionError>,
}

impl Resolution {
    /// Append unless a reference with the same SHA is already present.
    fn push_unique(&mut self, seen: &mut HashSet<String>, query: ReferenceQuery) {
        if seen.insert(query.sha.clone()) {
            self.references.push(query);
        } else {
            debug!(
                label = %query.label,
                sha = %query.sha,
                "dropping reference: commit already covered by an earlier source"
            );
        }
    }

    fn fail(&mut self, error: ResolutionError) {
        warn!(input = %error.input, "{}", error.message);
        self.errors.push(error);
    }
}

/// Resolves source descriptors against a [`RepositoryApi`].
pub struct ReferenceResolver<'a> {
    api: &'a dyn RepositoryApi,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(api: &'a dyn RepositoryApi) -> Self {
        Self { api }
    }

    /// Resolve every enabled source. Never fails as a whole: unresolvable
    /// inputs are reported in [`Resolution::errors`].
    pub async fn resolve(&self, selection: &SourceSelection) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();

        if selection.include_default_branch {
            match self.resolve_default_branch().await {
                Ok(query) => resolution.push_unique(&mut seen, query),
                Err(err) => resolution.fail(err),
            }
        }

        // Explicit PRs and refs are looked up concurrently; join_all keeps
        // input order so the priority rules still hold.
        let prs = join_all(
            selection
                .pull_requests
                .iter()
                .map(|&number| self.resolve_pull_request(number)),
        )
        .await;
        for result in prs {
            match result {
                Ok(query) => resolution.push_unique(&mut seen, query),
                Err(err) => resolution.fail(err),
            }
        }

        if selection.latest_pr {
            match self.resolve_latest_pull_request().await {
                Ok(Some(query)) => resolution.push_unique(&mut seen, query),
                Ok(None) => debug!("latest-pr: no open or merged pull request, skipping"),
                Err(err) => resolution.fail(err),
            }
        }

        let refs = join_all(
            selection
                .refs
                .iter()
                .filter(|r| !r.trim().is_empty())
                .map(|r| self.resolve_explicit_ref(r)),
        )
        .await;
        for result in refs {
            match result {
                Ok(query) => resolution.push_unique(&mut seen, query),
                Err(err) => resolution.fail(err),
            }
        }

        info!(
            references = resolution.references.len(),
            errors = resolution.errors.len(),
            "resolved discovery sources"
        );
        resolution
    }

    async fn resolve_default_branch(&self) -> Result<ReferenceQuery, ResolutionError> {
        const INPUT: &str = "default branch";
        let branch = self
            .api
            .default_branch()
            .await
            .map_err(|e| ResolutionError::new(INPUT, e))?;
        let sha = self
            .api
            .resolve_ref(&branch)
            .await
            .map_err(|e| ResolutionError::new(format!("default:{branch}"), e))?;
        Ok(ReferenceQuery::default_branch(&branch, sha))
    }

    async fn resolve_pull_request(&self, number: u64) -> Result<ReferenceQuery, ResolutionError> {
        let input = format!("pr#{number}");
        let pr = self
            .api
            .pull_request(number)
            .await
            .map_err(|e| ResolutionError::new(input.clone(), e))?;
        if pr.head_sha.is_empty() {
            return Err(ResolutionError::new(input, "pull request has no head commit"));
        }
        Ok(ReferenceQuery::pull_request(&pr, ReferenceOrigin::ExplicitPr))
    }

    /// `Ok(None)` when there is neither an open nor a merged pull request.
    async fn resolve_latest_pull_request(&self) -> Result<Option<ReferenceQuery>, ResolutionError> {
        const INPUT: &str = "latest-pr";
        let open = self
            .api
            .list_open_pull_requests()
            .await
            .map_err(|e| ResolutionError::new(INPUT, e))?;
        if let Some(pr) = open.into_iter().find(|pr| !pr.head_sha.is_empty()) {
            debug!(number = pr.number, "latest-pr: using most recently updated open PR");
            return Ok(Some(ReferenceQuery::pull_request(&pr, ReferenceOrigin::OpenPr)));
        }

        let merged = self
            .api
            .list_merged_pull_requests()
            .await
            .map_err(|e| ResolutionError::new(INPUT, e))?;
        Ok(merged
            .into_iter()
            .find(|pr| !pr.head_sha.is_empty())
            .map(|pr| {
                debug!(number = pr.number, "latest-pr: falling back to most recently merged PR");
                ReferenceQuery::pull_request(&pr, ReferenceOrigin::MergedPr)
            }))
    }

    async fn resolve_explicit_ref(&self, reference: &str) -> Result<ReferenceQuery, ResolutionError> {
        let sha = self
            .api
            .resolve_ref(reference)
            .await
            .map_err(|e| ResolutionError::new(reference, e))?;
        Ok(ReferenceQuery::explicit_ref(reference, sha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryRepository;
    use crate::ports::PullRequest;
    use chrono::{TimeZone, Utc};

    fn repo() -> MemoryRepository {
        MemoryRepository::new()
            .with_default_branch("main", "sha-main")
            .with_ref("release/1.0", "sha-release")
            .with_pull_request(PullRequest::open(7, "sha-pr7").with_head_ref("feature/a"))
            .with_pull_request(PullRequest::open(8, "sha-main"))
    }

    #[test]
    fn test_default_selection_includes_default_branch() {
        let selection = SourceSelection::default();
        assert!(selection.include_default_branch);
        assert!(!SourceSelection::none().include_default_branch);
    }

    #[tokio::test]
    async fn test_priority_order() {
        let api = repo();
        let selection = SourceSelection::default()
            .with_ref("release/1.0")
            .with_pull_request(7);
        let resolution = ReferenceResolver::new(&api).resolve(&selection).await;

        let labels: Vec<_> = resolution.references.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["default:main", "pr#7", "release/1.0"]);
        assert!(resolution.errors.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_sha_keeps_first_label() {
        let api = repo();
        // pr#8 points at the same commit as main.
        let selection = SourceSelection::default().with_pull_request(8).with_ref("main");
        let resolution = ReferenceResolver::new(&api).resolve(&selection).await;

        assert_eq!(resolution.references.len(), 1);
        assert_eq!(resolution.references[0].label, "default:main");
    }

    #[tokio::test]
    async fn test_unresolvable_inputs_are_collected() {
        let api = repo();
        let selection = SourceSelection::default()
            .with_pull_request(404)
            .with_pull_request(7)
            .with_ref("nope");
        let resolution = ReferenceResolver::new(&api).resolve(&selection).await;

        let labels: Vec<_> = resolution.references.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["default:main", "pr#7"]);
        let inputs: Vec<_> = resolution.errors.iter().map(|e| e.input.as_str()).collect();
        assert_eq!(inputs, vec!["pr#404", "nope"]);
    }

    #[tokio::test]
    async fn test_latest_pr_prefers_open() {
        let updated = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let api = MemoryRepository::new()
            .with_pull_request(PullRequest::open(3, "sha-3").with_updated_at(updated))
            .with_pull_request(PullRequest::merged(2, "sha-2", updated));
        let selection = SourceSelection::none().with_latest_pr();
        let resolution = ReferenceResolver::new(&api).resolve(&selection).await;

        assert_eq!(resolution.references.len(), 1);
        assert_eq!(resolution.references[0].origin, ReferenceOrigin::OpenPr);
        assert!(!resolution.references[0].merged);
    }

    #[tokio::test]
    async fn test_latest_pr_falls_back_to_merged() {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let api = MemoryRepository::new().with_pull_request(PullRequest::merged(2, "sha-2", at));
        let selection = SourceSelection::none().with_latest_pr();
        let resolution = ReferenceResolver::new(&api).resolve(&selection).await;

        assert_eq!(resolution.references.len(), 1);
        let query = &resolution.references[0];
        assert_eq!(query.label, "pr#2");
        assert_eq!(query.origin, ReferenceOrigin::MergedPr);
        assert!(query.merged);
    }

    #[tokio::test]
    async fn test_latest_pr_without_candidates_is_silent() {
        let api = MemoryRepository::new();
        let selection = SourceSelection::none().with_latest_pr();
        let resolution = ReferenceResolver::new(&api).resolve(&selection).await;

        assert!(resolution.references.is_empty());
        assert!(resolution.errors.is_empty());
    }

    #[tokio::test]
    async fn test_latest_pr_listing_failure_is_reported() {
        let api = MemoryRepository::new().failing_pull_request_listing();
        let selection = SourceSelection::none().with_latest_pr();
        let resolution = ReferenceResolver::new(&api).resolve(&selection).await;

        assert!(resolution.references.is_empty());
        assert_eq!(resolution.errors.len(), 1);
        assert_eq!(resolution.errors[0].input, "latest-pr");
    }

    #[tokio::test]
    async fn test_missing_default_branch_does_not_block_refs() {
        let api = MemoryRepository::new().with_ref("v1.0", "sha-tag");
        let selection = SourceSelection::default().with_ref("v1.0");
        let resolution = ReferenceResolver::new(&api).resolve(&selection).await;

        assert_eq!(resolution.references.len(), 1);
        assert_eq!(resolution.references[0].label, "v1.0");
        assert_eq!(resolution.errors.len(), 1);
        assert_eq!(resolution.errors[0].input, "default branch");
    }

    #[tokio::test]
    async fn test_blank_refs_are_ignored() {
        let api = repo();
        let selection = SourceSelection::none().with_ref("  ");
        let resolution = ReferenceResolver::new(&api).resolve(&selection).await;
        assert!(resolution.references.is_empty());
        assert!(resolution.errors.is_empty());
    }
}
