//! End-to-end check discovery.
//!
//! [`CheckDiscovery`] resolves sources, fetches every reference concurrently,
//! then folds the results sequentially in resolution order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::discovery::aggregator::CheckAggregator;
use crate::discovery::fetcher::{fetch_checks, FetchOutcome};
use crate::discovery::model::{AggregatedCheck, FetchWarning, ReferenceQuery, ResolutionError};
use crate::discovery::resolver::{ReferenceResolver, SourceSelection};
use crate::ports::RepositoryApi;

/// Everything a discovery run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Aggregated checks sorted by name.
    pub checks: Vec<AggregatedCheck>,
    /// Every reference that was queried, in resolution order.
    pub references: Vec<ReferenceQuery>,
    pub warnings: Vec<FetchWarning>,
    pub resolution_errors: Vec<ResolutionError>,
}

impl DiscoveryResult {
    pub fn reference(&self, label: &str) -> Option<&ReferenceQuery> {
        self.references.iter().find(|r| r.label == label)
    }

    pub fn check(&self, name: &str) -> Option<&AggregatedCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Any warning or resolution error was collected.
    pub fn has_problems(&self) -> bool {
        !self.warnings.is_empty() || !self.resolution_errors.is_empty()
    }
}

/// Discovers checks across several references of one repository.
pub struct CheckDiscovery {
    api: Arc<dyn RepositoryApi>,
}

impl CheckDiscovery {
    pub fn new(api: Arc<dyn RepositoryApi>) -> Self {
        Self { api }
    }

    pub async fn discover(&self, selection: &SourceSelection) -> DiscoveryResult {
        let resolution = ReferenceResolver::new(self.api.as_ref())
            .resolve(selection)
            .await;

        let outcomes = self.fetch_all(&resolution.references).await;

        let mut aggregator = CheckAggregator::new();
        let mut warnings = Vec::new();
        for outcome in &outcomes {
            aggregator.observe_all(&outcome.observations);
            if let Some(warning) = &outcome.warning {
                warnings.push(warning.clone());
            }
        }
        let checks = aggregator.finish();

        info!(
            references = resolution.references.len(),
            checks = checks.len(),
            warnings = warnings.len(),
            "check discovery finished"
        );

        DiscoveryResult {
            checks,
            references: resolution.references,
            warnings,
            resolution_errors: resolution.errors,
        }
    }

    /// Fetch all references concurrently. The returned outcomes are in the
    /// same order as `references`; a task that dies degrades its reference.
    pub async fn fetch_all(&self, references: &[ReferenceQuery]) -> Vec<FetchOutcome> {
        let mut join_set = JoinSet::new();
        for (idx, query) in references.iter().cloned().enumerate() {
            let api = Arc::clone(&self.api);
            join_set.spawn(async move { (idx, fetch_checks(api.as_ref(), query).await) });
        }

        let mut slots: Vec<Option<FetchOutcome>> = vec![None; references.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(err) => debug!("check fetch task did not complete: {err}"),
            }
        }

        references
            .iter()
            .zip(slots)
            .map(|(query, slot)| {
                slot.unwrap_or_else(|| {
                    FetchOutcome::degraded(query.clone(), "check fetch task did not complete")
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::model::AggregateKind;
    use crate::fakes::MemoryRepository;
    use crate::ports::PullRequest;

    #[tokio::test]
    async fn test_mixed_check_across_default_branch_and_pr() {
        let api = MemoryRepository::new()
            .with_default_branch("main", "A")
            .with_pull_request(PullRequest::open(7, "B"))
            .with_check_run("A", "lint", Some((10, "actions")))
            .with_status("B", "lint");
        let discovery = CheckDiscovery::new(Arc::new(api));

        let result = discovery
            .discover(&SourceSelection::default().with_pull_request(7))
            .await;

        assert_eq!(result.checks.len(), 1);
        let lint = result.check("lint").expect("lint aggregated");
        assert_eq!(lint.kind, AggregateKind::Mixed);
        assert_eq!(lint.best_integration_id, Some(10));
        assert_eq!(lint.sources, vec!["default:main", "pr#7"]);
        assert!(!result.has_problems());
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_order() {
        let api = MemoryRepository::new()
            .with_check_run("1", "a", None)
            .with_check_run("2", "b", None)
            .with_check_run("3", "c", None);
        let discovery = CheckDiscovery::new(Arc::new(api));
        let refs = vec![
            ReferenceQuery::explicit_ref("one", "1"),
            ReferenceQuery::explicit_ref("two", "2"),
            ReferenceQuery::explicit_ref("three", "3"),
        ];

        let outcomes = discovery.fetch_all(&refs).await;
        let labels: Vec<_> = outcomes.iter().map(|o| o.query.label.as_str()).collect();
        assert_eq!(labels, vec!["one", "two", "three"]);
        assert_eq!(outcomes[1].observations[0].name, "b");
    }

    #[tokio::test]
    async fn test_failed_reference_does_not_abort_siblings() {
        let api = MemoryRepository::new()
            .with_default_branch("main", "A")
            .with_ref("broken", "B")
            .with_check_run("A", "build", Some((1, "ci")))
            .failing_check_runs_for("B");
        let discovery = CheckDiscovery::new(Arc::new(api));

        let result = discovery
            .discover(&SourceSelection::default().with_ref("broken"))
            .await;

        assert_eq!(result.references.len(), 2);
        assert_eq!(result.checks.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].label, "broken");
        assert!(result.has_problems());
    }
}
