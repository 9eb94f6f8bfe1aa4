//! Per-reference check retrieval.
//!
//! Lists check runs and commit statuses for a single commit and normalizes
//! both shapes into [`CheckObservation`]s.

use std::collections::HashSet;

use futures::future::join;
use tracing::{debug, warn};

use crate::discovery::model::{CheckKind, CheckObservation, FetchWarning, ReferenceQuery};
use crate::ports::{CheckRunEntry, CommitStatusEntry, RepositoryApi};

/// Result of fetching one reference. A failed fetch yields no observations
/// and a warning instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub query: ReferenceQuery,
    pub observations: Vec<CheckObservation>,
    pub warning: Option<FetchWarning>,
}

impl FetchOutcome {
    pub fn degraded(query: ReferenceQuery, message: impl ToString) -> Self {
        let warning = FetchWarning::new(query.label.clone(), message);
        warn!(label = %warning.label, "{}", warning.message);
        Self {
            query,
            observations: Vec::new(),
            warning: Some(warning),
        }
    }
}

/// Fetch and normalize the checks reported for `query.sha`.
///
/// Both listings are requested concurrently. If either fails the reference
/// degrades to an empty observation set.
pub async fn fetch_checks(api: &dyn RepositoryApi, query: ReferenceQuery) -> FetchOutcome {
    let (runs, statuses) = join(
        api.list_check_runs(&query.sha),
        api.list_commit_statuses(&query.sha),
    )
    .await;

    let runs = match runs {
        Ok(runs) => runs,
        Err(err) => return FetchOutcome::degraded(query, format!("check runs: {err}")),
    };
    let statuses = match statuses {
        Ok(statuses) => statuses,
        Err(err) => return FetchOutcome::degraded(query, format!("commit statuses: {err}")),
    };

    let observations = normalize(&query.label, &runs, &statuses);
    debug!(
        label = %query.label,
        check_runs = runs.len(),
        statuses = statuses.len(),
        observations = observations.len(),
        "fetched checks"
    );
    FetchOutcome {
        query,
        observations,
        warning: None,
    }
}

/// Merge both listings into one observation sequence, check runs first.
///
/// Entries without a name are skipped; exact repeats of
/// `(name, kind, integration id)` collapse to the first occurrence.
pub fn normalize(
    label: &str,
    runs: &[CheckRunEntry],
    statuses: &[CommitStatusEntry],
) -> Vec<CheckObservation> {
    let mut seen: HashSet<(String, CheckKind, Option<i64>)> = HashSet::new();
    let mut observations = Vec::with_capacity(runs.len() + statuses.len());

    for run in runs {
        if run.name.is_empty() {
            continue;
        }
        let id = run.app.as_ref().map(|app| app.id);
        if !seen.insert((run.name.clone(), CheckKind::CheckRun, id)) {
            continue;
        }
        let slug = run
            .app
            .as_ref()
            .and_then(|app| app.slug.clone().or_else(|| app.name.clone()));
        observations.push(CheckObservation::check_run(run.name.clone(), id, slug, label));
    }

    for status in statuses {
        if status.context.is_empty() {
            continue;
        }
        if !seen.insert((status.context.clone(), CheckKind::Status, None)) {
            continue;
        }
        observations.push(CheckObservation::status(status.context.clone(), label));
    }

    observations
}
