//! Records that flow through the discovery pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::PullRequest;

/// How a reference entered the query list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceOrigin {
    DefaultBranch,
    OpenPr,
    MergedPr,
    ExplicitPr,
    ExplicitRef,
}

/// One resolved source to query. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceQuery {
    /// Display label, e.g. `default:main` or `pr#238`.
    pub label: String,
    pub sha: String,
    pub origin: ReferenceOrigin,
    /// The source is a pull request that has already been merged.
    pub merged: bool,
    /// Head branch of a pull request source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_ref: Option<String>,
}

impl ReferenceQuery {
    pub fn default_branch(branch: &str, sha: impl Into<String>) -> Self {
        Self {
            label: format!("default:{branch}"),
            sha: sha.into(),
            origin: ReferenceOrigin::DefaultBranch,
            merged: false,
            head_ref: None,
        }
    }

    pub fn pull_request(pr: &PullRequest, origin: ReferenceOrigin) -> Self {
        Self {
            label: format!("pr#{}", pr.number),
            sha: pr.head_sha.clone(),
            origin,
            merged: origin == ReferenceOrigin::MergedPr || pr.is_merged(),
            head_ref: pr.head_ref.clone(),
        }
    }

    pub fn explicit_ref(reference: &str, sha: impl Into<String>) -> Self {
        Self {
            label: reference.to_string(),
            sha: sha.into(),
            origin: ReferenceOrigin::ExplicitRef,
            merged: false,
            head_ref: None,
        }
    }
}

/// The upstream shape a check was reported through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    CheckRun,
    Status,
}

/// One check as seen under one reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckObservation {
    pub name: String,
    pub kind: CheckKind,
    pub integration_id: Option<i64>,
    pub integration_slug: Option<String>,
    pub source_label: String,
}

impl CheckObservation {
    pub fn check_run(
        name: impl Into<String>,
        integration_id: Option<i64>,
        integration_slug: Option<String>,
        source_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: CheckKind::CheckRun,
            integration_id,
            integration_slug,
            source_label: source_label.into(),
        }
    }

    /// Commit statuses never carry an app identity.
    pub fn status(name: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CheckKind::Status,
            integration_id: None,
            integration_slug: None,
            source_label: source_label.into(),
        }
    }

    /// Integration identity, always `None` for statuses.
    pub fn integration(&self) -> (Option<i64>, Option<&str>) {
        match self.kind {
            CheckKind::Status => (None, None),
            CheckKind::CheckRun => (self.integration_id, self.integration_slug.as_deref()),
        }
    }
}

/// Kind of an aggregated check; `Mixed` once both shapes were observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    CheckRun,
    Status,
    Mixed,
}

impl From<CheckKind> for AggregateKind {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::CheckRun => AggregateKind::CheckRun,
            CheckKind::Status => AggregateKind::Status,
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregateKind::CheckRun => "check_run",
            AggregateKind::Status => "status",
            AggregateKind::Mixed => "mixed",
        };
        f.write_str(s)
    }
}

/// The merged, user-facing record for one check name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedCheck {
    pub name: String,
    pub kind: AggregateKind,
    pub best_integration_id: Option<i64>,
    pub best_integration_slug: Option<String>,
    /// Source labels in discovery order, without duplicates.
    pub sources: Vec<String>,
}

/// An input that could not be turned into a commit.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{input}: {message}")]
pub struct ResolutionError {
    /// The faulty input as the user gave it (`pr#12`, `release/1.0`, ...).
    pub input: String,
    pub message: String,
}

impl ResolutionError {
    pub fn new(input: impl Into<String>, message: impl ToString) -> Self {
        Self {
            input: input.into(),
            message: message.to_string(),
        }
    }
}

/// A reference whose check data could not be retrieved.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{label}: {message}")]
pub struct FetchWarning {
    pub label: String,
    pub message: String,
}

impl FetchWarning {
    pub fn new(label: impl Into<String>, message: impl ToString) -> Self {
        Self {
            label: label.into(),
            message: message.to_string(),
        }
    }
}
