//! Human and machine renderings of discovery and validation results.
//!
//! Both renderings come from the same report value, so they carry the same
//! information.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::discovery::{
    AggregateKind, DiscoveryResult, FetchWarning, ReferenceOrigin, ReferenceQuery, ResolutionError,
};
use crate::validation::Violation;

/// One source of an aggregated check, annotated from its reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ReferenceOrigin>,
    pub merged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    pub kind: AggregateKind,
    pub integration_id: Option<i64>,
    pub integration_slug: Option<String>,
    pub sources: Vec<SourceRecord>,
}

impl CheckRecord {
    fn integration_label(&self) -> Option<String> {
        match (self.integration_id, self.integration_slug.as_deref()) {
            (Some(id), Some(slug)) => Some(format!("integration {id} ({slug})")),
            (Some(id), None) => Some(format!("integration {id}")),
            (None, Some(slug)) => Some(format!("integration {slug}")),
            (None, None) => None,
        }
    }

    /// `- name [integration 15368 (github-actions)] check_run  [sources: a, pr#7 [merged]]`
    pub fn render_line(&self) -> String {
        let mut line = format!("- {}", self.name);
        if let Some(integration) = self.integration_label() {
            let _ = write!(line, " [{integration}]");
        }
        let sources = self
            .sources
            .iter()
            .map(|s| {
                if s.merged {
                    format!("{} [merged]", s.label)
                } else {
                    s.label.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(line, " {}  [sources: {sources}]", self.kind);
        line
    }
}

/// Serializable view of a [`DiscoveryResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub checks: Vec<CheckRecord>,
    pub references: Vec<ReferenceQuery>,
    pub warnings: Vec<FetchWarning>,
    pub resolution_errors: Vec<ResolutionError>,
}

impl DiscoveryReport {
    pub fn from_result(result: &DiscoveryResult) -> Self {
        let checks = result
            .checks
            .iter()
            .map(|check| CheckRecord {
                name: check.name.clone(),
                kind: check.kind,
                integration_id: check.best_integration_id,
                integration_slug: check.best_integration_slug.clone(),
                sources: check
                    .sources
                    .iter()
                    .map(|label| {
                        let reference = result.reference(label);
                        SourceRecord {
                            label: label.clone(),
                            origin: reference.map(|r| r.origin),
                            merged: reference.is_some_and(|r| r.merged),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            checks,
            references: result.references.clone(),
            warnings: result.warnings.clone(),
            resolution_errors: result.resolution_errors.clone(),
        }
    }

    pub fn render_human(&self) -> String {
        let mut out = String::new();

        if self.checks.is_empty() {
            out.push_str("No checks found.\n");
        } else {
            let _ = writeln!(out, "Checks ({}):", self.checks.len());
            for check in &self.checks {
                let _ = writeln!(out, "{}", check.render_line());
            }
        }

        if !self.warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for warning in &self.warnings {
                let _ = writeln!(out, "- {warning}");
            }
        }

        if !self.resolution_errors.is_empty() {
            out.push_str("\nUnresolved sources:\n");
            for error in &self.resolution_errors {
                let _ = writeln!(out, "- {error}");
            }
        }

        if !self.references.is_empty() {
            out.push_str("\nReferences inspected:\n");
            for reference in &self.references {
                let sha: String = reference.sha.chars().take(7).collect();
                let merged = if reference.merged { ", merged" } else { "" };
                let _ = writeln!(
                    out,
                    "- {} {sha} ({}{merged})",
                    reference.label,
                    origin_name(reference.origin)
                );
            }
        }

        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn origin_name(origin: ReferenceOrigin) -> &'static str {
    match origin {
        ReferenceOrigin::DefaultBranch => "default branch",
        ReferenceOrigin::OpenPr => "latest open pull request",
        ReferenceOrigin::MergedPr => "latest merged pull request",
        ReferenceOrigin::ExplicitPr => "pull request",
        ReferenceOrigin::ExplicitRef => "ref",
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    /// One `path: message` line per violation.
    pub fn render_human(&self) -> String {
        if self.valid {
            return "Payload is valid.\n".to_string();
        }
        let mut out = format!("Payload has {} violation(s):\n", self.violations.len());
        for violation in &self.violations {
            let _ = writeln!(out, "{violation}");
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
