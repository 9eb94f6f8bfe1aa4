//! Folding observations into one record per check name.
//!
//! The fold is order-sensitive: integration identity is taken from the first
//! observation of a name and never replaced, so callers must feed references
//! in resolution order.

use std::collections::BTreeMap;

use crate::discovery::model::{AggregateKind, AggregatedCheck, CheckObservation, ReferenceQuery};

/// Incremental, single-threaded check aggregator.
#[derive(Debug, Default)]
pub struct CheckAggregator {
    checks: BTreeMap<String, AggregatedCheck>,
}

impl CheckAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation.
    pub fn observe(&mut self, observation: &CheckObservation) {
        let (integration_id, integration_slug) = observation.integration();

        let Some(check) = self.checks.get_mut(&observation.name) else {
            self.checks.insert(
                observation.name.clone(),
                AggregatedCheck {
                    name: observation.name.clone(),
                    kind: observation.kind.into(),
                    best_integration_id: integration_id,
                    best_integration_slug: integration_slug.map(str::to_string),
                    sources: vec![observation.source_label.clone()],
                },
            );
            return;
        };

        if !check.sources.contains(&observation.source_label) {
            check.sources.push(observation.source_label.clone());
        }

        if check.kind != AggregateKind::from(observation.kind) {
            check.kind = AggregateKind::Mixed;
        }

        // Identity is sticky. The slug may only be completed by a later
        // observation of the same integration.
        if check.best_integration_slug.is_none()
            && check.best_integration_id.is_some()
            && check.best_integration_id == integration_id
        {
            check.best_integration_slug = integration_slug.map(str::to_string);
        }
    }

    pub fn observe_all<'a>(&mut self, observations: impl IntoIterator<Item = &'a CheckObservation>) {
        for observation in observations {
            self.observe(observation);
        }
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Finished records, sorted by name.
    pub fn finish(self) -> Vec<AggregatedCheck> {
        self.checks.into_values().collect()
    }
}

/// Fold per-reference results, in the given order, into aggregated checks.
pub fn aggregate(results: &[(ReferenceQuery, Vec<CheckObservation>)]) -> Vec<AggregatedCheck> {
    let mut aggregator = CheckAggregator::new();
    for (_, observations) in results {
        aggregator.observe_all(observations);
    }
    aggregator.finish()
}
