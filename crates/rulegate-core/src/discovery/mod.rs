//! Required-check discovery across several references.
//!
//! - [`resolver`]: source descriptors to SHA-unique [`ReferenceQuery`] list
//! - [`fetcher`]: check runs + commit statuses for one commit
//! - [`aggregator`]: first-seen-wins fold keyed by check name
//! - [`collect`]: concurrent fetch, sequential fold

pub mod aggregator;
pub mod collect;
pub mod fetcher;
pub mod model;
pub mod resolver;

pub use aggregator::{aggregate, CheckAggregator};
pub use collect::{CheckDiscovery, DiscoveryResult};
pub use fetcher::{fetch_checks, normalize, FetchOutcome};
pub use model::{
    AggregateKind, AggregatedCheck, CheckKind, CheckObservation, FetchWarning, ReferenceOrigin,
    ReferenceQuery, ResolutionError,
};
pub use resolver::{ReferenceResolver, Resolution, SourceSelection};
