//! rulegate core library
//!
//! Required-check discovery across git references and ruleset payload
//! validation. Network access goes through the [`ports::RepositoryApi`]
//! port; everything else is pure.

pub mod discovery;
pub mod error;
pub mod fakes;
pub mod payload;
pub mod ports;
pub mod report;
pub mod schema;
pub mod telemetry;
pub mod validation;

pub use discovery::{
    aggregate, fetch_checks, normalize, AggregateKind, AggregatedCheck, CheckAggregator,
    CheckDiscovery, CheckKind, CheckObservation, DiscoveryResult, FetchOutcome, FetchWarning,
    ReferenceOrigin, ReferenceQuery, ReferenceResolver, Resolution, ResolutionError,
    SourceSelection,
};

pub use error::{RemoteError, RemoteResult, SchemaError, SchemaResult};

pub use payload::{
    format_ref_pattern, prepare_ruleset_payload, strip_ref_prefix, READ_ONLY_FIELDS,
};

pub use ports::{
    CheckApp, CheckRunEntry, CommitStatusEntry, PullRequest, PullRequestState, RepositoryApi,
};

pub use report::{CheckRecord, DiscoveryReport, SourceRecord, ValidationReport};

pub use schema::{
    compile, compile_str, BuiltinSchemaSource, DocumentType, FileSchemaSource, ObjectSchema,
    SchemaNode, SchemaSource,
};

pub use telemetry::{build_subscriber, init_tracing};

pub use validation::{
    check_ruleset_semantics, validate, validate_ruleset, validate_ruleset_with, Severity,
    Violation,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
