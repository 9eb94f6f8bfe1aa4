//! Error types for rulegate-core.
//!
//! Only truly exceptional conditions are errors here. A document that does
//! not match its schema is reported as [`crate::Violation`] values, and
//! per-reference discovery problems are collected as warnings.

use thiserror::Error;

/// Failures reported by a [`crate::ports::RepositoryApi`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The requested ref, commit or pull request does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote rejected the credentials (or none were supplied).
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// The remote answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded into the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Failures loading or compiling a schema description.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Description text is not JSON.
    #[error("schema description is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Description file could not be read.
    #[error("failed to read schema description {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A schema node is not a JSON object.
    #[error("schema node at {pointer} must be an object")]
    NotAnObject { pointer: String },

    /// A `type` keyword names a type the validator does not model.
    #[error("unsupported type '{type_name}' at {pointer}")]
    UnsupportedType { pointer: String, type_name: String },

    /// A `$ref` points outside the description or to a missing definition.
    #[error("unresolved reference '{reference}' at {pointer}")]
    UnresolvedRef { pointer: String, reference: String },

    /// A `$ref` chain refers back to itself.
    #[error("recursive reference '{reference}' at {pointer}")]
    RecursiveRef { pointer: String, reference: String },

    /// A keyword is present but malformed.
    #[error("invalid '{keyword}' at {pointer}: {reason}")]
    InvalidKeyword {
        pointer: String,
        keyword: String,
        reason: String,
    },

    /// The source has no description for the requested document type.
    #[error("no schema available for document type '{0}'")]
    UnknownDocumentType(String),
}

/// Result alias for remote collaborator calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Result alias for schema loading.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
