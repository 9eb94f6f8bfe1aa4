//! Structural schemas for candidate documents.

pub mod compile;
pub mod node;
pub mod source;

pub use compile::{compile, compile_str};
pub use node::{ArraySchema, Conditional, ObjectSchema, Property, SchemaNode, StringSchema};
pub use source::{BuiltinSchemaSource, DocumentType, FileSchemaSource, SchemaSource};
