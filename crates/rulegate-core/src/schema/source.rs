//! Where schema descriptions come from.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::compile::compile_str;
use crate::schema::node::SchemaNode;

const RULESET_SCHEMA: &str = include_str!("ruleset.schema.json");

/// Kinds of document the validator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    RepositoryRuleset,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::RepositoryRuleset => "repository-ruleset",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repository-ruleset" | "ruleset" => Ok(DocumentType::RepositoryRuleset),
            other => Err(SchemaError::UnknownDocumentType(other.to_string())),
        }
    }
}

/// Loads the compiled schema for a document type.
pub trait SchemaSource {
    fn load_schema(&self, document_type: DocumentType) -> SchemaResult<SchemaNode>;
}

/// Descriptions compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSchemaSource;

impl SchemaSource for BuiltinSchemaSource {
    fn load_schema(&self, document_type: DocumentType) -> SchemaResult<SchemaNode> {
        match document_type {
            DocumentType::RepositoryRuleset => compile_str(RULESET_SCHEMA),
        }
    }
}

/// A description read from disk, serving a single document type.
#[derive(Debug, Clone)]
pub struct FileSchemaSource {
    path: PathBuf,
    document_type: DocumentType,
}

impl FileSchemaSource {
    pub fn new(path: impl Into<PathBuf>, document_type: DocumentType) -> Self {
        Self {
            path: path.into(),
            document_type,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SchemaSource for FileSchemaSource {
    fn load_schema(&self, document_type: DocumentType) -> SchemaResult<SchemaNode> {
        if document_type != self.document_type {
            return Err(SchemaError::UnknownDocumentType(document_type.to_string()));
        }
        debug!(path = %self.path.display(), "loading schema description");
        let text = std::fs::read_to_string(&self.path).map_err(|source| SchemaError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        compile_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_ruleset_schema_compiles() {
        let node = BuiltinSchemaSource
            .load_schema(DocumentType::RepositoryRuleset)
            .unwrap();
        let SchemaNode::Object(root) = node else {
            panic!("ruleset schema root must be an object");
        };
        assert!(root.property("name").unwrap().required);
        assert!(root.property("enforcement").unwrap().required);
        assert!(!root.property("target").unwrap().required);
        assert!(!root.additional_properties);
    }

    #[test]
    fn test_file_source_reads_description() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "object", "required": ["id"]}}"#).unwrap();

        let source = FileSchemaSource::new(file.path(), DocumentType::RepositoryRuleset);
        let node = source.load_schema(DocumentType::RepositoryRuleset).unwrap();
        assert!(matches!(node, SchemaNode::Object(_)));
    }

    #[test]
    fn test_file_source_missing_file() {
        let source = FileSchemaSource::new("/nonexistent/schema.json", DocumentType::RepositoryRuleset);
        let err = source
            .load_schema(DocumentType::RepositoryRuleset)
            .unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }

    #[test]
    fn test_document_type_parse() {
        assert_eq!(
            "ruleset".parse::<DocumentType>().unwrap(),
            DocumentType::RepositoryRuleset
        );
        assert!("workflow".parse::<DocumentType>().is_err());
    }
}
