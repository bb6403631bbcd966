//! Error types for the knowledge corpus
//!
//! Raised while loading and indexing corpus documents. A retrieval that
//! finds nothing is not an error.

use std::path::PathBuf;

/// Corpus loading and indexing errors
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// Document does not start with a front matter block
    #[error("{source_name}: missing front matter")]
    MissingFrontMatter { source_name: String },

    /// Front matter is not valid YAML or lacks a required key
    #[error("{source_name}: malformed header: {message}")]
    MalformedHeader {
        source_name: String,
        message: String,
    },

    /// Header field has an empty value
    #[error("{source_name}: empty '{field}' field")]
    EmptyField {
        source_name: String,
        field: &'static str,
    },

    /// Two documents share an identifier
    #[error("duplicate document id: '{0}'")]
    DuplicateId(String),

    /// IO error while reading a corpus directory
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Retrieval configuration out of range
    #[error("invalid retrieval config: {0}")]
    InvalidConfig(String),
}

impl KnowledgeError {
    /// Create malformed-header error
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_display() {
        let err = KnowledgeError::DuplicateId("kb-wip".to_string());
        assert_eq!(err.to_string(), "duplicate document id: 'kb-wip'");
    }

    #[test]
    fn malformed_names_source() {
        let err = KnowledgeError::malformed("wip.md", "missing field `id`");
        assert!(err.to_string().starts_with("wip.md:"));
    }
}
