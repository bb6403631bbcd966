//! Immutable knowledge index
//!
//! Documents are parsed once and shared read-only between runs. The index
//! is id-addressed and keeps documents sorted by id.

use crate::document::{DocumentId, KnowledgeDocument};
use crate::error::KnowledgeError;
use crate::parser::CorpusParser;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Corpus compiled into the binary
const BUILTIN: &[(&str, &str)] = &[
    ("aging-work.md", include_str!("../corpus/aging-work.md")),
    ("capacity.md", include_str!("../corpus/capacity.md")),
    ("flow-efficiency.md", include_str!("../corpus/flow-efficiency.md")),
    ("handoff-bottleneck.md", include_str!("../corpus/handoff-bottleneck.md")),
    ("low-confidence-note.md", include_str!("../corpus/low-confidence-note.md")),
    ("portfolio-wip.md", include_str!("../corpus/portfolio-wip.md")),
    (
        "review-queue-bottleneck.md",
        include_str!("../corpus/review-queue-bottleneck.md"),
    ),
    ("variability.md", include_str!("../corpus/variability.md")),
    ("wip-limits.md", include_str!("../corpus/wip-limits.md")),
];

/// Read-only document index
#[derive(Debug, Clone)]
pub struct KnowledgeIndex {
    documents: Arc<[Arc<KnowledgeDocument>]>,
    by_id: Arc<BTreeMap<DocumentId, usize>>,
}

impl KnowledgeIndex {
    /// Build index from parsed documents
    ///
    /// # Errors
    /// Returns error if two documents share an id
    pub fn from_documents(
        documents: impl IntoIterator<Item = KnowledgeDocument>,
    ) -> Result<Self, KnowledgeError> {
        let mut sorted: BTreeMap<DocumentId, KnowledgeDocument> = BTreeMap::new();
        for document in documents {
            if sorted.contains_key(&document.id) {
                return Err(KnowledgeError::DuplicateId(document.id.to_string()));
            }
            sorted.insert(document.id.clone(), document);
        }

        let by_id = sorted
            .keys()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let documents: Vec<Arc<KnowledgeDocument>> = sorted.into_values().map(Arc::new).collect();
        tracing::debug!("Indexed {} knowledge document(s)", documents.len());

        Ok(Self {
            documents: documents.into(),
            by_id: Arc::new(by_id),
        })
    }

    /// Parse and index `(source name, content)` pairs
    ///
    /// # Errors
    /// Returns the first parse error, or a duplicate-id error
    pub fn parse_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, KnowledgeError> {
        let parser = CorpusParser::new();
        let documents = sources
            .into_iter()
            .map(|(name, content)| parser.parse(name, content))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_documents(documents)
    }

    /// Index of the built-in corpus
    ///
    /// # Errors
    /// Returns error only if a built-in document is malformed
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::parse_sources(BUILTIN.iter().copied())
    }

    /// Load every `.md` file of a directory
    ///
    /// Files are read in name order; subdirectories are ignored.
    ///
    /// # Errors
    /// Returns error on IO failure, malformed documents or duplicate ids
    pub async fn load_dir(dir: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let dir = dir.as_ref();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| KnowledgeError::io_error(dir, e))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| KnowledgeError::io_error(dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| KnowledgeError::io_error(&path, e))?;
            sources.push((path.display().to_string(), content));
        }

        tracing::info!(
            "Loaded {} corpus file(s) from {}",
            sources.len(),
            dir.display()
        );
        Self::parse_sources(sources.iter().map(|(n, c)| (n.as_str(), c.as_str())))
    }

    /// Look up a document
    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<&Arc<KnowledgeDocument>> {
        self.by_id.get(id).map(|&i| &self.documents[i])
    }

    /// Documents in id order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<KnowledgeDocument>> {
        self.documents.iter()
    }

    /// Documents as a slice
    #[inline]
    #[must_use]
    pub fn documents(&self) -> &[Arc<KnowledgeDocument>] {
        &self.documents
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
