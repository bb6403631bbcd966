//! Flow Coach knowledge retrieval
//!
//! Coaching guidance parsed from a Markdown corpus into an immutable index,
//! queried with a hybrid of tag matching and term-frequency similarity.
//!
//! # Core Concepts
//!
//! - [`KnowledgeDocument`]: one parsed guidance document with its metadata
//! - [`KnowledgeIndex`]: read-only, id-addressed set of documents
//! - [`KnowledgeQuery`]: symptom, scope level, metric names and free text
//! - [`Retriever`]: metadata filter plus weighted keyword/semantic scoring
//!
//! # Example
//!
//! ```rust,ignore
//! use flowcoach_knowledge::{KnowledgeIndex, KnowledgeQuery, RetrievalConfig, Retriever};
//!
//! let retriever = Retriever::new(KnowledgeIndex::builtin()?, RetrievalConfig::default());
//! let matches = retriever.retrieve(&KnowledgeQuery::from_pattern(&pattern, level));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod document;
mod error;
mod index;
mod parser;
mod query;
mod retriever;
pub mod scoring;

pub use document::{Applicability, DocumentId, KnowledgeDocument};
pub use error::KnowledgeError;
pub use index::KnowledgeIndex;
pub use parser::CorpusParser;
pub use query::KnowledgeQuery;
pub use retriever::{RetrievalConfig, Retriever, ScoredDocument};
pub use scoring::{KeywordScorer, SemanticScorer, TagScorer, TermFrequencyScorer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
