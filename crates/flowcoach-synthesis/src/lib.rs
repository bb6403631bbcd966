//! Flow Coach insight synthesis
//!
//! Builds five-part coaching insights (observation, interpretation, root
//! causes, recommendations, expected outcomes) from a snapshot, its
//! patterns and the knowledge retrieved for them.
//!
//! # Core Concepts
//!
//! - [`Synthesizer`]: overview, per-pattern and capacity insights, prioritized
//! - [`NarrativeEnricher`]: optional async prose, screened for person attribution
//! - [`ScenarioModeler`]: built-in enricher with throughput and WIP what-ifs
//! - [`heuristics`]: fallback causes and action plans when the corpus has no match
//!
//! # Example
//!
//! ```rust,ignore
//! use flowcoach_synthesis::{SynthesisConfig, SynthesisInput, Synthesizer};
//!
//! let synthesizer = Synthesizer::new(SynthesisConfig::default());
//! let outcome = synthesizer.synthesize(SynthesisInput {
//!     scope: &scope,
//!     snapshot: &snapshot,
//!     flow_health,
//!     patterns: &patterns,
//!     knowledge: &knowledge,
//! })?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod enrich;
mod error;
mod explain;
pub mod heuristics;
mod overview;
mod pattern_insight;
mod priority;
mod scenario;
mod screen;
mod sections;
mod synthesizer;

pub use config::{PriorityWeights, SynthesisConfig};
pub use enrich::{apply_enrichment, EnrichmentPayload, NarrativeEnricher};
pub use error::{EnrichmentError, SynthesisError};
pub use priority::{priority_score, sort_insights};
pub use scenario::ScenarioModeler;
pub use screen::attributes_person;
pub use synthesizer::{SynthesisInput, SynthesisOutcome, Synthesizer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
