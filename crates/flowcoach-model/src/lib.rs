//! Flow Coach data model
//!
//! Typed values shared by every stage of the insight pipeline.
//!
//! # Core Concepts
//!
//! - [`WorkItemFlowRecord`]: per-item stage durations fetched from the flow data provider
//! - [`WorkflowShape`]: the feature-level and story-level stage layouts
//! - [`ScopeDescriptor`]: the organizational scope and window of one analysis
//! - [`MetricsSnapshot`]: derived flow metrics (Little's Law, flow efficiency, stage map)
//! - [`Pattern`]: a detected bottleneck, stuck-item, WIP or predictability pattern
//! - [`Insight`]: the five-part coaching insight document
//! - [`EvidenceRef`]: a reference to the metric field or pattern an insight rests on
//!
//! # Example
//!
//! ```rust,ignore
//! use flowcoach_model::{RawFlowRecord, WorkflowShape};
//!
//! let raw: RawFlowRecord = serde_json::from_str(json)?;
//! let record = raw.into_record(WorkflowShape::Story)?;
//! assert!(record.is_completed());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod error;
mod evidence;
mod id;
mod insight;
mod pattern;
mod record;
mod scope;
mod snapshot;
mod stage;
mod wire;

// Re-exports
pub use error::ModelError;
pub use evidence::{EvidenceRef, MetricField};
pub use id::{ContentId, InsightId, PatternId};
pub use insight::{
    Action, Comparison, ConfidenceTier, Effort, ExpectedOutcomes, IndicatorKind, Insight,
    InsightBuilder, InsightCategory, Interpretation, Observation, RecommendedActions,
    ReferenceKind, RootCause, RootCauseSource, Severity, Timeframe, WatchedMetric,
};
pub use pattern::{Pattern, PatternKind, PatternSubject};
pub use record::{ItemStatus, ScopeTags, WorkItemFlowRecord};
pub use scope::{AnalysisWindow, PeriodSummary, ScopeDescriptor, ScopeKind, ScopeLevel};
pub use snapshot::{
    display_percent, CapacityBaseline, CapacityStatus, GuardNote, LeadTimeDistribution,
    MetricsSnapshot, SnapshotParts, StageMetrics,
};
pub use stage::{StageName, WorkflowShape};
pub use wire::{ConvertedRecord, IngestConfig, Ingested, RawFlowRecord, RecordBatch};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the flow model
    pub use crate::{
        AnalysisWindow, EvidenceRef, Insight, MetricField, MetricsSnapshot, Pattern, PatternKind,
        ScopeDescriptor, ScopeKind, Severity, StageName, WorkItemFlowRecord, WorkflowShape,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
