//! Flow Coach orchestrator
//!
//! Drives one analysis request through the insight pipeline: collect flow
//! records, compute metrics, analyse flow per team and period, detect
//! patterns, retrieve knowledge and synthesize insights.
//!
//! # Core Concepts
//!
//! - [`Pipeline`]: shared engines, provider and knowledge index
//! - [`PipelineRun`]: one request over its own append-only [`RunState`]
//! - [`PipelineStage`]: explicit stage table, validated on every transition
//! - [`FlowDataProvider`]: read-only source of flow records (file, HTTP, static)
//! - [`PipelineReport`]: everything a run recorded, including stage failures
//!
//! # Example
//!
//! ```rust,ignore
//! use flowcoach_core::{JsonFileFlowProvider, Pipeline, PipelineConfig};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(JsonFileFlowProvider::new("records.json"));
//! let pipeline = Pipeline::from_config(PipelineConfig::default(), provider).await?;
//! let report = pipeline.run(scope).execute().await;
//! for insight in &report.insights {
//!     println!("{}: {}", insight.severity, insight.title);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod analysis;
mod cancel;
mod config;
mod error;
mod failure;
mod pipeline;
mod provider;
mod report;
mod stage;
mod state;

pub use analysis::FlowAnalysis;
pub use cancel::CancellationFlag;
pub use config::PipelineConfig;
pub use error::{PipelineError, ProviderError, StateError};
pub use failure::{FailureKind, StageFailure};
pub use pipeline::{run_many, Pipeline, PipelineRun};
pub use provider::{
    scope_query, FlowDataProvider, HttpFlowProvider, JsonFileFlowProvider, StaticFlowProvider,
};
pub use report::{KnowledgeMatch, PipelineReport};
pub use stage::{allowed_transitions, validate_transition, PipelineStage, Route};
pub use state::{CollectedData, InsufficientSample, RunParts, RunState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
