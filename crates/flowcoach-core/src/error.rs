//! Error types for the orchestrator
//!
//! Provider and configuration failures are typed here; a pipeline run
//! itself never fails but records each stage failure in its report.

use crate::stage::PipelineStage;
use flowcoach_knowledge::KnowledgeError;
use flowcoach_model::ModelError;
use std::path::PathBuf;

/// Flow data provider errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Provider did not answer within the configured timeout
    #[error("flow data provider '{name}' timed out after {timeout_ms} ms")]
    Timeout { name: String, timeout_ms: u64 },

    /// Provider could not be reached or refused the request
    #[error("flow data provider '{name}' unavailable: {reason}")]
    Unavailable { name: String, reason: String },

    /// Record file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Payload could not be decoded
    #[error("malformed provider payload: {0}")]
    Decode(#[from] ModelError),

    /// HTTP transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProviderError {
    /// Create unavailable error
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Append-only run state errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// A slot was written twice
    #[error("run state slot '{slot}' already recorded")]
    AlreadyRecorded { slot: &'static str },

    /// A slot read before the stage owning it ran
    #[error("run state slot '{slot}' not recorded")]
    Missing { slot: &'static str },

    /// Stage transition not in the transition table
    #[error("illegal stage transition: {from} -> {to}")]
    IllegalTransition {
        from: PipelineStage,
        to: PipelineStage,
    },
}

/// Pipeline construction errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration invalid
    #[error("invalid pipeline configuration: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid TOML
    #[error("malformed configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Knowledge corpus could not be loaded
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
}
