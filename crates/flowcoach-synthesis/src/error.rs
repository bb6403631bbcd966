//! Error types for insight synthesis

use flowcoach_model::ModelError;

/// Synthesis errors
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// Configuration out of range
    #[error("invalid synthesis config: {0}")]
    InvalidConfig(String),

    /// An insight could not be assembled
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Failure of an optional narrative enricher
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrichmentError {
    /// Enricher could not be reached or failed
    #[error("enricher '{name}' unavailable: {reason}")]
    Unavailable { name: String, reason: String },

    /// Prose attributed work to a person and was dropped
    #[error("enricher '{name}' prose attributes work to individuals")]
    PersonAttribution { name: String },
}

impl EnrichmentError {
    /// Create unavailable error
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
