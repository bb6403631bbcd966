//! Stage failure taxonomy
//!
//! Every degraded path of a run is recorded with a stable reason code so
//! callers can tell a data gap from a computation guard or a cancellation.

use crate::stage::PipelineStage;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Kind of stage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No flow data could be fetched
    DataUnavailable,
    /// Too few completed items for metrics
    InsufficientData,
    /// A value was not computed because its denominator was zero or invalid
    ComputationGuard,
    /// No knowledge matched a pattern
    KnowledgeRetrievalMiss,
    /// Narrative enrichment failed or was dropped
    EnrichmentUnavailable,
    /// Patterns beyond the insight cap got no insight of their own
    InsightsCapped,
    /// Run was cancelled
    Cancelled,
}

impl FailureKind {
    /// Stable reason code
    #[inline]
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::DataUnavailable => "DATA_UNAVAILABLE",
            Self::InsufficientData => "INSUFFICIENT_DATA",
            Self::ComputationGuard => "COMPUTATION_GUARD",
            Self::KnowledgeRetrievalMiss => "KNOWLEDGE_MISS",
            Self::EnrichmentUnavailable => "ENRICHMENT_UNAVAILABLE",
            Self::InsightsCapped => "INSIGHTS_CAPPED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Check if the failure stopped the analysis short of pattern detection
    #[inline]
    #[must_use]
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            Self::DataUnavailable | Self::InsufficientData | Self::Cancelled
        )
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One recorded stage failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: PipelineStage,
    pub kind: FailureKind,
    /// Stable reason code of `kind`
    pub code: &'static str,
    pub message: String,
}

impl StageFailure {
    /// Create failure
    #[must_use]
    pub fn new(stage: PipelineStage, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            code: kind.code(),
            message: message.into(),
        }
    }
}

impl Display for StageFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.stage, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(FailureKind::KnowledgeRetrievalMiss.code(), "KNOWLEDGE_MISS");
        assert_eq!(FailureKind::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn failure_carries_its_code() {
        let failure = StageFailure::new(
            PipelineStage::Collect,
            FailureKind::DataUnavailable,
            "connection refused",
        );
        assert_eq!(failure.code, "DATA_UNAVAILABLE");
        assert_eq!(
            failure.to_string(),
            "[DATA_UNAVAILABLE] collect: connection refused"
        );
        assert!(failure.kind.is_blocking());
        assert!(!FailureKind::EnrichmentUnavailable.is_blocking());
    }
}
