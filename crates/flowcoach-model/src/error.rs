//! Error types for the flow model
//!
//! Raised while ingesting provider records or assembling insight documents.

/// Model construction and ingestion errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Record has no item key
    #[error("record is missing an item key")]
    MissingKey,

    /// Stage duration is negative, NaN or infinite
    #[error("invalid duration for {item}/{stage}: {value}")]
    InvalidDuration {
        item: String,
        stage: String,
        value: f64,
    },

    /// Stage field could not be read as a number of days
    #[error("unreadable duration for {item}/{stage}: {raw}")]
    UnreadableDuration {
        item: String,
        stage: String,
        raw: String,
    },

    /// Unknown workflow shape name
    #[error("unknown workflow shape: '{0}'")]
    UnknownWorkflow(String),

    /// Unknown scope kind name
    #[error("unknown scope kind: '{0}'")]
    UnknownScope(String),

    /// Analysis window ends before it starts
    #[error("analysis window ends ({end}) before it starts ({start})")]
    InvertedWindow {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Insight has no metric or pattern evidence
    #[error("insight '{title}' cites no evidence")]
    MissingEvidence { title: String },

    /// Insight is missing a mandatory section
    #[error("insight '{title}' is missing its {section} section")]
    MissingSection {
        title: String,
        section: &'static str,
    },

    /// Record batch could not be decoded
    #[error("malformed record batch: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ModelError {
    /// Check if error rejects a single record rather than the whole batch
    #[inline]
    #[must_use]
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::MissingKey | Self::InvalidDuration { .. } | Self::UnreadableDuration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_display() {
        let err = ModelError::InvalidDuration {
            item: "STORY-1".to_string(),
            stage: "in-development".to_string(),
            value: -2.0,
        };
        assert!(err.to_string().contains("STORY-1/in-development"));
    }

    #[test]
    fn record_level_classification() {
        assert!(ModelError::MissingKey.is_record_level());
        assert!(!ModelError::UnknownWorkflow("x".into()).is_record_level());
    }
}
