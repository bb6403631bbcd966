//! Error types for pattern detection

/// Pattern detector errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    /// Configuration value out of range
    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),
}
