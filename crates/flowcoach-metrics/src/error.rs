//! Error types for the metrics engine

/// Metrics computation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    /// Too few completed items for meaningful statistics
    #[error("insufficient data: {completed} completed items, at least {minimum} required")]
    InsufficientData { completed: usize, minimum: usize },

    /// Analysis window has zero length
    #[error("analysis window has zero length")]
    EmptyWindow,

    /// Configuration value out of range
    #[error("invalid metrics configuration: {0}")]
    InvalidConfig(String),
}

impl MetricsError {
    /// Check if error means the data cannot support a snapshot
    ///
    /// Both a short sample and a zero-length window are reported as
    /// insufficient data rather than failures.
    #[inline]
    #[must_use]
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. } | Self::EmptyWindow)
    }
}
