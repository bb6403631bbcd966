//! Synthesis configuration

use crate::error::SynthesisError;
use serde::{Deserialize, Serialize};

/// Weights of the priority score terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    pub severity: f64,
    pub urgency: f64,
    pub confidence: f64,
    pub impact: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            severity: 0.30,
            urgency: 0.25,
            confidence: 0.20,
            impact: 0.25,
        }
    }
}

impl PriorityWeights {
    #[inline]
    #[must_use]
    pub fn total(&self) -> f64 {
        self.severity + self.urgency + self.confidence + self.impact
    }
}

/// Insight synthesis tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Maximum pattern insights per run
    pub max_pattern_insights: usize,
    /// Knowledge documents cited per pattern insight
    pub max_knowledge_causes: usize,
    /// Lead time target in days
    pub target_lead_time_days: f64,
    /// Flow efficiency target in percent
    pub target_flow_efficiency_pct: f64,
    pub priority: PriorityWeights,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_pattern_insights: 6,
            max_knowledge_causes: 2,
            target_lead_time_days: 30.0,
            target_flow_efficiency_pct: 40.0,
            priority: PriorityWeights::default(),
        }
    }
}

impl SynthesisConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_max_pattern_insights(mut self, max: usize) -> Self {
        self.max_pattern_insights = max;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_target_lead_time(mut self, days: f64) -> Self {
        self.target_lead_time_days = days;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_priority_weights(mut self, weights: PriorityWeights) -> Self {
        self.priority = weights;
        self
    }

    /// Validate ranges
    ///
    /// # Errors
    /// Returns error if a target is not positive or the priority weights do
    /// not sum to 1
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.target_lead_time_days.is_nan() || self.target_lead_time_days <= 0.0 {
            return Err(SynthesisError::InvalidConfig(format!(
                "target_lead_time_days must be positive, got {}",
                self.target_lead_time_days
            )));
        }
        if !(0.0..=100.0).contains(&self.target_flow_efficiency_pct) {
            return Err(SynthesisError::InvalidConfig(format!(
                "target_flow_efficiency_pct must be within [0, 100], got {}",
                self.target_flow_efficiency_pct
            )));
        }
        let w = self.priority;
        if [w.severity, w.urgency, w.confidence, w.impact]
            .iter()
            .any(|x| *x < 0.0)
            || (w.total() - 1.0).abs() > 1e-6
        {
            return Err(SynthesisError::InvalidConfig(format!(
                "priority weights must be non-negative and sum to 1, got {:.3}",
                w.total()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SynthesisConfig::default().validate().is_ok());
        assert!((PriorityWeights::default().total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_unbalanced_weights() {
        let config = SynthesisConfig::new().with_priority_weights(PriorityWeights {
            severity: 0.5,
            ..PriorityWeights::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_target() {
        assert!(SynthesisConfig::new()
            .with_target_lead_time(0.0)
            .validate()
            .is_err());
    }
}
