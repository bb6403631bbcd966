//! Metrics engine configuration

use crate::error::MetricsError;
use flowcoach_model::{StageName, WorkflowShape};
use serde::{Deserialize, Serialize};

/// Metrics engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Value-adding stages of the feature workflow
    pub feature_active_stages: Vec<String>,
    /// Value-adding stages of the story workflow
    pub story_active_stages: Vec<String>,
    /// Multiplier applied to stage predicted WIP for the recommended limit
    pub wip_buffer: f64,
    /// Number of most recent past periods averaged into the baseline
    pub baseline_periods: usize,
    /// Fewest completed items that still yield a snapshot
    pub min_completed: usize,
    /// Utilization (percent) above which capacity is exceeded
    pub over_capacity_pct: f64,
    /// Utilization (percent) below which capacity is underused
    pub under_capacity_pct: f64,
}

impl MetricsConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With WIP limit buffer
    #[inline]
    #[must_use]
    pub fn with_wip_buffer(mut self, buffer: f64) -> Self {
        self.wip_buffer = buffer;
        self
    }

    /// With baseline period count
    #[inline]
    #[must_use]
    pub fn with_baseline_periods(mut self, periods: usize) -> Self {
        self.baseline_periods = periods;
        self
    }

    /// With minimum completed items
    #[inline]
    #[must_use]
    pub fn with_min_completed(mut self, min: usize) -> Self {
        self.min_completed = min;
        self
    }

    /// With active stages of a workflow shape
    #[must_use]
    pub fn with_active_stages(mut self, shape: WorkflowShape, stages: &[&str]) -> Self {
        let stages = stages.iter().map(ToString::to_string).collect();
        match shape {
            WorkflowShape::Feature => self.feature_active_stages = stages,
            WorkflowShape::Story => self.story_active_stages = stages,
        }
        self
    }

    /// Active stages of a workflow shape, normalized
    #[must_use]
    pub fn active_stages(&self, shape: WorkflowShape) -> Vec<StageName> {
        let names = match shape {
            WorkflowShape::Feature => &self.feature_active_stages,
            WorkflowShape::Story => &self.story_active_stages,
        };
        names.iter().map(StageName::new).collect()
    }

    /// Validate ranges
    ///
    /// # Errors
    /// Returns error if a value is out of range
    pub fn validate(&self) -> Result<(), MetricsError> {
        if !(self.wip_buffer.is_finite() && self.wip_buffer >= 1.0) {
            return Err(MetricsError::InvalidConfig(format!(
                "wip_buffer must be at least 1.0, got {}",
                self.wip_buffer
            )));
        }
        if self.baseline_periods == 0 {
            return Err(MetricsError::InvalidConfig(
                "baseline_periods must be positive".to_string(),
            ));
        }
        if self.min_completed == 0 {
            return Err(MetricsError::InvalidConfig(
                "min_completed must be positive".to_string(),
            ));
        }
        if self.under_capacity_pct >= self.over_capacity_pct {
            return Err(MetricsError::InvalidConfig(format!(
                "under_capacity_pct ({}) must be below over_capacity_pct ({})",
                self.under_capacity_pct, self.over_capacity_pct
            )));
        }
        for shape in [WorkflowShape::Feature, WorkflowShape::Story] {
            if let Some(stage) = self
                .active_stages(shape)
                .into_iter()
                .find(|s| !shape.contains(s))
            {
                return Err(MetricsError::InvalidConfig(format!(
                    "active stage '{stage}' is not part of the {shape} workflow"
                )));
            }
        }
        Ok(())
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        let defaults = |shape: WorkflowShape| {
            shape
                .default_active_stages()
                .iter()
                .map(ToString::to_string)
                .collect()
        };
        Self {
            feature_active_stages: defaults(WorkflowShape::Feature),
            story_active_stages: defaults(WorkflowShape::Story),
            wip_buffer: 1.2,
            baseline_periods: 8,
            min_completed: 5,
            over_capacity_pct: 120.0,
            under_capacity_pct: 70.0,
        }
    }
}
