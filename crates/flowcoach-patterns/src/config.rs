//! Detector configuration

use crate::error::PatternError;
use flowcoach_model::StageName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pattern detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Per-stage time-in-stage thresholds overriding the scope threshold
    pub stage_thresholds: BTreeMap<String, f64>,
    /// Weight of mean time in stage in the bottleneck score
    pub time_weight: f64,
    /// Weight of the share of items over threshold in the bottleneck score
    pub exceed_weight: f64,
    /// Days that count as one unit of mean time in stage
    pub time_scale_days: f64,
    /// Lowest bottleneck score reported
    pub min_bottleneck_score: f64,
    /// Most bottlenecks reported
    pub max_bottlenecks: usize,
    /// Bottleneck score from which a bottleneck is critical
    pub critical_bottleneck_score: f64,
    /// Share by which in-flight items may exceed predicted WIP
    pub wip_tolerance: f64,
    /// Lead time coefficient of variation raising a warning
    pub cv_warning: f64,
    /// Lead time coefficient of variation raising a critical pattern
    pub cv_critical: f64,
    /// p95 / median lead time ratio raising a warning
    pub tail_ratio: f64,
    /// Target lead time used for flow-health severity
    pub target_lead_time_days: f64,
}

impl DetectorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With stage threshold override
    #[inline]
    #[must_use]
    pub fn with_stage_threshold(mut self, stage: &str, days: f64) -> Self {
        self.stage_thresholds
            .insert(StageName::new(stage).to_string(), days);
        self
    }

    /// With target lead time
    #[inline]
    #[must_use]
    pub fn with_target_lead_time(mut self, days: f64) -> Self {
        self.target_lead_time_days = days;
        self
    }

    /// With maximum number of bottlenecks
    #[inline]
    #[must_use]
    pub fn with_max_bottlenecks(mut self, max: usize) -> Self {
        self.max_bottlenecks = max;
        self
    }

    /// Time-in-stage threshold of a stage
    #[must_use]
    pub fn threshold_for(&self, stage: &StageName, scope_threshold: f64) -> f64 {
        self.stage_thresholds
            .iter()
            .find(|(name, _)| StageName::new(name.as_str()) == *stage)
            .map_or(scope_threshold, |(_, days)| *days)
    }

    /// Validate ranges
    ///
    /// # Errors
    /// Returns error if a weight, threshold or ratio is out of range
    pub fn validate(&self) -> Result<(), PatternError> {
        let invalid = |msg: String| Err(PatternError::InvalidConfig(msg));
        if self.time_weight < 0.0 || self.exceed_weight < 0.0 {
            return invalid("bottleneck weights must be non-negative".to_string());
        }
        if self.time_scale_days <= 0.0 {
            return invalid(format!(
                "time_scale_days must be positive, got {}",
                self.time_scale_days
            ));
        }
        if let Some((stage, days)) = self.stage_thresholds.iter().find(|(_, d)| **d <= 0.0) {
            return invalid(format!("threshold for '{stage}' must be positive, got {days}"));
        }
        if self.cv_warning > self.cv_critical {
            return invalid("cv_warning must not exceed cv_critical".to_string());
        }
        if self.target_lead_time_days <= 0.0 {
            return invalid("target_lead_time_days must be positive".to_string());
        }
        if self.wip_tolerance < 0.0 {
            return invalid("wip_tolerance must be non-negative".to_string());
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            stage_thresholds: BTreeMap::new(),
            time_weight: 0.6,
            exceed_weight: 0.4,
            time_scale_days: 10.0,
            min_bottleneck_score: 1.0,
            max_bottlenecks: 3,
            critical_bottleneck_score: 1.5,
            wip_tolerance: 0.25,
            cv_warning: 0.5,
            cv_critical: 1.0,
            tail_ratio: 3.0,
            target_lead_time_days: 30.0,
        }
    }
}
