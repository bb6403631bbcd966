//! Flow-health severity and pattern confidence

use crate::config::DetectorConfig;
use flowcoach_model::{MetricsSnapshot, Severity};

/// Overall flow-health tier of a snapshot
///
/// - critical: W > 2 × target or flow efficiency < 30 %
/// - warning: W > 1.5 × target or flow efficiency < 40 %
/// - info: W > target
/// - success: otherwise
#[must_use]
pub fn flow_health(snapshot: &MetricsSnapshot, config: &DetectorConfig) -> Severity {
    let target = config.target_lead_time_days;
    let lead = snapshot.avg_lead_time_days();
    let efficiency = snapshot.flow_efficiency_pct();

    if lead > 2.0 * target || efficiency < 30.0 {
        Severity::Critical
    } else if lead > 1.5 * target || efficiency < 40.0 {
        Severity::Warning
    } else if lead > target {
        Severity::Info
    } else {
        Severity::Success
    }
}

/// Confidence in [0, 1] from sample size and data completeness
///
/// Grows from 0.5 with one sample to 1.0 at 30 samples, scaled by completeness.
#[must_use]
pub fn sample_confidence(samples: usize, completeness: f64) -> f64 {
    let coverage = samples.min(30) as f64 / 30.0;
    ((0.5 + 0.5 * coverage) * completeness.clamp(0.0, 1.0)).clamp(0.0, 1.0)
}
