//! Metrics snapshot
//!
//! A [`MetricsSnapshot`] is a pure derived value. Predicted WIP is computed
//! from throughput and lead time when the snapshot is assembled and cannot
//! be set independently, so `L = λ × W` always holds.

use crate::evidence::{EvidenceRef, MetricField};
use crate::scope::ScopeKind;
use crate::stage::{StageName, WorkflowShape};
use serde::Serialize;

/// Per-stage time statistics and WIP mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageMetrics {
    /// Stage name
    pub stage: StageName,
    /// Records with a duration for this stage
    pub sample_count: usize,
    /// Mean days
    pub mean_days: f64,
    /// Median days
    pub median_days: f64,
    /// 85th percentile days
    pub p85_days: f64,
    /// 95th percentile days
    pub p95_days: f64,
    /// Longest observed days
    pub max_days: f64,
    /// λ × stage mean
    pub predicted_wip: f64,
    /// ceil(predicted WIP × buffer)
    pub recommended_wip_limit: u32,
    /// Whether the stage counts as value-adding
    pub active: bool,
}

/// Lead time distribution of completed items
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LeadTimeDistribution {
    pub median_days: f64,
    pub p85_days: f64,
    pub p95_days: f64,
    pub std_dev_days: f64,
    /// Standard deviation over mean (0 when mean is 0)
    pub coefficient_of_variation: f64,
}

/// Capacity classification against historical baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    /// Utilization above the over-capacity threshold
    OverCapacity,
    /// Within thresholds
    Nominal,
    /// Utilization below the under-capacity threshold
    UnderCapacity,
}

impl CapacityStatus {
    /// Check if status deviates from nominal
    #[inline]
    #[must_use]
    pub fn is_flagged(self) -> bool {
        !matches!(self, Self::Nominal)
    }
}

/// Comparison of the current period with recent history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityBaseline {
    /// Number of past periods averaged
    pub periods_used: usize,
    /// Mean completed items per past period
    pub baseline_throughput: f64,
    /// Mean lead time over past periods that reported one
    pub baseline_lead_time_days: Option<f64>,
    /// Completed items in the current period
    pub current_throughput: f64,
    /// Completed items in the most recent past period
    pub previous_period_throughput: Option<f64>,
    /// (current − baseline) / baseline × 100
    pub throughput_deviation_pct: f64,
    /// (current W − baseline W) / baseline W × 100
    pub lead_time_deviation_pct: Option<f64>,
    /// current / baseline × 100
    pub utilization_pct: f64,
    /// Classification
    pub status: CapacityStatus,
}

/// Note left by a guarded computation that could not run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardNote {
    /// Field that was not computed
    pub field: MetricField,
    /// Why
    pub reason: String,
}

/// Inputs to [`MetricsSnapshot::from_parts`]
#[derive(Debug, Clone)]
pub struct SnapshotParts {
    pub scope: ScopeKind,
    pub scope_id: String,
    pub workflow: WorkflowShape,
    pub period_days: f64,
    pub total_count: usize,
    pub completed_count: usize,
    pub in_flight_count: usize,
    pub throughput_per_day: f64,
    pub avg_lead_time_days: f64,
    pub flow_efficiency_pct: f64,
    pub lead_time: LeadTimeDistribution,
    pub stages: Vec<StageMetrics>,
    pub baseline: Option<CapacityBaseline>,
    pub data_completeness: f64,
    pub guard_notes: Vec<GuardNote>,
}

/// Derived flow metrics for one scope and window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    scope: ScopeKind,
    scope_id: String,
    workflow: WorkflowShape,
    period_days: f64,
    total_count: usize,
    completed_count: usize,
    in_flight_count: usize,
    throughput_per_day: f64,
    avg_lead_time_days: f64,
    predicted_wip: f64,
    flow_efficiency_pct: f64,
    lead_time: LeadTimeDistribution,
    stages: Vec<StageMetrics>,
    baseline: Option<CapacityBaseline>,
    data_completeness: f64,
    guard_notes: Vec<GuardNote>,
}

impl MetricsSnapshot {
    /// Tolerance of the Little's Law identity check
    pub const EPSILON: f64 = 1e-9;

    /// Assemble snapshot, deriving predicted WIP
    ///
    /// Flow efficiency is clamped to [0, 100] and completeness to [0, 1].
    #[must_use]
    pub fn from_parts(parts: SnapshotParts) -> Self {
        let predicted_wip = parts.throughput_per_day * parts.avg_lead_time_days;
        Self {
            scope: parts.scope,
            scope_id: parts.scope_id,
            workflow: parts.workflow,
            period_days: parts.period_days,
            total_count: parts.total_count,
            completed_count: parts.completed_count,
            in_flight_count: parts.in_flight_count,
            throughput_per_day: parts.throughput_per_day,
            avg_lead_time_days: parts.avg_lead_time_days,
            predicted_wip,
            flow_efficiency_pct: parts.flow_efficiency_pct.clamp(0.0, 100.0),
            lead_time: parts.lead_time,
            stages: parts.stages,
            baseline: parts.baseline,
            data_completeness: parts.data_completeness.clamp(0.0, 1.0),
            guard_notes: parts.guard_notes,
        }
    }

    #[inline]
    #[must_use]
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    #[inline]
    #[must_use]
    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    #[inline]
    #[must_use]
    pub fn workflow(&self) -> WorkflowShape {
        self.workflow
    }

    #[inline]
    #[must_use]
    pub fn period_days(&self) -> f64 {
        self.period_days
    }

    #[inline]
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    #[inline]
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    #[inline]
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight_count
    }

    /// λ, completed items per day
    #[inline]
    #[must_use]
    pub fn throughput_per_day(&self) -> f64 {
        self.throughput_per_day
    }

    /// W, mean lead time in days
    #[inline]
    #[must_use]
    pub fn avg_lead_time_days(&self) -> f64 {
        self.avg_lead_time_days
    }

    /// L = λ × W
    #[inline]
    #[must_use]
    pub fn predicted_wip(&self) -> f64 {
        self.predicted_wip
    }

    /// Flow efficiency in [0, 100]
    #[inline]
    #[must_use]
    pub fn flow_efficiency_pct(&self) -> f64 {
        self.flow_efficiency_pct
    }

    /// Flow efficiency as reported (one decimal)
    #[inline]
    #[must_use]
    pub fn flow_efficiency_display(&self) -> f64 {
        display_percent(self.flow_efficiency_pct)
    }

    #[inline]
    #[must_use]
    pub fn lead_time(&self) -> &LeadTimeDistribution {
        &self.lead_time
    }

    /// Stage metrics in workflow order
    #[inline]
    #[must_use]
    pub fn stages(&self) -> &[StageMetrics] {
        &self.stages
    }

    /// Metrics of one stage
    #[must_use]
    pub fn stage(&self, stage: &StageName) -> Option<&StageMetrics> {
        self.stages.iter().find(|s| &s.stage == stage)
    }

    #[inline]
    #[must_use]
    pub fn baseline(&self) -> Option<&CapacityBaseline> {
        self.baseline.as_ref()
    }

    /// Share of records with complete stage data, in [0, 1]
    #[inline]
    #[must_use]
    pub fn data_completeness(&self) -> f64 {
        self.data_completeness
    }

    #[inline]
    #[must_use]
    pub fn guard_notes(&self) -> &[GuardNote] {
        &self.guard_notes
    }

    /// Check the Little's Law identity
    #[inline]
    #[must_use]
    pub fn satisfies_littles_law(&self) -> bool {
        (self.predicted_wip - self.throughput_per_day * self.avg_lead_time_days).abs()
            < Self::EPSILON
    }

    /// Read a field by name, for evidence resolution
    ///
    /// Stage-level fields need `stage`; baseline fields return `None`
    /// without a baseline.
    #[must_use]
    pub fn value_of(&self, field: MetricField, stage: Option<&str>) -> Option<f64> {
        if field.is_stage_level() {
            let metrics = self
                .stages
                .iter()
                .find(|s| stage.is_some_and(|name| s.stage.as_str() == name))?;
            return Some(match field {
                MetricField::StageMeanDays => metrics.mean_days,
                MetricField::StageP85Days => metrics.p85_days,
                MetricField::StagePredictedWip => metrics.predicted_wip,
                _ => f64::from(metrics.recommended_wip_limit),
            });
        }
        match field {
            MetricField::Throughput => Some(self.throughput_per_day),
            MetricField::AverageLeadTime => Some(self.avg_lead_time_days),
            MetricField::PredictedWip => Some(self.predicted_wip),
            MetricField::FlowEfficiency => Some(self.flow_efficiency_pct),
            MetricField::LeadTimeP85 => Some(self.lead_time.p85_days),
            MetricField::LeadTimeP95 => Some(self.lead_time.p95_days),
            MetricField::LeadTimeVariation => Some(self.lead_time.coefficient_of_variation),
            MetricField::BaselineDeviation => {
                self.baseline.as_ref().map(|b| b.throughput_deviation_pct)
            }
            MetricField::BaselineUtilization => self.baseline.as_ref().map(|b| b.utilization_pct),
            MetricField::CompletedCount => Some(self.completed_count as f64),
            MetricField::InFlightCount => Some(self.in_flight_count as f64),
            MetricField::DataCompleteness => Some(self.data_completeness),
            _ => None,
        }
    }

    /// Build an evidence reference to a workflow-level field
    ///
    /// Returns `None` if the field has no value in this snapshot.
    #[must_use]
    pub fn evidence(&self, field: MetricField) -> Option<EvidenceRef> {
        self.value_of(field, None)
            .map(|value| EvidenceRef::metric(field, value))
    }

    /// Build an evidence reference to a stage-level field
    #[must_use]
    pub fn stage_evidence(&self, field: MetricField, stage: &StageName) -> Option<EvidenceRef> {
        self.value_of(field, Some(stage.as_str()))
            .map(|value| EvidenceRef::stage_metric(field, stage.as_str(), value))
    }
}

/// Round a percentage for reporting
///
/// Values are kept at hundredths of a percent, and the reported figure is
/// rounded half-up to one decimal from that hundredths value
/// (19.3 / 50.2 → 38.45 → 38.5).
#[must_use]
pub fn display_percent(value: f64) -> f64 {
    let hundredths = (value * 100.0).round() as i64;
    let tenths = if hundredths >= 0 {
        (hundredths + 5) / 10
    } else {
        (hundredths - 5) / 10
    };
    tenths as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> SnapshotParts {
        SnapshotParts {
            scope: ScopeKind::Team,
            scope_id: "team-a".to_string(),
            workflow: WorkflowShape::Story,
            period_days: 84.0,
            total_count: 50,
            completed_count: 42,
            in_flight_count: 8,
            throughput_per_day: 0.5,
            avg_lead_time_days: 50.0,
            flow_efficiency_pct: 38.45,
            lead_time: LeadTimeDistribution::default(),
            stages: vec![StageMetrics {
                stage: StageName::new("code-review"),
                sample_count: 42,
                mean_days: 4.0,
                median_days: 3.0,
                p85_days: 6.0,
                p95_days: 8.0,
                max_days: 12.0,
                predicted_wip: 2.0,
                recommended_wip_limit: 3,
                active: true,
            }],
            baseline: None,
            data_completeness: 1.0,
            guard_notes: Vec::new(),
        }
    }

    #[test]
    fn predicted_wip_is_derived() {
        let snapshot = MetricsSnapshot::from_parts(parts());
        assert_eq!(snapshot.predicted_wip(), 25.0);
        assert!(snapshot.satisfies_littles_law());
    }

    #[test]
    fn flow_efficiency_clamped() {
        let mut p = parts();
        p.flow_efficiency_pct = 140.0;
        assert_eq!(MetricsSnapshot::from_parts(p).flow_efficiency_pct(), 100.0);
    }

    #[test]
    fn display_percent_rounds_from_hundredths() {
        assert_eq!(display_percent(19.3 / 50.2 * 100.0), 38.5);
        assert_eq!(display_percent(38.44), 38.4);
        assert_eq!(display_percent(0.0), 0.0);
        assert_eq!(display_percent(100.0), 100.0);
    }

    #[test]
    fn value_of_stage_field_requires_stage() {
        let snapshot = MetricsSnapshot::from_parts(parts());
        assert_eq!(snapshot.value_of(MetricField::StageWipLimit, None), None);
        assert_eq!(
            snapshot.value_of(MetricField::StageWipLimit, Some("code-review")),
            Some(3.0)
        );
        assert_eq!(snapshot.value_of(MetricField::BaselineUtilization, None), None);
    }

    #[test]
    fn evidence_carries_current_value() {
        let snapshot = MetricsSnapshot::from_parts(parts());
        let evidence = snapshot.evidence(MetricField::Throughput).unwrap();
        assert_eq!(evidence, EvidenceRef::metric(MetricField::Throughput, 0.5));
    }
}
