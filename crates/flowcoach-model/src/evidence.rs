//! Evidence references
//!
//! Every root cause and every insight points back at the exact snapshot
//! field or detected pattern it was derived from.

use crate::id::PatternId;
use crate::pattern::PatternKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Addressable fields of a metrics snapshot
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    /// Items completed per day (λ)
    Throughput,
    /// Mean lead time of completed items (W)
    AverageLeadTime,
    /// Little's Law work in progress (L)
    PredictedWip,
    /// Active time share of lead time, percent
    FlowEfficiency,
    /// 85th percentile lead time
    LeadTimeP85,
    /// 95th percentile lead time
    LeadTimeP95,
    /// Coefficient of variation of lead time
    LeadTimeVariation,
    /// Mean days in a stage
    StageMeanDays,
    /// 85th percentile days in a stage
    StageP85Days,
    /// Little's Law WIP of a stage
    StagePredictedWip,
    /// Recommended WIP limit of a stage
    StageWipLimit,
    /// Deviation of throughput from historical baseline, percent
    BaselineDeviation,
    /// Current throughput as percent of historical baseline
    BaselineUtilization,
    /// Number of completed items
    CompletedCount,
    /// Number of in-flight items
    InFlightCount,
    /// Share of records with complete stage data
    DataCompleteness,
}

impl MetricField {
    /// Check if field is qualified by a stage
    #[inline]
    #[must_use]
    pub fn is_stage_level(self) -> bool {
        matches!(
            self,
            Self::StageMeanDays | Self::StageP85Days | Self::StagePredictedWip | Self::StageWipLimit
        )
    }

    /// Snake-case field name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Throughput => "throughput",
            Self::AverageLeadTime => "average_lead_time",
            Self::PredictedWip => "predicted_wip",
            Self::FlowEfficiency => "flow_efficiency",
            Self::LeadTimeP85 => "lead_time_p85",
            Self::LeadTimeP95 => "lead_time_p95",
            Self::LeadTimeVariation => "lead_time_variation",
            Self::StageMeanDays => "stage_mean_days",
            Self::StageP85Days => "stage_p85_days",
            Self::StagePredictedWip => "stage_predicted_wip",
            Self::StageWipLimit => "stage_wip_limit",
            Self::BaselineDeviation => "baseline_deviation",
            Self::BaselineUtilization => "baseline_utilization",
            Self::CompletedCount => "completed_count",
            Self::InFlightCount => "in_flight_count",
            Self::DataCompleteness => "data_completeness",
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Throughput => "throughput",
            Self::AverageLeadTime => "average lead time",
            Self::PredictedWip => "predicted WIP",
            Self::FlowEfficiency => "flow efficiency",
            Self::LeadTimeP85 => "85th percentile lead time",
            Self::LeadTimeP95 => "95th percentile lead time",
            Self::LeadTimeVariation => "lead time variation",
            Self::StageMeanDays => "mean time in stage",
            Self::StageP85Days => "85th percentile time in stage",
            Self::StagePredictedWip => "stage WIP",
            Self::StageWipLimit => "stage WIP limit",
            Self::BaselineDeviation => "deviation from baseline",
            Self::BaselineUtilization => "capacity utilization",
            Self::CompletedCount => "completed items",
            Self::InFlightCount => "items in flight",
            Self::DataCompleteness => "data completeness",
        }
    }
}

impl Display for MetricField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the quantitative evidence behind a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvidenceRef {
    /// A snapshot field, optionally qualified by stage
    Metric {
        field: MetricField,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stage: Option<String>,
        value: f64,
    },
    /// A detected pattern
    Pattern { id: PatternId, kind: PatternKind },
}

impl EvidenceRef {
    /// Reference a workflow-level metric
    #[inline]
    #[must_use]
    pub fn metric(field: MetricField, value: f64) -> Self {
        Self::Metric {
            field,
            stage: None,
            value,
        }
    }

    /// Reference a stage-level metric
    #[inline]
    #[must_use]
    pub fn stage_metric(field: MetricField, stage: impl Into<String>, value: f64) -> Self {
        Self::Metric {
            field,
            stage: Some(stage.into()),
            value,
        }
    }

    /// Reference a pattern
    #[inline]
    #[must_use]
    pub fn pattern(id: PatternId, kind: PatternKind) -> Self {
        Self::Pattern { id, kind }
    }

    /// Short description for prose
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Metric {
                field,
                stage: Some(stage),
                value,
            } => format!("{} of {} = {:.1}", field.label(), stage, value),
            Self::Metric { field, value, .. } => format!("{} = {:.1}", field.label(), value),
            Self::Pattern { id, kind } => format!("{} pattern {}", kind.label(), id),
        }
    }
}
