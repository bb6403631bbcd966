//! WIP distribution and high-WIP detection

use crate::config::DetectorConfig;
use crate::severity::sample_confidence;
use flowcoach_model::{
    MetricField, MetricsSnapshot, Pattern, PatternKind, PatternSubject, Severity, StageName,
    WorkItemFlowRecord, WorkflowShape,
};
use indexmap::IndexMap;
use serde::Serialize;

/// In-flight items by current stage and by team
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WipDistribution {
    /// Counts in workflow order
    pub by_stage: IndexMap<StageName, usize>,
    /// Counts sorted by team name; untagged items under `unassigned`
    pub by_team: IndexMap<String, usize>,
    /// All in-flight items
    pub total: usize,
}

impl WipDistribution {
    /// Count in-flight items
    #[must_use]
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a WorkItemFlowRecord>,
        workflow: WorkflowShape,
    ) -> Self {
        let mut by_stage: IndexMap<StageName, usize> = IndexMap::new();
        let mut by_team: IndexMap<String, usize> = IndexMap::new();
        let mut total = 0;
        for record in records.into_iter().filter(|r| r.is_in_flight()) {
            total += 1;
            if let Some(stage) = record.current_stage() {
                *by_stage.entry(stage.clone()).or_default() += 1;
            }
            let team = record.team().unwrap_or("unassigned").to_string();
            *by_team.entry(team).or_default() += 1;
        }
        by_stage.sort_by(|a, _, b, _| workflow.position(a).cmp(&workflow.position(b)));
        by_team.sort_keys();
        Self {
            by_stage,
            by_team,
            total,
        }
    }

    /// In-flight count of a stage
    #[inline]
    #[must_use]
    pub fn stage_count(&self, stage: &StageName) -> usize {
        self.by_stage.get(stage).copied().unwrap_or(0)
    }
}

/// Detect high-WIP patterns
///
/// One pattern per stage whose in-flight count exceeds its recommended
/// limit, plus one workflow-level pattern when total in-flight items exceed
/// predicted WIP by more than the tolerance.
#[must_use]
pub fn detect_high_wip(
    snapshot: &MetricsSnapshot,
    distribution: &WipDistribution,
    config: &DetectorConfig,
) -> Vec<Pattern> {
    let confidence = sample_confidence(snapshot.completed_count(), snapshot.data_completeness());
    let mut patterns = Vec::new();

    for metrics in snapshot.stages() {
        let count = distribution.stage_count(&metrics.stage);
        let limit = metrics.recommended_wip_limit;
        if count as u32 <= limit {
            continue;
        }
        let ratio = count as f64 / f64::from(limit.max(1));
        let severity = if ratio > 1.5 {
            Severity::Critical
        } else {
            Severity::Warning
        };
        patterns.push(
            Pattern::new(
                snapshot.scope_id(),
                PatternKind::HighWip,
                severity,
                PatternSubject::Stage {
                    stage: metrics.stage.clone(),
                },
                format!(
                    "{} items are in {} against a recommended limit of {}.",
                    count, metrics.stage, limit
                ),
            )
            .with_optional_evidence(
                snapshot.stage_evidence(MetricField::StageWipLimit, &metrics.stage),
            )
            .with_optional_evidence(
                snapshot.stage_evidence(MetricField::StagePredictedWip, &metrics.stage),
            )
            .with_confidence(confidence)
            .with_impact(1.0 - 1.0 / ratio),
        );
    }

    let predicted = snapshot.predicted_wip();
    let total = distribution.total as f64;
    if total > predicted * (1.0 + config.wip_tolerance) {
        let excess = if predicted > 0.0 {
            (total - predicted) / predicted
        } else {
            1.0
        };
        let severity = if excess > 2.0 * config.wip_tolerance.max(0.25) {
            Severity::Critical
        } else {
            Severity::Warning
        };
        patterns.push(
            Pattern::new(
                snapshot.scope_id(),
                PatternKind::HighWip,
                severity,
                PatternSubject::Workflow,
                format!(
                    "{} items are in flight while throughput and lead time predict {:.1}.",
                    distribution.total, predicted
                ),
            )
            .with_optional_evidence(snapshot.evidence(MetricField::PredictedWip))
            .with_optional_evidence(snapshot.evidence(MetricField::InFlightCount))
            .with_confidence(confidence)
            .with_impact(excess.min(1.0)),
        );
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcoach_test_utils::in_flight_story;

    #[test]
    fn distribution_orders_stages_by_workflow() {
        let records = vec![
            in_flight_story("A", "beta", "in-testing", 1.0),
            in_flight_story("B", "alpha", "in-development", 1.0),
            in_flight_story("C", "alpha", "in-testing", 1.0),
        ];
        let dist = WipDistribution::from_records(&records, WorkflowShape::Story);
        let stages: Vec<&str> = dist.by_stage.keys().map(StageName::as_str).collect();
        assert_eq!(stages, vec!["in-development", "in-testing"]);
        let teams: Vec<(&str, usize)> =
            dist.by_team.iter().map(|(t, c)| (t.as_str(), *c)).collect();
        assert_eq!(teams, vec![("alpha", 2), ("beta", 1)]);
        assert_eq!(dist.total, 3);
        assert_eq!(dist.stage_count(&StageName::new("in-testing")), 2);
    }
}
