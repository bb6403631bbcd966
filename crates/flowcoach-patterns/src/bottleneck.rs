//! Bottleneck scoring
//!
//! score = time_weight × (mean days / time scale) + exceed_weight × share of
//! items over the stage threshold. Terminal stages never score. Both terms
//! are taken over completed items; in-flight durations are still growing.

use crate::config::DetectorConfig;
use crate::severity::sample_confidence;
use flowcoach_model::{
    MetricField, MetricsSnapshot, Pattern, PatternKind, PatternSubject, Severity, StageName,
    WorkItemFlowRecord,
};
use rayon::prelude::*;

/// Score of one stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageScore {
    pub stage: StageName,
    pub score: f64,
    pub mean_days: f64,
    pub threshold_days: f64,
    pub exceed_fraction: f64,
    pub samples: usize,
}

/// Score every non-terminal stage of the snapshot
///
/// Results are sorted by score descending, then stage name.
#[must_use]
pub fn score_stages(
    snapshot: &MetricsSnapshot,
    records: &[&WorkItemFlowRecord],
    scope_threshold: f64,
    config: &DetectorConfig,
) -> Vec<StageScore> {
    let workflow = snapshot.workflow();
    let mut scores: Vec<StageScore> = snapshot
        .stages()
        .par_iter()
        .filter(|m| !workflow.is_terminal(&m.stage))
        .map(|m| {
            let threshold_days = config.threshold_for(&m.stage, scope_threshold);
            let observed: Vec<f64> = records
                .iter()
                .filter(|r| r.is_completed())
                .filter_map(|r| r.stage_days(&m.stage))
                .collect();
            let exceed_fraction = if observed.is_empty() {
                0.0
            } else {
                observed.iter().filter(|d| **d > threshold_days).count() as f64
                    / observed.len() as f64
            };
            let score = config.time_weight * (m.mean_days / config.time_scale_days)
                + config.exceed_weight * exceed_fraction;
            StageScore {
                stage: m.stage.clone(),
                score,
                mean_days: m.mean_days,
                threshold_days,
                exceed_fraction,
                samples: observed.len(),
            }
        })
        .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.stage.cmp(&b.stage)));
    scores
}

/// Detect bottleneck patterns
///
/// Stages scoring at least `min_bottleneck_score` are reported, at most
/// `max_bottlenecks` of them.
#[must_use]
pub fn detect_bottlenecks(
    snapshot: &MetricsSnapshot,
    records: &[&WorkItemFlowRecord],
    scope_threshold: f64,
    config: &DetectorConfig,
) -> Vec<Pattern> {
    score_stages(snapshot, records, scope_threshold, config)
        .into_iter()
        .filter(|s| s.score >= config.min_bottleneck_score)
        .take(config.max_bottlenecks)
        .map(|s| {
            let severity = if s.score >= config.critical_bottleneck_score {
                Severity::Critical
            } else {
                Severity::Warning
            };
            let impact = if snapshot.avg_lead_time_days() > 0.0 {
                s.mean_days / snapshot.avg_lead_time_days()
            } else {
                0.0
            };
            tracing::debug!("Bottleneck at {} (score {:.2})", s.stage, s.score);
            Pattern::new(
                snapshot.scope_id(),
                PatternKind::Bottleneck,
                severity,
                PatternSubject::Stage {
                    stage: s.stage.clone(),
                },
                format!(
                    "Work spends {:.1} days on average in {} and {:.0}% of items exceed the {:.0}-day threshold.",
                    s.mean_days,
                    s.stage,
                    s.exceed_fraction * 100.0,
                    s.threshold_days
                ),
            )
            .with_optional_evidence(snapshot.stage_evidence(MetricField::StageMeanDays, &s.stage))
            .with_optional_evidence(snapshot.stage_evidence(MetricField::StageP85Days, &s.stage))
            .with_optional_evidence(
                snapshot.stage_evidence(MetricField::StagePredictedWip, &s.stage),
            )
            .with_confidence(sample_confidence(s.samples, snapshot.data_completeness()))
            .with_impact(impact)
            .with_score(s.score)
        })
        .collect()
}
