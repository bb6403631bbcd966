//! Stuck-item detection
//!
//! An item is stuck when it has spent strictly more than the stage threshold
//! in a non-terminal stage. In-flight items are judged by their current
//! stage. Completed and cancelled items are only judged when the analysis
//! window is retrospective, by the non-terminal stage where they spent the
//! most time.

use crate::config::DetectorConfig;
use crate::severity::sample_confidence;
use flowcoach_model::{
    ItemStatus, MetricField, MetricsSnapshot, Pattern, PatternKind, PatternSubject, Severity,
    StageName, WorkItemFlowRecord, WorkflowShape,
};
use indexmap::IndexMap;

/// One item over its stage threshold
#[derive(Debug, Clone, PartialEq)]
pub struct StuckItem {
    pub key: String,
    pub stage: StageName,
    pub days: f64,
    pub threshold_days: f64,
}

/// Stage an item is judged in, with its days there
fn judged_stage(
    record: &WorkItemFlowRecord,
    workflow: WorkflowShape,
    include_terminal: bool,
) -> Option<(StageName, f64)> {
    match record.status() {
        ItemStatus::InProgress => {
            let stage = record.current_stage()?;
            if workflow.is_terminal(stage) {
                return None;
            }
            Some((stage.clone(), record.days_in_current_stage()?))
        }
        ItemStatus::Completed | ItemStatus::Cancelled if include_terminal => record
            .stages()
            .iter()
            .filter(|(stage, _)| !workflow.is_terminal(stage))
            .fold(None, |best: Option<(&StageName, f64)>, (stage, days)| match best {
                Some((_, most)) if most >= *days => best,
                _ => Some((stage, *days)),
            })
            .map(|(stage, days)| (stage.clone(), days)),
        _ => None,
    }
}

/// Find stuck items in workflow order of their stage, then by key
#[must_use]
pub fn find_stuck_items(
    records: &[&WorkItemFlowRecord],
    workflow: WorkflowShape,
    scope_threshold: f64,
    include_terminal: bool,
    config: &DetectorConfig,
) -> Vec<StuckItem> {
    let mut stuck: Vec<StuckItem> = records
        .iter()
        .filter_map(|record| {
            let (stage, days) = judged_stage(record, workflow, include_terminal)?;
            let threshold_days = config.threshold_for(&stage, scope_threshold);
            (days > threshold_days).then(|| StuckItem {
                key: record.key().to_string(),
                stage,
                days,
                threshold_days,
            })
        })
        .collect();
    stuck.sort_by(|a, b| {
        workflow
            .position(&a.stage)
            .cmp(&workflow.position(&b.stage))
            .then_with(|| a.key.cmp(&b.key))
    });
    stuck
}

/// Detect stuck-item patterns, one per stage holding stuck items
#[must_use]
pub fn detect_stuck(
    snapshot: &MetricsSnapshot,
    records: &[&WorkItemFlowRecord],
    scope_threshold: f64,
    include_terminal: bool,
    config: &DetectorConfig,
) -> Vec<Pattern> {
    let stuck = find_stuck_items(
        records,
        snapshot.workflow(),
        scope_threshold,
        include_terminal,
        config,
    );

    let mut by_stage: IndexMap<StageName, Vec<StuckItem>> = IndexMap::new();
    for item in stuck {
        by_stage.entry(item.stage.clone()).or_default().push(item);
    }

    let judged = if include_terminal {
        records.len()
    } else {
        records.iter().filter(|r| r.is_in_flight()).count()
    };

    by_stage
        .into_iter()
        .map(|(stage, items)| {
            let threshold = items[0].threshold_days;
            let longest = items.iter().map(|i| i.days).fold(0.0, f64::max);
            let severity = if longest > 2.0 * threshold || items.len() >= 5 {
                Severity::Critical
            } else {
                Severity::Warning
            };
            let impact = if judged > 0 {
                items.len() as f64 / judged as f64
            } else {
                0.0
            };
            let description = format!(
                "{} item(s) have spent more than {:.0} days in {} (longest {:.1} days).",
                items.len(),
                threshold,
                stage,
                longest
            );
            tracing::debug!("{} stuck item(s) in {}", items.len(), stage);
            Pattern::new(
                snapshot.scope_id(),
                PatternKind::StuckItem,
                severity,
                PatternSubject::Stage {
                    stage: stage.clone(),
                },
                description,
            )
            .with_optional_evidence(snapshot.stage_evidence(MetricField::StageMeanDays, &stage))
            .with_optional_evidence(snapshot.evidence(MetricField::InFlightCount))
            .with_confidence(sample_confidence(judged, snapshot.data_completeness()).max(0.6))
            .with_impact(impact)
            .with_affected_items(items.into_iter().map(|i| i.key).collect())
        })
        .collect()
}
