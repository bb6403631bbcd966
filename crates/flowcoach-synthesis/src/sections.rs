//! Shared section helpers

use flowcoach_model::{
    IndicatorKind, MetricField, MetricsSnapshot, ScopeDescriptor, WatchedMetric,
};

/// Scope statement attached to every interpretation
pub(crate) fn qualifier(scope: &ScopeDescriptor, snapshot: &MetricsSnapshot) -> String {
    format!(
        "Applies to {} '{}' over {:.0} days of {} flow data; describes the system of work, not individuals.",
        scope.kind.noun(),
        scope.scope_id,
        snapshot.period_days(),
        snapshot.workflow().as_str()
    )
}

/// Watched metric with its current snapshot value
pub(crate) fn watched(
    snapshot: &MetricsSnapshot,
    metric: MetricField,
    indicator: IndicatorKind,
    target: Option<f64>,
    stage: Option<&str>,
) -> WatchedMetric {
    WatchedMetric {
        metric,
        indicator,
        current: snapshot.value_of(metric, stage),
        target,
    }
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
