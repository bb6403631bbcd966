//! Lead time predictability

use crate::config::DetectorConfig;
use crate::severity::sample_confidence;
use flowcoach_model::{MetricField, MetricsSnapshot, Pattern, PatternKind, PatternSubject, Severity};

/// Detect a low-predictability pattern from the lead time distribution
///
/// Critical when the coefficient of variation reaches `cv_critical`; warning
/// when it reaches `cv_warning` or p95 / median reaches `tail_ratio`.
#[must_use]
pub fn detect_low_predictability(
    snapshot: &MetricsSnapshot,
    config: &DetectorConfig,
) -> Option<Pattern> {
    let lead = snapshot.lead_time();
    let cv = lead.coefficient_of_variation;
    let tail = if lead.median_days > 0.0 {
        lead.p95_days / lead.median_days
    } else {
        0.0
    };

    let severity = if cv >= config.cv_critical {
        Severity::Critical
    } else if cv >= config.cv_warning || tail >= config.tail_ratio {
        Severity::Warning
    } else {
        return None;
    };

    Some(
        Pattern::new(
            snapshot.scope_id(),
            PatternKind::LowPredictability,
            severity,
            PatternSubject::Workflow,
            format!(
                "Lead time varies widely: coefficient of variation {:.2}, 95th percentile {:.1} days against a median of {:.1}.",
                cv, lead.p95_days, lead.median_days
            ),
        )
        .with_optional_evidence(snapshot.evidence(MetricField::LeadTimeVariation))
        .with_optional_evidence(snapshot.evidence(MetricField::LeadTimeP95))
        .with_confidence(sample_confidence(
            snapshot.completed_count(),
            snapshot.data_completeness(),
        ))
        .with_impact((cv / (2.0 * config.cv_critical)).min(1.0)),
    )
}
