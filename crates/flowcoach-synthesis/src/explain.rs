//! Explanatory insights
//!
//! When no metrics can be computed the run still answers with an insight
//! that says why, citing the counts it had.

use flowcoach_model::{
    Action, Comparison, ConfidenceTier, Effort, EvidenceRef, ExpectedOutcomes, IndicatorKind,
    Insight, InsightCategory, Interpretation, MetricField, ModelError, Observation,
    ReferenceKind, RootCause, RootCauseSource, ScopeDescriptor, Severity, Timeframe,
    WatchedMetric,
};

fn scope_phrase(scope: &ScopeDescriptor) -> String {
    format!("{} '{}'", scope.kind.noun(), scope.scope_id)
}

/// Insight for a run whose flow data could not be fetched
pub(crate) fn data_unavailable(scope: &ScopeDescriptor, reason: &str) -> Result<Insight, ModelError> {
    let evidence = EvidenceRef::metric(MetricField::CompletedCount, 0.0);
    Insight::builder(InsightCategory::DataUnavailable, scope.kind, &scope.scope_id)
        .subject("data")
        .title("Flow data unavailable")
        .severity(Severity::Info)
        .confidence(ConfidenceTier::High.percent())
        .observation(Observation {
            statement: format!(
                "No flow records could be retrieved for {}: {}.",
                scope_phrase(scope),
                reason.trim_end_matches('.')
            ),
            comparisons: Vec::new(),
            confidence_tier: ConfidenceTier::Low,
            sample_size: 0,
        })
        .interpretation(Interpretation {
            summary: "Flow metrics, patterns and recommendations cannot be produced until flow data is available. This is a data gap, not a finding about the flow.".to_string(),
            scope_qualifier: format!(
                "Applies to {} for the {:.0}-day window.",
                scope_phrase(scope),
                scope.window.period_days()
            ),
            enrichment: None,
        })
        .root_cause(RootCause {
            description: reason.to_string(),
            evidence: evidence.clone(),
            confidence: 1.0,
            source: RootCauseSource::Quantitative,
        })
        .action(
            Timeframe::ShortTerm,
            Action::new(
                "Check the flow data connection and the program, period and team filters of the request.",
                "Release Train Engineer",
                Effort::Low,
                "The next run retrieves flow records for this scope.",
            ),
        )
        .action(
            Timeframe::MediumTerm,
            Action::new(
                "Confirm that work items in this scope record their stage transitions.",
                "Scrum Master",
                Effort::Medium,
                "Every completed item carries stage durations.",
            ),
        )
        .outcomes(ExpectedOutcomes {
            metrics_to_watch: vec![WatchedMetric {
                metric: MetricField::CompletedCount,
                indicator: IndicatorKind::Leading,
                current: Some(0.0),
                target: None,
            }],
            timeline: "As soon as flow data is available.".to_string(),
            risks: vec!["Decisions taken without flow data rest on anecdote.".to_string()],
        })
        .evidence(evidence)
        .evidence(EvidenceRef::metric(MetricField::InFlightCount, 0.0))
        .build()
}

/// Insight for a run with too few completed items
pub(crate) fn insufficient_data(
    scope: &ScopeDescriptor,
    completed: usize,
    minimum: usize,
    in_flight: usize,
) -> Result<Insight, ModelError> {
    let completed_f = completed as f64;
    let evidence = EvidenceRef::metric(MetricField::CompletedCount, completed_f);
    let days = scope.window.period_days();
    let reason = if days <= 0.0 {
        "The analysis window is empty, so no throughput can be measured.".to_string()
    } else {
        format!(
            "Only {completed} item(s) completed in the {days:.0}-day window; at least {minimum} are needed for reliable flow metrics."
        )
    };

    Insight::builder(InsightCategory::InsufficientData, scope.kind, &scope.scope_id)
        .subject("data")
        .title("Not enough completed work to analyze flow")
        .severity(Severity::Info)
        .confidence(ConfidenceTier::High.percent())
        .observation(Observation {
            statement: format!("{reason} {in_flight} item(s) are still in flight."),
            comparisons: vec![Comparison::new(
                MetricField::CompletedCount,
                completed_f,
                minimum as f64,
                ReferenceKind::Target,
            )],
            confidence_tier: ConfidenceTier::Low,
            sample_size: completed,
        })
        .interpretation(Interpretation {
            summary: "Throughput, lead time and bottleneck figures from so few items would mislead more than inform, so pattern detection was skipped.".to_string(),
            scope_qualifier: format!("Applies to {} for the {days:.0}-day window.", scope_phrase(scope)),
            enrichment: None,
        })
        .root_cause(RootCause {
            description: reason,
            evidence: evidence.clone(),
            confidence: 1.0,
            source: RootCauseSource::Quantitative,
        })
        .action(
            Timeframe::ShortTerm,
            Action::new(
                format!("Widen the window or scope so that at least {minimum} completed items are included."),
                "Scrum Master",
                Effort::Low,
                format!("The next analysis covers {minimum} or more completed items."),
            ),
        )
        .action(
            Timeframe::MediumTerm,
            Action::new(
                "Keep item status and stage transitions current so completions are counted.",
                "Team Lead",
                Effort::Low,
                "Completed items appear in the flow data within a day.",
            ),
        )
        .outcomes(ExpectedOutcomes {
            metrics_to_watch: vec![WatchedMetric {
                metric: MetricField::CompletedCount,
                indicator: IndicatorKind::Leading,
                current: Some(completed_f),
                target: Some(minimum as f64),
            }],
            timeline: "Once enough items complete within the window.".to_string(),
            risks: vec!["Widening the window mixes older ways of working into the figures.".to_string()],
        })
        .evidence(evidence)
        .evidence(EvidenceRef::metric(MetricField::InFlightCount, in_flight as f64))
        .build()
}
