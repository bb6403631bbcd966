//! One insight per detected pattern

use crate::config::SynthesisConfig;
use crate::heuristics;
use crate::sections::{qualifier, watched};
use flowcoach_knowledge::ScoredDocument;
use flowcoach_model::{
    Action, Comparison, ConfidenceTier, Effort, EvidenceRef, ExpectedOutcomes, Insight,
    InsightCategory, Interpretation, MetricField, MetricsSnapshot, ModelError, Observation,
    Pattern, PatternKind, PatternSubject, ReferenceKind, RootCause, RootCauseSource,
    ScopeDescriptor, Timeframe,
};

/// Insight for one pattern and its impact (0–100)
pub(crate) fn pattern_insight(
    scope: &ScopeDescriptor,
    snapshot: &MetricsSnapshot,
    pattern: &Pattern,
    knowledge: &[ScoredDocument],
    config: &SynthesisConfig,
) -> Result<(Insight, f64), ModelError> {
    let stage = pattern.subject.stage().map(|s| s.as_str());
    let threshold = scope.stuck_threshold_days;
    let tier = ConfidenceTier::from_sample(snapshot.completed_count(), snapshot.data_completeness());

    let mut builder = Insight::builder(pattern.kind.into(), scope.kind, &scope.scope_id)
        .subject(pattern.id.to_string())
        .title(title(pattern))
        .severity(pattern.severity)
        .confidence((pattern.confidence * 100.0).round() as u8)
        .observation(Observation {
            statement: pattern.description.clone(),
            comparisons: comparisons(snapshot, pattern, threshold),
            confidence_tier: tier,
            sample_size: snapshot.completed_count(),
        })
        .interpretation(Interpretation {
            summary: summary(scope, pattern, threshold),
            scope_qualifier: qualifier(scope, snapshot),
            enrichment: None,
        })
        .evidence(pattern.as_evidence());
    for evidence in &pattern.evidence {
        builder = builder.evidence(evidence.clone());
    }

    // quantitative cause read off the first metric the pattern cites
    if let Some(evidence) = pattern
        .evidence
        .iter()
        .find(|e| matches!(e, EvidenceRef::Metric { .. }))
    {
        builder = builder.root_cause(RootCause {
            description: format!("Measured {}.", evidence.describe()),
            evidence: evidence.clone(),
            confidence: pattern.confidence,
            source: RootCauseSource::Quantitative,
        });
    }

    let cited: Vec<&ScoredDocument> = knowledge.iter().take(config.max_knowledge_causes).collect();
    if cited.is_empty() {
        builder = builder.root_causes(heuristics::root_causes(pattern).into_iter().map(|d| {
            RootCause {
                description: d,
                evidence: pattern.as_evidence(),
                confidence: pattern.confidence * 0.75,
                source: RootCauseSource::Heuristic,
            }
        }));
    } else {
        for hit in &cited {
            let doc = &hit.document;
            builder = builder.root_cause(RootCause {
                description: doc
                    .root_causes
                    .first()
                    .cloned()
                    .unwrap_or_else(|| doc.title.clone()),
                evidence: pattern.as_evidence(),
                confidence: hit.score.clamp(0.0, 1.0) * tier_weight(doc.confidence),
                source: RootCauseSource::Knowledge {
                    document_id: doc.id.to_string(),
                    title: doc.title.clone(),
                },
            });
        }
    }

    for (timeframe, action) in heuristics::actions(pattern) {
        builder = builder.action(timeframe, action);
    }
    for hit in &cited {
        let doc = &hit.document;
        if let Some(practice) = doc.practices.first() {
            builder = builder.action(
                Timeframe::MediumTerm,
                Action::new(
                    practice.clone(),
                    doc.owner_role.clone().unwrap_or_else(|| "Scrum Master".to_string()),
                    Effort::Medium,
                    format!(
                        "{} improves within the next period.",
                        capitalize_label(heuristics::watched_metrics(pattern.kind)[0].0)
                    ),
                ),
            );
        }
    }

    let metrics_to_watch = heuristics::watched_metrics(pattern.kind)
        .into_iter()
        .map(|(field, indicator)| {
            let target = target_for(field, snapshot, threshold, config);
            watched(
                snapshot,
                field,
                indicator,
                target,
                if field.is_stage_level() { stage } else { None },
            )
        })
        .collect();
    builder = builder.outcomes(ExpectedOutcomes {
        metrics_to_watch,
        timeline: heuristics::timeline(pattern.kind).to_string(),
        risks: heuristics::risks(pattern.kind),
    });

    Ok((builder.build()?, pattern.impact * 100.0))
}

fn title(pattern: &Pattern) -> String {
    match (&pattern.kind, &pattern.subject) {
        (PatternKind::Bottleneck, PatternSubject::Stage { stage }) => {
            format!("Bottleneck in {stage}")
        }
        (PatternKind::StuckItem, PatternSubject::Stage { stage }) => format!(
            "{} stuck item{} in {stage}",
            pattern.affected_items.len(),
            if pattern.affected_items.len() == 1 { "" } else { "s" }
        ),
        (PatternKind::HighWip, PatternSubject::Stage { stage }) => {
            format!("WIP above the recommended limit in {stage}")
        }
        (PatternKind::HighWip, _) => "Work in progress exceeds what throughput supports".to_string(),
        (PatternKind::LowPredictability, _) => "Lead times are unpredictable".to_string(),
        (kind, subject) => format!("{} in {}", kind.label(), subject.describe()),
    }
}

fn summary(scope: &ScopeDescriptor, pattern: &Pattern, threshold: f64) -> String {
    let subject = pattern.subject.describe();
    match pattern.kind {
        PatternKind::Bottleneck => format!(
            "Work accumulates in {subject}: it holds items longer than the rest of the workflow, so upstream work queues while downstream stages wait."
        ),
        PatternKind::StuckItem => format!(
            "{} item(s) have aged past the {threshold:.0}-day threshold in {subject}. Aging work points at blockers in the system of work.",
            pattern.affected_items.len()
        ),
        PatternKind::HighWip => format!(
            "More work is in progress than {} finishes at its current throughput. By Little's Law each extra item in flight lengthens lead time.",
            scope.kind.noun()
        ),
        PatternKind::LowPredictability => {
            "Lead times spread widely, which makes delivery forecasts unreliable and hides queueing delays.".to_string()
        }
    }
}

fn comparisons(snapshot: &MetricsSnapshot, pattern: &Pattern, threshold: f64) -> Vec<Comparison> {
    let stage = pattern.subject.stage().and_then(|s| snapshot.stage(s));
    let mut out = Vec::new();
    match pattern.kind {
        PatternKind::Bottleneck => {
            if let Some(metrics) = stage {
                out.push(Comparison::new(
                    MetricField::StageMeanDays,
                    metrics.mean_days,
                    threshold,
                    ReferenceKind::Target,
                ));
            }
        }
        PatternKind::StuckItem => {
            if let Some(metrics) = stage {
                out.push(Comparison::new(
                    MetricField::StageP85Days,
                    metrics.p85_days,
                    threshold,
                    ReferenceKind::Target,
                ));
            }
        }
        PatternKind::HighWip => match stage {
            Some(metrics) => out.push(Comparison::new(
                MetricField::StagePredictedWip,
                metrics.predicted_wip,
                f64::from(metrics.recommended_wip_limit),
                ReferenceKind::Target,
            )),
            None => out.push(Comparison::new(
                MetricField::InFlightCount,
                snapshot.in_flight_count() as f64,
                snapshot.predicted_wip(),
                ReferenceKind::Target,
            )),
        },
        PatternKind::LowPredictability => out.push(Comparison::new(
            MetricField::LeadTimeVariation,
            snapshot.lead_time().coefficient_of_variation,
            0.5,
            ReferenceKind::Target,
        )),
    }
    if let Some(baseline_lead) = snapshot.baseline().and_then(|b| b.baseline_lead_time_days) {
        out.push(Comparison::new(
            MetricField::AverageLeadTime,
            snapshot.avg_lead_time_days(),
            baseline_lead,
            ReferenceKind::Baseline,
        ));
    }
    out
}

fn target_for(
    field: MetricField,
    snapshot: &MetricsSnapshot,
    threshold: f64,
    config: &SynthesisConfig,
) -> Option<f64> {
    match field {
        MetricField::AverageLeadTime => Some(config.target_lead_time_days),
        MetricField::StageMeanDays | MetricField::StageP85Days => Some(threshold),
        MetricField::InFlightCount => Some(snapshot.predicted_wip()),
        MetricField::LeadTimeVariation => Some(0.5),
        _ => None,
    }
}

fn tier_weight(tier: ConfidenceTier) -> f64 {
    match tier {
        ConfidenceTier::High => 1.0,
        ConfidenceTier::Medium => 0.8,
        ConfidenceTier::Low => 0.6,
    }
}

fn capitalize_label(field: MetricField) -> String {
    crate::sections::capitalize(field.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcoach_model::{Severity, StageName};

    #[test]
    fn stuck_title_counts_items() {
        let pattern = Pattern::new(
            "t",
            PatternKind::StuckItem,
            Severity::Warning,
            PatternSubject::Stage {
                stage: StageName::new("in-testing"),
            },
            "d",
        )
        .with_affected_items(vec!["S-8".to_string()]);
        assert_eq!(title(&pattern), "1 stuck item in in-testing");
    }

    #[test]
    fn workflow_wip_title() {
        let pattern = Pattern::new(
            "t",
            PatternKind::HighWip,
            Severity::Warning,
            PatternSubject::Workflow,
            "d",
        );
        assert_eq!(
            title(&pattern),
            "Work in progress exceeds what throughput supports"
        );
    }
}
