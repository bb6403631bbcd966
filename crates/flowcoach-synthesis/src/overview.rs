//! Flow-health overview and capacity insights

use crate::config::SynthesisConfig;
use crate::sections::{capitalize, qualifier, watched};
use flowcoach_model::{
    Action, CapacityBaseline, CapacityStatus, Comparison, ConfidenceTier, Effort, EvidenceRef,
    ExpectedOutcomes, IndicatorKind, Insight, InsightCategory, Interpretation, MetricField,
    MetricsSnapshot, ModelError, Observation, Pattern, ReferenceKind, RootCause, RootCauseSource,
    ScopeDescriptor, Severity, Timeframe,
};

/// Overview insight and its impact (0–100)
pub(crate) fn overview(
    scope: &ScopeDescriptor,
    snapshot: &MetricsSnapshot,
    flow_health: Severity,
    patterns: &[Pattern],
    config: &SynthesisConfig,
) -> Result<(Insight, f64), ModelError> {
    let target = config.target_lead_time_days;
    let target_fe = config.target_flow_efficiency_pct;
    let lead = snapshot.avg_lead_time_days();
    let fe = snapshot.flow_efficiency_pct();
    let tier = ConfidenceTier::from_sample(snapshot.completed_count(), snapshot.data_completeness());

    let statement = format!(
        "{} completed {} items in {:.0} days ({:.2} per day). Average lead time is {:.1} days against a target of {:.0}; flow efficiency is {:.1}%; Little's Law predicts {:.1} items in progress.",
        capitalize(scope.kind.noun()),
        snapshot.completed_count(),
        snapshot.period_days(),
        snapshot.throughput_per_day(),
        lead,
        target,
        snapshot.flow_efficiency_display(),
        snapshot.predicted_wip()
    );
    let mut comparisons = vec![
        Comparison::new(MetricField::AverageLeadTime, lead, target, ReferenceKind::Target),
        Comparison::new(MetricField::FlowEfficiency, fe, target_fe, ReferenceKind::Target),
    ];
    if let Some(baseline) = snapshot.baseline() {
        comparisons.extend(baseline_comparisons(baseline, lead));
    }

    let mut summary = match flow_health {
        Severity::Critical => format!(
            "Flow is in critical condition: lead time or waiting time is far beyond healthy levels, so delivery commitments for {} are at risk.",
            scope.kind.noun()
        ),
        Severity::Warning => {
            "Flow needs attention: lead time or waiting time is drifting away from target.".to_string()
        }
        Severity::Info => "Flow is stable but lead time sits above the target.".to_string(),
        Severity::Success => {
            "Flow is healthy: lead time is within target and work moves with little waiting."
                .to_string()
        }
    };
    if !patterns.is_empty() {
        summary.push_str(&format!(
            " {} systemic pattern(s) shape this picture.",
            patterns.len()
        ));
    }

    let mut causes = Vec::new();
    if lead > target {
        if let Some(evidence) = snapshot.evidence(MetricField::AverageLeadTime) {
            causes.push(RootCause {
                description: format!(
                    "Average lead time of {:.1} days is {:.0}% above the {:.0}-day target.",
                    lead,
                    (lead - target) / target * 100.0,
                    target
                ),
                evidence,
                confidence: tier_confidence(tier),
                source: RootCauseSource::Quantitative,
            });
        }
    }
    if fe < target_fe {
        if let Some(evidence) = snapshot.evidence(MetricField::FlowEfficiency) {
            causes.push(RootCause {
                description: format!(
                    "Flow efficiency of {:.1}% means items spend most of their lead time waiting.",
                    snapshot.flow_efficiency_display()
                ),
                evidence,
                confidence: tier_confidence(tier),
                source: RootCauseSource::Quantitative,
            });
        }
    }
    for pattern in patterns.iter().take(2) {
        causes.push(RootCause {
            description: pattern.description.clone(),
            evidence: pattern.as_evidence(),
            confidence: pattern.confidence,
            source: RootCauseSource::Quantitative,
        });
    }
    if causes.is_empty() {
        causes.push(RootCause {
            description: format!(
                "Lead time of {:.1} days is within the {:.0}-day target and flow efficiency is {:.1}%.",
                lead,
                target,
                snapshot.flow_efficiency_display()
            ),
            evidence: EvidenceRef::metric(MetricField::AverageLeadTime, lead),
            confidence: tier_confidence(tier),
            source: RootCauseSource::Quantitative,
        });
    }

    let medium_term = if fe < target_fe {
        Action::new(
            "Map the waiting stages of the value stream and remove the largest queue.",
            "Agile Coach",
            Effort::Medium,
            format!("Flow efficiency rises above {target_fe:.0}%."),
        )
    } else {
        Action::new(
            "Apply the recommended WIP limit to every stage and review it each iteration.",
            "Scrum Master",
            Effort::Medium,
            "Observed WIP stays within the recommended limits.",
        )
    };

    let mut builder = Insight::builder(InsightCategory::FlowHealth, scope.kind, &scope.scope_id)
        .subject("overview")
        .title(match flow_health {
            Severity::Critical => "Flow health is critical",
            Severity::Warning => "Flow health needs attention",
            Severity::Info => "Lead time is above target",
            Severity::Success => "Flow is healthy",
        })
        .severity(flow_health)
        .confidence(tier.percent())
        .observation(Observation {
            statement,
            comparisons,
            confidence_tier: tier,
            sample_size: snapshot.completed_count(),
        })
        .interpretation(Interpretation {
            summary,
            scope_qualifier: qualifier(scope, snapshot),
            enrichment: None,
        })
        .root_causes(causes)
        .action(
            Timeframe::ShortTerm,
            Action::new(
                "Walk the board from right to left in the next stand-up, starting with the oldest items.",
                "Scrum Master",
                Effort::Low,
                "The age of the oldest in-flight item falls within two weeks.",
            ),
        )
        .action(Timeframe::MediumTerm, medium_term)
        .action(
            Timeframe::LongTerm,
            Action::new(
                format!("Review lead time against the {target:.0}-day target every period."),
                "Team Lead",
                Effort::Low,
                format!("Average lead time at or below {target:.0} days."),
            ),
        )
        .outcomes(ExpectedOutcomes {
            metrics_to_watch: vec![
                watched(snapshot, MetricField::FlowEfficiency, IndicatorKind::Leading, Some(target_fe), None),
                watched(snapshot, MetricField::PredictedWip, IndicatorKind::Leading, None, None),
                watched(snapshot, MetricField::AverageLeadTime, IndicatorKind::Lagging, Some(target), None),
                watched(snapshot, MetricField::Throughput, IndicatorKind::Lagging, None, None),
            ],
            timeline: "Leading indicators within one iteration; lead time over the next one to two periods.".to_string(),
            risks: vec![
                "Focusing on lead time alone can push teams to split work without delivering value.".to_string(),
            ],
        });

    for field in [
        MetricField::Throughput,
        MetricField::AverageLeadTime,
        MetricField::PredictedWip,
        MetricField::FlowEfficiency,
    ] {
        if let Some(evidence) = snapshot.evidence(field) {
            builder = builder.evidence(evidence);
        }
    }

    let lead_excess = ((lead / target - 1.0) * 100.0).clamp(0.0, 100.0);
    let waiting = if target_fe > 0.0 {
        ((target_fe - fe) / target_fe * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    Ok((builder.build()?, lead_excess.max(waiting)))
}

/// Capacity insight when throughput deviates from the baseline
pub(crate) fn capacity(
    scope: &ScopeDescriptor,
    snapshot: &MetricsSnapshot,
) -> Result<Option<(Insight, f64)>, ModelError> {
    let Some(baseline) = snapshot.baseline() else {
        return Ok(None);
    };
    if !baseline.status.is_flagged() {
        return Ok(None);
    }

    let utilization = baseline.utilization_pct;
    let tier = ConfidenceTier::from_sample(baseline.periods_used * 4, snapshot.data_completeness());
    let (title, severity, summary, cause) = match baseline.status {
        CapacityStatus::OverCapacity => (
            "Throughput is running above the historical baseline",
            if utilization > 150.0 {
                Severity::Critical
            } else {
                Severity::Warning
            },
            "Completions are well above what the recent periods sustained. Unusually small items or deferred quality work can inflate throughput, and the pace may not hold.",
            "Commitments or item mix changed compared with the baseline periods.",
        ),
        _ => (
            "Throughput is running below the historical baseline",
            Severity::Warning,
            "Completions fell well below the recent periods. Blocked work, lost capacity or larger items usually explain the drop.",
            "Blocked work or reduced capacity cut completions compared with earlier periods.",
        ),
    };

    let mut comparisons = vec![Comparison::new(
        MetricField::BaselineUtilization,
        utilization,
        100.0,
        ReferenceKind::Target,
    )];
    comparisons.extend(baseline_comparisons(baseline, snapshot.avg_lead_time_days()));

    let deviation = EvidenceRef::metric(
        MetricField::BaselineDeviation,
        baseline.throughput_deviation_pct,
    );
    let insight = Insight::builder(InsightCategory::Capacity, scope.kind, &scope.scope_id)
        .subject(match baseline.status {
            CapacityStatus::OverCapacity => "over_capacity",
            _ => "under_capacity",
        })
        .title(title)
        .severity(severity)
        .confidence(tier.percent())
        .observation(Observation {
            statement: format!(
                "{:.0} items completed this period against a baseline of {:.1} per period over the last {} periods ({:.1}% utilization).",
                baseline.current_throughput,
                baseline.baseline_throughput,
                baseline.periods_used,
                utilization
            ),
            comparisons,
            confidence_tier: tier,
            sample_size: baseline.periods_used,
        })
        .interpretation(Interpretation {
            summary: summary.to_string(),
            scope_qualifier: qualifier(scope, snapshot),
            enrichment: None,
        })
        .root_cause(RootCause {
            description: format!(
                "Throughput deviates {:+.1}% from the {}-period baseline.",
                baseline.throughput_deviation_pct, baseline.periods_used
            ),
            evidence: deviation.clone(),
            confidence: tier_confidence(tier),
            source: RootCauseSource::Quantitative,
        })
        .root_cause(RootCause {
            description: cause.to_string(),
            evidence: deviation,
            confidence: tier_confidence(tier) * 0.75,
            source: RootCauseSource::Heuristic,
        })
        .action(
            Timeframe::ShortTerm,
            Action::new(
                "Compare item size and mix with the baseline periods before the next planning.",
                "Scrum Master",
                Effort::Low,
                "The cause of the deviation is named in the next retrospective.",
            ),
        )
        .action(
            Timeframe::MediumTerm,
            Action::new(
                "Plan the next period against the baseline throughput, not the current outlier.",
                "Release Train Engineer",
                Effort::Medium,
                "Planned load stays within 20 percent of the baseline.",
            ),
        )
        .action(
            Timeframe::LongTerm,
            Action::new(
                "Track utilization every period and investigate deviations beyond 20 percent.",
                "Release Train Engineer",
                Effort::Low,
                "Utilization stays between 80 and 120 percent.",
            ),
        )
        .outcomes(ExpectedOutcomes {
            metrics_to_watch: vec![
                watched(snapshot, MetricField::Throughput, IndicatorKind::Leading, None, None),
                watched(snapshot, MetricField::BaselineUtilization, IndicatorKind::Lagging, Some(100.0), None),
            ],
            timeline: "Next planning period.".to_string(),
            risks: vec![
                "Correcting for one outlier period can overreact to normal variation.".to_string(),
            ],
        })
        .evidence(EvidenceRef::metric(
            MetricField::BaselineUtilization,
            utilization,
        ))
        .build()?;

    Ok(Some((insight, (utilization - 100.0).abs().min(100.0))))
}

fn baseline_comparisons(baseline: &CapacityBaseline, lead: f64) -> Vec<Comparison> {
    let mut comparisons = vec![Comparison::new(
        MetricField::CompletedCount,
        baseline.current_throughput,
        baseline.baseline_throughput,
        ReferenceKind::Baseline,
    )];
    if let Some(previous) = baseline.previous_period_throughput {
        comparisons.push(Comparison::new(
            MetricField::CompletedCount,
            baseline.current_throughput,
            previous,
            ReferenceKind::PreviousPeriod,
        ));
    }
    if let Some(baseline_lead) = baseline.baseline_lead_time_days {
        comparisons.push(Comparison::new(
            MetricField::AverageLeadTime,
            lead,
            baseline_lead,
            ReferenceKind::Baseline,
        ));
    }
    comparisons
}

fn tier_confidence(tier: ConfidenceTier) -> f64 {
    f64::from(tier.percent()) / 100.0
}
