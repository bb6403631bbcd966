//! Plain-text rendering of reports and snapshots

use flowcoach_core::PipelineReport;
use flowcoach_model::{
    CapacityStatus, Effort, Insight, MetricsSnapshot, RootCauseSource, Timeframe,
};
use std::fmt::{self, Write};

fn timeframe(t: Timeframe) -> &'static str {
    match t {
        Timeframe::ShortTerm => "short term",
        Timeframe::MediumTerm => "medium term",
        Timeframe::LongTerm => "long term",
    }
}

fn effort(e: Effort) -> &'static str {
    match e {
        Effort::Low => "low effort",
        Effort::Medium => "medium effort",
        Effort::High => "high effort",
    }
}

fn capacity(status: CapacityStatus) -> &'static str {
    match status {
        CapacityStatus::OverCapacity => "over capacity",
        CapacityStatus::Nominal => "nominal",
        CapacityStatus::UnderCapacity => "under capacity",
    }
}

/// Render Little's Law figures, stage table and baseline
pub(crate) fn render_snapshot(out: &mut String, snapshot: &MetricsSnapshot) -> fmt::Result {
    writeln!(
        out,
        "Metrics ({} {}, {} workflow, {:.0} days)",
        snapshot.scope(),
        snapshot.scope_id(),
        snapshot.workflow(),
        snapshot.period_days()
    )?;
    writeln!(
        out,
        "  Throughput     {:.2} items/day ({} completed, {} in flight)",
        snapshot.throughput_per_day(),
        snapshot.completed_count(),
        snapshot.in_flight_count()
    )?;
    writeln!(
        out,
        "  Lead time      {:.1} days avg, {:.1} median, CV {:.2}",
        snapshot.avg_lead_time_days(),
        snapshot.lead_time().median_days,
        snapshot.lead_time().coefficient_of_variation
    )?;
    writeln!(out, "  Predicted WIP  {:.1}", snapshot.predicted_wip())?;
    writeln!(
        out,
        "  Flow efficiency {}%",
        snapshot.flow_efficiency_display()
    )?;
    writeln!(
        out,
        "  Completeness   {:.0}%",
        snapshot.data_completeness() * 100.0
    )?;

    if !snapshot.stages().is_empty() {
        writeln!(out, "  Stages:")?;
        for stage in snapshot.stages() {
            writeln!(
                out,
                "    {:<24} mean {:>6.1}d  median {:>6.1}d  WIP {:>5.1}  limit {}{}",
                stage.stage.as_str(),
                stage.mean_days,
                stage.median_days,
                stage.predicted_wip,
                stage.recommended_wip_limit,
                if stage.active { "" } else { "  (queue)" }
            )?;
        }
    }

    if let Some(baseline) = snapshot.baseline() {
        writeln!(
            out,
            "  Capacity       {:.0}% of baseline {:.1}/period over {} periods: {}",
            baseline.utilization_pct,
            baseline.baseline_throughput,
            baseline.periods_used,
            capacity(baseline.status)
        )?;
    }
    for note in snapshot.guard_notes() {
        writeln!(out, "  ! {} not computed: {}", note.field, note.reason)?;
    }
    Ok(())
}

fn render_insight(out: &mut String, rank: usize, insight: &Insight) -> fmt::Result {
    writeln!(
        out,
        "{rank}. [{}] {} (priority {:.0}, confidence {}%)",
        insight.severity, insight.title, insight.priority_score, insight.confidence
    )?;
    writeln!(out, "   Observation: {}", insight.observation.statement)?;
    writeln!(out, "   Interpretation: {}", insight.interpretation.summary)?;
    if let Some(prose) = &insight.interpretation.enrichment {
        for line in prose.lines() {
            writeln!(out, "     {line}")?;
        }
    }

    if !insight.root_causes.is_empty() {
        writeln!(out, "   Root causes:")?;
        for cause in &insight.root_causes {
            let source = match &cause.source {
                RootCauseSource::Quantitative => "metrics".to_string(),
                RootCauseSource::Knowledge { title, .. } => format!("knowledge: {title}"),
                RootCauseSource::Heuristic => "heuristic".to_string(),
            };
            writeln!(out, "     - {} ({source})", cause.description)?;
        }
    }

    if !insight.recommended_actions.is_empty() {
        writeln!(out, "   Actions:")?;
        for (t, action) in insight.recommended_actions.iter() {
            writeln!(
                out,
                "     - [{}] {} ({}, {})",
                timeframe(t),
                action.description,
                action.owner_role,
                effort(action.effort)
            )?;
        }
    }

    let watched: Vec<&str> = insight
        .expected_outcomes
        .metrics_to_watch
        .iter()
        .map(|m| m.metric.label())
        .collect();
    if !watched.is_empty() {
        writeln!(
            out,
            "   Watch: {} ({})",
            watched.join(", "),
            insight.expected_outcomes.timeline
        )?;
    }
    Ok(())
}

/// Render a full pipeline report
pub(crate) fn render_report(report: &PipelineReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let scope = &report.scope;
    writeln!(
        out,
        "Flow Coach report for {} '{}' ({} to {})",
        scope.kind, scope.scope_id, scope.window.start, scope.window.end
    )?;
    writeln!(
        out,
        "Run {} | {} record(s) accepted, {} rejected",
        report.run_id, report.records_accepted, report.records_rejected
    )?;
    if report.fields_ignored > 0 {
        writeln!(
            out,
            "{} duration field(s) outside the known stages were ignored",
            report.fields_ignored
        )?;
    }
    if report.cancelled {
        writeln!(out, "Run cancelled")?;
    }
    writeln!(out)?;

    if let Some(snapshot) = &report.snapshot {
        render_snapshot(&mut out, snapshot)?;
        writeln!(out)?;
    }
    if let Some(health) = report.flow_health {
        writeln!(out, "Flow health: {health}")?;
    }
    if let Some(analysis) = &report.flow_analysis {
        writeln!(out, "Teams:")?;
        for team in &analysis.teams {
            writeln!(
                out,
                "  {:<20} {:>3} done  {:>3} in flight  λ {:.2}/day  W {:.1}d  L {:.1}",
                team.group,
                team.completed,
                team.in_flight,
                team.throughput_per_day,
                team.avg_lead_time_days,
                team.predicted_wip
            )?;
        }
        if !analysis.overloaded_teams.is_empty() {
            writeln!(out, "  Overloaded: {}", analysis.overloaded_teams.join(", "))?;
        }
    }
    writeln!(out)?;

    writeln!(out, "Insights ({}):", report.insights.len())?;
    for (i, insight) in report.insights.iter().enumerate() {
        render_insight(&mut out, i + 1, insight)?;
        writeln!(out)?;
    }

    if !report.failures.is_empty() {
        writeln!(out, "Stage failures:")?;
        for failure in &report.failures {
            writeln!(out, "  {failure}")?;
        }
    }
    Ok(out)
}
