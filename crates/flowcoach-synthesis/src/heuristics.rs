//! Built-in coaching heuristics
//!
//! Used when no corpus document matches a pattern, and as the baseline
//! action plan for every pattern kind.

use crate::sections::capitalize;
use flowcoach_model::{
    Action, Effort, IndicatorKind, MetricField, Pattern, PatternKind, PatternSubject, Timeframe,
};

/// Root-cause statements for a pattern, most likely first
#[must_use]
pub fn root_causes(pattern: &Pattern) -> Vec<String> {
    let subject = pattern.subject.describe();
    match pattern.kind {
        PatternKind::Bottleneck => vec![
            format!("Capacity in {subject} is narrower than the demand arriving from upstream stages."),
            format!("Work enters {subject} in batches instead of a steady flow."),
        ],
        PatternKind::StuckItem => vec![
            format!("Items in {subject} wait on blockers or dependencies that are not visible on the board."),
            "Work is started before dependencies and acceptance criteria are settled.".to_string(),
        ],
        PatternKind::HighWip => match pattern.subject {
            PatternSubject::Workflow => vec![
                "New work is started faster than work is finished; no limit governs intake.".to_string(),
                "Parallel work causes context switching that lengthens every item's lead time.".to_string(),
            ],
            _ => vec![
                format!("{} holds more items than its throughput supports.", capitalize(&subject)),
                "Upstream stages keep pulling work while this stage is saturated.".to_string(),
            ],
        },
        PatternKind::LowPredictability => vec![
            "Work items vary widely in size, so lead times spread out.".to_string(),
            "Items wait in queues for unpredictable periods between stages.".to_string(),
        ],
    }
}

/// Baseline action plan for a pattern
#[must_use]
pub fn actions(pattern: &Pattern) -> Vec<(Timeframe, Action)> {
    let subject = pattern.subject.describe();
    match pattern.kind {
        PatternKind::Bottleneck => vec![
            (
                Timeframe::ShortTerm,
                Action::new(
                    format!("Swarm on the oldest items in {subject} before starting new work."),
                    "Scrum Master",
                    Effort::Low,
                    format!("Mean days in {subject} falls in the next iteration."),
                ),
            ),
            (
                Timeframe::MediumTerm,
                Action::new(
                    format!("Apply the recommended WIP limit to {subject} and make it visible on the board."),
                    "Team Lead",
                    Effort::Medium,
                    "The stage stays at or below its WIP limit for a full period.",
                ),
            ),
            (
                Timeframe::LongTerm,
                Action::new(
                    format!("Broaden the skills that {subject} depends on through pairing and rotation."),
                    "Engineering Manager",
                    Effort::High,
                    "The stage's share of lead time drops below the workflow average.",
                ),
            ),
        ],
        PatternKind::StuckItem => vec![
            (
                Timeframe::ShortTerm,
                Action::new(
                    "Review every item over the aging threshold in the next daily sync and name its blocker.",
                    "Scrum Master",
                    Effort::Low,
                    "No item stays above the threshold without a recorded blocker.",
                ),
            ),
            (
                Timeframe::MediumTerm,
                Action::new(
                    "Agree an escalation path for items that exceed the aging threshold.",
                    "Team Lead",
                    Effort::Medium,
                    "The number of stuck items halves within the period.",
                ),
            ),
            (
                Timeframe::LongTerm,
                Action::new(
                    "Refine work until dependencies are resolved before it is pulled into development.",
                    "Product Owner",
                    Effort::Medium,
                    "85th percentile time in stage stays below the aging threshold.",
                ),
            ),
        ],
        PatternKind::HighWip => vec![
            (
                Timeframe::ShortTerm,
                Action::new(
                    "Stop starting new items until in-flight work drops to the recommended limit.",
                    "Team Lead",
                    Effort::Low,
                    "Items in flight fall to the recommended limit within two weeks.",
                ),
            ),
            (
                Timeframe::MediumTerm,
                Action::new(
                    "Set explicit per-stage WIP limits derived from throughput and stage time.",
                    "Scrum Master",
                    Effort::Medium,
                    "Predicted and observed WIP stay within 25 percent of each other.",
                ),
            ),
            (
                Timeframe::LongTerm,
                Action::new(
                    "Tie intake to demonstrated throughput in planning.",
                    "Product Owner",
                    Effort::Medium,
                    "Average lead time trends toward target over the next periods.",
                ),
            ),
        ],
        PatternKind::LowPredictability => vec![
            (
                Timeframe::ShortTerm,
                Action::new(
                    "Forecast delivery dates with the 85th percentile lead time instead of the average.",
                    "Product Owner",
                    Effort::Low,
                    "Forecasts are quoted as percentile ranges in the next planning.",
                ),
            ),
            (
                Timeframe::MediumTerm,
                Action::new(
                    "Right-size work items so each fits comfortably within one iteration.",
                    "Team Lead",
                    Effort::Medium,
                    "Lead time coefficient of variation drops below 0.5.",
                ),
            ),
            (
                Timeframe::LongTerm,
                Action::new(
                    "Agree a service level expectation for lead time and review it each period.",
                    "Agile Coach",
                    Effort::Medium,
                    "95th percentile lead time is within three times the median.",
                ),
            ),
        ],
    }
}

/// Metrics to watch after acting on a pattern
#[must_use]
pub fn watched_metrics(kind: PatternKind) -> Vec<(MetricField, IndicatorKind)> {
    match kind {
        PatternKind::Bottleneck => vec![
            (MetricField::StageMeanDays, IndicatorKind::Leading),
            (MetricField::StagePredictedWip, IndicatorKind::Leading),
            (MetricField::AverageLeadTime, IndicatorKind::Lagging),
        ],
        PatternKind::StuckItem => vec![
            (MetricField::InFlightCount, IndicatorKind::Leading),
            (MetricField::StageP85Days, IndicatorKind::Leading),
            (MetricField::AverageLeadTime, IndicatorKind::Lagging),
        ],
        PatternKind::HighWip => vec![
            (MetricField::InFlightCount, IndicatorKind::Leading),
            (MetricField::PredictedWip, IndicatorKind::Leading),
            (MetricField::Throughput, IndicatorKind::Lagging),
            (MetricField::AverageLeadTime, IndicatorKind::Lagging),
        ],
        PatternKind::LowPredictability => vec![
            (MetricField::LeadTimeVariation, IndicatorKind::Leading),
            (MetricField::LeadTimeP95, IndicatorKind::Lagging),
        ],
    }
}

/// Typical time until results show
#[must_use]
pub fn timeline(kind: PatternKind) -> &'static str {
    match kind {
        PatternKind::StuckItem => "Leading indicators within one to two weeks; lead time within one period.",
        PatternKind::HighWip => "WIP within two weeks; lead time improves over the following period.",
        PatternKind::Bottleneck => "Stage time within one iteration; lead time within one to two periods.",
        PatternKind::LowPredictability => "Variation narrows over two to three periods.",
    }
}

/// Risks of acting on a pattern
#[must_use]
pub fn risks(kind: PatternKind) -> Vec<String> {
    match kind {
        PatternKind::Bottleneck => vec![
            "Relieving one stage can move the constraint to the next stage downstream.".to_string(),
        ],
        PatternKind::StuckItem => vec![
            "Escalating blockers without removing their cause only hides the symptom.".to_string(),
        ],
        PatternKind::HighWip => vec![
            "Throughput can dip briefly while in-flight work drains.".to_string(),
        ],
        PatternKind::LowPredictability => vec![
            "Splitting work without slicing for value adds coordination overhead.".to_string(),
        ],
    }
}

/// Urgency of acting on a category, 0–100
#[must_use]
pub fn urgency(category: flowcoach_model::InsightCategory) -> f64 {
    use flowcoach_model::InsightCategory as C;
    match category {
        C::StuckItems => 100.0,
        C::Bottleneck => 80.0,
        C::HighWip => 70.0,
        C::FlowHealth | C::Capacity => 60.0,
        C::LowPredictability => 50.0,
        C::DataUnavailable => 40.0,
        C::InsufficientData => 30.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcoach_model::{InsightCategory, Severity, StageName};

    fn pattern(kind: PatternKind, subject: PatternSubject) -> Pattern {
        Pattern::new("t", kind, Severity::Warning, subject, "d")
    }

    #[test]
    fn every_kind_has_a_full_plan() {
        for kind in PatternKind::all() {
            let p = pattern(kind, PatternSubject::Workflow);
            assert!(!root_causes(&p).is_empty());
            let plan = actions(&p);
            for timeframe in [Timeframe::ShortTerm, Timeframe::MediumTerm, Timeframe::LongTerm] {
                assert!(plan.iter().any(|(t, _)| *t == timeframe));
            }
            assert!(!watched_metrics(kind).is_empty());
            assert!(!risks(kind).is_empty());
        }
    }

    #[test]
    fn stage_wip_causes_name_the_stage() {
        let p = pattern(
            PatternKind::HighWip,
            PatternSubject::Stage {
                stage: StageName::new("in-testing"),
            },
        );
        assert!(root_causes(&p)[0].starts_with("The in-testing stage"));
    }

    #[test]
    fn stuck_items_are_most_urgent() {
        assert!(urgency(InsightCategory::StuckItems) > urgency(InsightCategory::Bottleneck));
        assert!(urgency(InsightCategory::HighWip) > urgency(InsightCategory::LowPredictability));
    }
}
