use flowcoach_metrics::MetricsEngine;
use flowcoach_model::{
    MetricsSnapshot, PatternKind, PatternSubject, ScopeDescriptor, ScopeKind, Severity,
    WorkItemFlowRecord, WorkflowShape,
};
use flowcoach_patterns::{score_stages, DetectionContext, DetectorConfig, PatternDetector};
use flowcoach_test_utils::{
    completed_stories, completed_story, in_flight_story, open_window, team_scope, today,
};
use pretty_assertions::assert_eq;

fn open_team_scope(days: u32) -> ScopeDescriptor {
    ScopeDescriptor::new(ScopeKind::Team, "team-alpha", open_window(days))
        .with_workflow(WorkflowShape::Story)
}

fn snapshot(scope: &ScopeDescriptor, records: &[WorkItemFlowRecord]) -> MetricsSnapshot {
    MetricsEngine::default().compute(scope, records, &[]).unwrap()
}

#[test]
fn test_scenario_c_stuck_threshold() {
    let scope = open_team_scope(30);
    let mut records = completed_stories(5, 10.0);
    records.push(in_flight_story("S-5", "alpha", "in-testing", 5.0));
    records.push(in_flight_story("S-8", "alpha", "in-testing", 8.0));

    let snapshot = snapshot(&scope, &records);
    let patterns = PatternDetector::default().detect(
        &snapshot,
        &records,
        &DetectionContext::new(&scope, today()),
    );

    let stuck: Vec<_> = patterns
        .iter()
        .filter(|p| p.kind == PatternKind::StuckItem)
        .collect();
    assert_eq!(stuck.len(), 1);
    assert_eq!(stuck[0].affected_items, vec!["S-8".to_string()]);
    assert_eq!(stuck[0].subject.stage().unwrap().as_str(), "in-testing");
    assert!(!stuck[0].evidence.is_empty());
}

#[test]
fn test_bottlenecks_ranked_by_score() {
    let scope = open_team_scope(30);
    let records = completed_stories(10, 40.0);
    let snapshot = snapshot(&scope, &records);

    let patterns = PatternDetector::default().detect(
        &snapshot,
        &records,
        &DetectionContext::new(&scope, today()),
    );
    let bottlenecks: Vec<_> = patterns
        .iter()
        .filter(|p| p.kind == PatternKind::Bottleneck)
        .collect();

    assert_eq!(bottlenecks.len(), 2);
    let stages: Vec<&str> = bottlenecks
        .iter()
        .map(|p| p.subject.stage().unwrap().as_str())
        .collect();
    assert_eq!(stages, vec!["in-development", "refinement"]);
    assert!((bottlenecks[0].score.unwrap() - 1.36).abs() < 1e-9);
    assert_eq!(bottlenecks[0].severity, Severity::Warning);
    assert!(bottlenecks[0].metric_names().contains(&"stage_mean_days"));
}

#[test]
fn test_bottleneck_score_ignores_in_flight_durations() {
    let scope = open_team_scope(30);
    let completed = completed_stories(10, 40.0);
    let snapshot = snapshot(&scope, &completed);
    let config = DetectorConfig::default();

    let mut records = completed.clone();
    for i in 0..10 {
        records.push(in_flight_story(&format!("WIP-{i}"), "alpha", "code-review", 30.0));
    }
    let completed_refs: Vec<&WorkItemFlowRecord> = completed.iter().collect();
    let all_refs: Vec<&WorkItemFlowRecord> = records.iter().collect();

    let baseline = score_stages(&snapshot, &completed_refs, 7.0, &config);
    let mixed = score_stages(&snapshot, &all_refs, 7.0, &config);
    assert_eq!(baseline, mixed);

    let review = mixed
        .iter()
        .find(|s| s.stage.as_str() == "code-review")
        .unwrap();
    assert_eq!(review.samples, 10);
    assert_eq!(review.exceed_fraction, 0.0);
}

#[test]
fn test_bottleneck_cap() {
    let scope = open_team_scope(30);
    let records = completed_stories(10, 40.0);
    let snapshot = snapshot(&scope, &records);

    let detector = PatternDetector::new(DetectorConfig::new().with_max_bottlenecks(1));
    let patterns = detector.detect(
        &snapshot,
        &records,
        &DetectionContext::new(&scope, today()),
    );
    assert_eq!(
        patterns
            .iter()
            .filter(|p| p.kind == PatternKind::Bottleneck)
            .count(),
        1
    );
}

#[test]
fn test_retrospective_window_judges_completed_items() {
    let scope = team_scope(30);
    let records = completed_stories(10, 40.0);
    let snapshot = snapshot(&scope, &records);
    let context = DetectionContext::new(&scope, today());
    assert!(context.is_retrospective());

    let patterns = PatternDetector::default().detect(&snapshot, &records, &context);
    let stuck = patterns
        .iter()
        .find(|p| p.kind == PatternKind::StuckItem)
        .unwrap();
    assert_eq!(stuck.affected_items.len(), 10);
    assert_eq!(stuck.severity, Severity::Critical);
}

#[test]
fn test_high_wip_per_stage() {
    let scope = open_team_scope(30);
    let mut records = completed_stories(10, 10.0);
    for i in 0..4 {
        records.push(in_flight_story(
            &format!("W-{i}"),
            "alpha",
            "in-development",
            2.0,
        ));
    }
    let snapshot = snapshot(&scope, &records);

    let patterns = PatternDetector::default().detect(
        &snapshot,
        &records,
        &DetectionContext::new(&scope, today()),
    );
    let wip: Vec<_> = patterns
        .iter()
        .filter(|p| p.kind == PatternKind::HighWip)
        .collect();
    assert_eq!(wip.len(), 1);
    assert!(matches!(wip[0].subject, PatternSubject::Stage { .. }));
    assert_eq!(wip[0].severity, Severity::Critical);
}

#[test]
fn test_high_wip_against_littles_law() {
    let scope = open_team_scope(30);
    let mut records = completed_stories(10, 10.0);
    let stages = ["refinement", "in-development", "code-review", "in-testing"];
    for i in 0..8 {
        records.push(in_flight_story(
            &format!("W-{i}"),
            "alpha",
            stages[i % stages.len()],
            1.0,
        ));
    }
    let snapshot = snapshot(&scope, &records);

    let patterns = PatternDetector::default().detect(
        &snapshot,
        &records,
        &DetectionContext::new(&scope, today()),
    );
    assert!(patterns
        .iter()
        .any(|p| p.kind == PatternKind::HighWip && p.subject == PatternSubject::Workflow));
}

#[test]
fn test_low_predictability_critical() {
    let scope = open_team_scope(30);
    let mut records = completed_stories(5, 5.0);
    records.push(completed_story("SLOW-1", 60.0));
    let snapshot = snapshot(&scope, &records);

    let patterns = PatternDetector::default().detect(
        &snapshot,
        &records,
        &DetectionContext::new(&scope, today()),
    );
    let lp = patterns
        .iter()
        .find(|p| p.kind == PatternKind::LowPredictability)
        .unwrap();
    assert_eq!(lp.severity, Severity::Critical);
    assert!(lp.metric_names().contains(&"lead_time_variation"));
}

#[test]
fn test_detection_is_deterministic_and_ordered() {
    let scope = team_scope(30);
    let mut records = completed_stories(10, 40.0);
    records.push(in_flight_story("S-9", "beta", "in-testing", 9.0));
    let snapshot = snapshot(&scope, &records);
    let detector = PatternDetector::default();
    let context = DetectionContext::new(&scope, today());

    let first = detector.detect(&snapshot, &records, &context);
    let second = detector.detect(&snapshot, &records, &context);
    assert_eq!(first, second);
    assert!(first
        .windows(2)
        .all(|w| w[0].severity.rank() >= w[1].severity.rank()));
}

#[test]
fn test_flow_health_of_slow_team() {
    let scope = open_team_scope(30);
    let records = completed_stories(10, 70.0);
    let snapshot = snapshot(&scope, &records);
    assert_eq!(
        PatternDetector::default().flow_health(&snapshot),
        Severity::Critical
    );
}
