//! Testing utilities for the Flow Coach workspace
//!
//! Shared record fixtures, scopes and the reference scenarios.

#![allow(missing_docs)]

use chrono::NaiveDate;
use flowcoach_model::{
    AnalysisWindow, ItemStatus, PeriodSummary, ScopeDescriptor, ScopeKind, StageName,
    WorkItemFlowRecord, WorkflowShape,
};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Reference "today" used by fixtures, after every fixture window
pub fn today() -> NaiveDate {
    date(2024, 6, 1)
}

/// Window of `days` ending (exclusive) on 2024-03-25
pub fn window(days: u32) -> AnalysisWindow {
    AnalysisWindow::ending(date(2024, 3, 25), days)
}

/// Window that is still open on [`today`]
pub fn open_window(days: u32) -> AnalysisWindow {
    AnalysisWindow::ending(date(2024, 6, 15), days)
}

pub fn team_scope(days: u32) -> ScopeDescriptor {
    ScopeDescriptor::new(ScopeKind::Team, "team-alpha", window(days))
        .with_team("team-alpha")
        .with_workflow(WorkflowShape::Story)
}

pub fn program_scope(days: u32) -> ScopeDescriptor {
    ScopeDescriptor::new(ScopeKind::Program, "art-1", window(days))
        .with_programs(vec!["art-1".to_string()])
        .with_workflow(WorkflowShape::Feature)
}

pub fn story(key: &str, status: ItemStatus, stages: &[(&str, f64)]) -> WorkItemFlowRecord {
    WorkItemFlowRecord::new(
        key,
        status,
        WorkflowShape::Story,
        stages.iter().map(|(s, d)| (StageName::new(s), *d)),
    )
    .unwrap()
}

pub fn feature(key: &str, status: ItemStatus, stages: &[(&str, f64)]) -> WorkItemFlowRecord {
    WorkItemFlowRecord::new(
        key,
        status,
        WorkflowShape::Feature,
        stages.iter().map(|(s, d)| (StageName::new(s), *d)),
    )
    .unwrap()
}

/// Completed story whose lead time is split 30/40/10/20 across
/// refinement, in-development, code-review and in-testing; the queue
/// stages are recorded with zero days
pub fn completed_story(key: &str, lead_days: f64) -> WorkItemFlowRecord {
    story(
        key,
        ItemStatus::Completed,
        &[
            ("refinement", lead_days * 0.3),
            ("ready-for-development", 0.0),
            ("in-development", lead_days * 0.4),
            ("code-review", lead_days * 0.1),
            ("ready-for-test", 0.0),
            ("in-testing", lead_days * 0.2),
            ("ready-for-deployment", 0.0),
            ("deployed", 0.0),
        ],
    )
}

pub fn completed_stories(count: usize, lead_days: f64) -> Vec<WorkItemFlowRecord> {
    (0..count)
        .map(|i| completed_story(&format!("STORY-{}", i + 1), lead_days))
        .collect()
}

/// In-flight story sitting in `stage` for `days`
pub fn in_flight_story(key: &str, team: &str, stage: &str, days: f64) -> WorkItemFlowRecord {
    story(
        key,
        ItemStatus::InProgress,
        &[("refinement", 1.0), (stage, days)],
    )
    .with_team(team)
}

/// 42 completed items, total lead time 2100 days, 84-day window
pub fn scenario_a() -> (ScopeDescriptor, Vec<WorkItemFlowRecord>) {
    (team_scope(84), completed_stories(42, 50.0))
}

/// Five completed items with 19.3 active days over 50.2 lead-time days
pub fn scenario_b() -> Vec<WorkItemFlowRecord> {
    let split = [(4.0, 6.0), (4.0, 6.0), (4.0, 6.0), (4.0, 6.0), (3.3, 6.9)];
    split
        .iter()
        .enumerate()
        .map(|(i, (active, waiting))| {
            story(
                &format!("B-{}", i + 1),
                ItemStatus::Completed,
                &[
                    ("refinement", *waiting),
                    ("in-development", *active),
                    ("deployed", 0.0),
                ],
            )
        })
        .collect()
}

/// Eight past periods averaging 36.375 items
pub fn scenario_d_history() -> Vec<PeriodSummary> {
    [30.0, 35.0, 40.0, 38.0, 42.0, 33.0, 37.0, 36.0]
        .iter()
        .enumerate()
        .map(|(i, t)| PeriodSummary::new(format!("PI-{}", i + 1), *t).with_lead_time(45.0))
        .collect()
}

/// Provider batch with two teams, flattened stage fields and history
pub fn sample_batch_json() -> String {
    serde_json::json!({
        "records": (0..12).map(|i| {
            let team = if i % 2 == 0 { "alpha" } else { "beta" };
            if i < 9 {
                serde_json::json!({
                    "key": format!("FEAT-{i}"),
                    "status": "done",
                    "team": team,
                    "workflow": "feature",
                    "analysis": 3,
                    "in_progress": 10 + i,
                    "review": 4,
                    "integration_test": 3,
                    "deployed": 1
                })
            } else {
                serde_json::json!({
                    "key": format!("FEAT-{i}"),
                    "status": "in progress",
                    "team": team,
                    "workflow": "feature",
                    "analysis": 2,
                    "review": 12
                })
            }
        }).collect::<Vec<_>>(),
        "history": [
            {"period_id": "PI-1", "throughput": 8, "avg_lead_time_days": 24.0},
            {"period_id": "PI-2", "throughput": 10, "avg_lead_time_days": 26.0}
        ]
    })
    .to_string()
}
