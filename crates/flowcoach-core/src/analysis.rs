//! Program-level flow analysis
//!
//! Breaks a program or period snapshot down by team (and by period when
//! records carry period tags) with Little's Law per group, and reports the
//! in-flight distribution across teams.

use flowcoach_metrics::GroupFlow;
use flowcoach_model::{CapacityBaseline, MetricsSnapshot, WorkItemFlowRecord};
use flowcoach_patterns::WipDistribution;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

const UNASSIGNED: &str = "unassigned";

/// Team and period breakdown of one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowAnalysis {
    /// λ, W and L per team, sorted by team
    pub teams: Vec<GroupFlow>,
    /// λ, W and L per period tag, sorted by period (empty when untagged)
    pub periods: Vec<GroupFlow>,
    /// Capacity assessment against the historical baseline
    pub capacity: Option<CapacityBaseline>,
    /// In-flight items per team
    pub wip_by_team: IndexMap<String, usize>,
    /// Teams whose in-flight items exceed their predicted WIP beyond tolerance
    pub overloaded_teams: Vec<String>,
}

impl FlowAnalysis {
    /// Analyze the records following the snapshot's workflow
    #[must_use]
    pub fn compute(
        snapshot: &MetricsSnapshot,
        records: &[WorkItemFlowRecord],
        wip_tolerance: f64,
    ) -> Self {
        let workflow = snapshot.workflow();
        let relevant: Vec<&WorkItemFlowRecord> =
            records.iter().filter(|r| r.workflow() == workflow).collect();
        let days = snapshot.period_days();

        let teams = group_by(&relevant, |r| Some(r.team().unwrap_or(UNASSIGNED).to_string()))
            .into_iter()
            .map(|(team, group)| GroupFlow::compute(team, group, days))
            .collect::<Vec<_>>();
        let periods = group_by(&relevant, |r| r.tags().period.clone())
            .into_iter()
            .map(|(period, group)| GroupFlow::compute(period, group, days))
            .collect();

        let overloaded_teams = teams
            .iter()
            .filter(|t| t.predicted_wip > 0.0 && t.wip_ratio() > 1.0 + wip_tolerance)
            .map(|t| t.group.clone())
            .collect::<Vec<_>>();
        if !overloaded_teams.is_empty() {
            tracing::debug!("Overloaded teams: {:?}", overloaded_teams);
        }

        Self {
            teams,
            periods,
            capacity: snapshot.baseline().cloned(),
            wip_by_team: WipDistribution::from_records(relevant.iter().copied(), workflow).by_team,
            overloaded_teams,
        }
    }

    /// Team breakdown by name
    #[must_use]
    pub fn team(&self, name: &str) -> Option<&GroupFlow> {
        self.teams.iter().find(|t| t.group == name)
    }
}

fn group_by<'a>(
    records: &[&'a WorkItemFlowRecord],
    key: impl Fn(&WorkItemFlowRecord) -> Option<String>,
) -> BTreeMap<String, Vec<&'a WorkItemFlowRecord>> {
    let mut groups: BTreeMap<String, Vec<&'a WorkItemFlowRecord>> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            groups.entry(k).or_default().push(*record);
        }
    }
    groups
}
