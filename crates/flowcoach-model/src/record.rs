//! Per-item flow records
//!
//! A [`WorkItemFlowRecord`] is read-only input: the pipeline never mutates
//! or persists it.

use crate::error::ModelError;
use crate::stage::{StageName, WorkflowShape};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Completion status of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    /// Not yet pulled into the workflow
    NotStarted,
    /// Somewhere between the first and the terminal stage
    InProgress,
    /// Delivered
    Completed,
    /// Abandoned
    Cancelled,
}

impl ItemStatus {
    /// Check if status is terminal (completed or cancelled)
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Lenient parse of provider status strings
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase().replace(['_', ' '], "-");
        match lowered.as_str() {
            "done" | "completed" | "complete" | "closed" | "resolved" | "deployed"
            | "released" => Self::Completed,
            "cancelled" | "canceled" | "rejected" | "won't-do" | "wont-do" | "obsolete" => {
                Self::Cancelled
            }
            "new" | "open" | "to-do" | "todo" | "not-started" | "funnel" | "backlog" => {
                Self::NotStarted
            }
            _ => Self::InProgress,
        }
    }
}

impl FromStr for ItemStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

/// Organizational tags attached to a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeTags {
    /// Program identifier
    pub program: Option<String>,
    /// Owning team
    pub team: Option<String>,
    /// Planning period (e.g. program increment)
    pub period: Option<String>,
}

/// Stage durations for one work item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkItemFlowRecord {
    key: String,
    status: ItemStatus,
    workflow: WorkflowShape,
    tags: ScopeTags,
    stages: IndexMap<StageName, f64>,
    /// Stages outside the workflow's known layout
    extra_stages: IndexMap<StageName, f64>,
    total_leadtime: f64,
    #[serde(skip)]
    leadtime_explicit: bool,
    current_stage: Option<StageName>,
}

fn check_duration(item: &str, stage: &str, days: f64) -> Result<(), ModelError> {
    if days.is_finite() && days >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidDuration {
            item: item.to_string(),
            stage: stage.to_string(),
            value: days,
        })
    }
}

impl WorkItemFlowRecord {
    /// Create record, validating durations and deriving defaults
    ///
    /// Stages outside `workflow` are dropped; the rest are kept in workflow
    /// order. A missing lead time is the sum of stage days up to delivery
    /// (terminal stages excluded); a missing current stage for an in-flight
    /// item is its latest recorded stage.
    ///
    /// # Errors
    /// Returns error if the key is empty or any duration is negative or non-finite
    pub fn new(
        key: impl Into<String>,
        status: ItemStatus,
        workflow: WorkflowShape,
        stages: impl IntoIterator<Item = (StageName, f64)>,
    ) -> Result<Self, ModelError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ModelError::MissingKey);
        }

        let mut collected: Vec<(usize, StageName, f64)> = Vec::new();
        for (stage, days) in stages {
            check_duration(&key, stage.as_str(), days)?;
            match workflow.position(&stage) {
                Some(pos) => collected.push((pos, stage, days)),
                None => tracing::debug!("Dropping stage {} outside {} workflow", stage, workflow),
            }
        }
        collected.sort_by_key(|(pos, _, _)| *pos);

        let stages: IndexMap<StageName, f64> =
            collected.into_iter().map(|(_, s, d)| (s, d)).collect();

        let mut record = Self {
            key,
            status,
            workflow,
            tags: ScopeTags::default(),
            stages,
            extra_stages: IndexMap::new(),
            total_leadtime: 0.0,
            leadtime_explicit: false,
            current_stage: None,
        };
        record.total_leadtime = record.derived_leadtime();
        record.current_stage = record.latest_stage();
        Ok(record)
    }

    /// With stages outside the known workflow layout
    ///
    /// Their days count toward a derived lead time but not toward
    /// per-stage statistics.
    ///
    /// # Errors
    /// Returns error if any duration is negative or non-finite
    pub fn with_extra_stages(
        mut self,
        stages: impl IntoIterator<Item = (StageName, f64)>,
    ) -> Result<Self, ModelError> {
        for (stage, days) in stages {
            check_duration(&self.key, stage.as_str(), days)?;
            if self.workflow.contains(&stage) {
                continue;
            }
            self.extra_stages.insert(stage, days);
        }
        if !self.leadtime_explicit {
            self.total_leadtime = self.derived_leadtime();
        }
        Ok(self)
    }

    /// With scope tags
    #[inline]
    #[must_use]
    pub fn with_tags(mut self, tags: ScopeTags) -> Self {
        self.tags = tags;
        self
    }

    /// With team tag
    #[inline]
    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.tags.team = Some(team.into());
        self
    }

    /// With explicit total lead time
    ///
    /// # Errors
    /// Returns error if the value is negative or non-finite
    pub fn with_total_leadtime(mut self, days: f64) -> Result<Self, ModelError> {
        check_duration(&self.key, "total_leadtime", days)?;
        self.total_leadtime = days;
        self.leadtime_explicit = true;
        Ok(self)
    }

    /// With explicit current stage
    #[inline]
    #[must_use]
    pub fn with_current_stage(mut self, stage: StageName) -> Self {
        self.current_stage = Some(stage);
        self
    }

    /// Item key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Completion status
    #[inline]
    #[must_use]
    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Workflow shape
    #[inline]
    #[must_use]
    pub fn workflow(&self) -> WorkflowShape {
        self.workflow
    }

    /// Scope tags
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &ScopeTags {
        &self.tags
    }

    /// Team tag, if any
    #[inline]
    #[must_use]
    pub fn team(&self) -> Option<&str> {
        self.tags.team.as_deref()
    }

    /// Stage durations in workflow order
    #[inline]
    #[must_use]
    pub fn stages(&self) -> &IndexMap<StageName, f64> {
        &self.stages
    }

    /// Stages outside the workflow layout, in arrival order
    #[inline]
    #[must_use]
    pub fn extra_stages(&self) -> &IndexMap<StageName, f64> {
        &self.extra_stages
    }

    /// Days spent in a stage, if recorded
    #[inline]
    #[must_use]
    pub fn stage_days(&self, stage: &StageName) -> Option<f64> {
        self.stages
            .get(stage)
            .or_else(|| self.extra_stages.get(stage))
            .copied()
    }

    /// Total lead time in days
    #[inline]
    #[must_use]
    pub fn total_leadtime(&self) -> f64 {
        self.total_leadtime
    }

    /// Current stage (for in-flight items) or last recorded stage
    #[inline]
    #[must_use]
    pub fn current_stage(&self) -> Option<&StageName> {
        self.current_stage.as_ref()
    }

    /// Days spent in the current stage
    #[must_use]
    pub fn days_in_current_stage(&self) -> Option<f64> {
        self.current_stage.as_ref().and_then(|s| self.stage_days(s))
    }

    /// Check if item was delivered
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ItemStatus::Completed
    }

    /// Check if item is in flight
    #[inline]
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.status == ItemStatus::InProgress
    }

    /// Sum of days spent in the given stages
    #[must_use]
    pub fn active_days(&self, active: &[StageName]) -> f64 {
        active.iter().filter_map(|s| self.stage_days(s)).sum()
    }

    /// Check if the record carries enough data to be trusted
    ///
    /// Requires a positive lead time and every required stage of its workflow
    /// up to the current one.
    #[must_use]
    pub fn is_complete_data(&self) -> bool {
        if self.total_leadtime <= 0.0 || self.stages.is_empty() {
            return false;
        }
        let reached = self
            .current_stage
            .as_ref()
            .and_then(|s| self.workflow.position(s))
            .unwrap_or(usize::MAX);
        self.workflow
            .required_stages()
            .filter(|s| self.workflow.position(s).is_some_and(|p| p <= reached))
            .all(|s| self.stages.contains_key(&s))
    }

    fn derived_leadtime(&self) -> f64 {
        let workflow = self.workflow;
        let known: f64 = self
            .stages
            .iter()
            .filter(|(s, _)| !workflow.is_terminal(s))
            .map(|(_, d)| d)
            .sum();
        known + self.extra_stages.values().sum::<f64>()
    }

    fn latest_stage(&self) -> Option<StageName> {
        self.stages
            .iter()
            .rev()
            .find(|(_, days)| **days > 0.0)
            .or_else(|| self.stages.iter().next_back())
            .map(|(s, _)| s.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(stages: &[(&str, f64)]) -> WorkItemFlowRecord {
        WorkItemFlowRecord::new(
            "STORY-1",
            ItemStatus::InProgress,
            WorkflowShape::Story,
            stages.iter().map(|(s, d)| (StageName::new(s), *d)),
        )
        .unwrap()
    }

    #[test]
    fn status_parse_lenient() {
        assert_eq!(ItemStatus::parse_lenient("Done"), ItemStatus::Completed);
        assert_eq!(ItemStatus::parse_lenient("Canceled"), ItemStatus::Cancelled);
        assert_eq!(ItemStatus::parse_lenient("To Do"), ItemStatus::NotStarted);
        assert_eq!(ItemStatus::parse_lenient("In Review"), ItemStatus::InProgress);
        assert!(ItemStatus::Cancelled.is_terminal());
        assert!(!ItemStatus::InProgress.is_terminal());
    }

    #[test]
    fn stages_reordered_into_workflow_order() {
        let record = story(&[("in-testing", 1.0), ("refinement", 2.0), ("in-development", 3.0)]);
        let order: Vec<_> = record.stages().keys().map(StageName::as_str).collect();
        assert_eq!(order, vec!["refinement", "in-development", "in-testing"]);
        assert_eq!(record.total_leadtime(), 6.0);
    }

    #[test]
    fn current_stage_is_latest_recorded() {
        let record = story(&[("refinement", 2.0), ("in-development", 4.0)]);
        assert_eq!(record.current_stage().unwrap().as_str(), "in-development");
        assert_eq!(record.days_in_current_stage(), Some(4.0));
    }

    #[test]
    fn derived_lead_time_stops_at_delivery() {
        let record = WorkItemFlowRecord::new(
            "S-1",
            ItemStatus::Completed,
            WorkflowShape::Story,
            [
                (StageName::new("in-development"), 10.0),
                (StageName::new("deployed"), 20.0),
            ],
        )
        .unwrap();
        assert_eq!(record.total_leadtime(), 10.0);
        assert_eq!(record.stage_days(&StageName::new("deployed")), Some(20.0));
    }

    #[test]
    fn extra_stages_count_toward_derived_lead_time() {
        let record = story(&[("refinement", 2.0), ("in-development", 3.0)])
            .with_extra_stages([(StageName::new("security-review"), 4.0)])
            .unwrap();
        assert_eq!(record.total_leadtime(), 9.0);
        assert_eq!(record.stages().len(), 2);
        assert_eq!(record.stage_days(&StageName::new("security-review")), Some(4.0));

        let explicit = story(&[("refinement", 2.0)])
            .with_total_leadtime(30.0)
            .unwrap()
            .with_extra_stages([(StageName::new("security-review"), 4.0)])
            .unwrap();
        assert_eq!(explicit.total_leadtime(), 30.0);
    }

    #[test]
    fn foreign_stages_are_dropped() {
        let record = story(&[("refinement", 2.0), ("integration-test", 4.0)]);
        assert_eq!(record.stages().len(), 1);
    }

    #[test]
    fn negative_duration_rejected() {
        let result = WorkItemFlowRecord::new(
            "STORY-2",
            ItemStatus::Completed,
            WorkflowShape::Story,
            [(StageName::new("refinement"), -1.0)],
        );
        assert!(matches!(result, Err(ModelError::InvalidDuration { .. })));
    }

    #[test]
    fn empty_key_rejected() {
        let result =
            WorkItemFlowRecord::new(" ", ItemStatus::Completed, WorkflowShape::Story, []);
        assert!(matches!(result, Err(ModelError::MissingKey)));
    }

    #[test]
    fn active_days_sums_selected_stages() {
        let record = story(&[("in-development", 4.0), ("code-review", 1.5), ("in-testing", 2.0)]);
        let active = [StageName::new("in-development"), StageName::new("code-review")];
        assert_eq!(record.active_days(&active), 5.5);
    }

    #[test]
    fn completeness_ignores_optional_code_review() {
        let record = story(&[
            ("refinement", 1.0),
            ("ready-for-development", 1.0),
            ("in-development", 3.0),
            ("ready-for-test", 1.0),
            ("in-testing", 2.0),
            ("ready-for-deployment", 1.0),
            ("deployed", 0.5),
        ]);
        assert!(record.is_complete_data());

        let sparse = story(&[("refinement", 1.0), ("in-testing", 2.0)]);
        assert!(!sparse.is_complete_data());
    }
}
