//! Analysis scope and time window

use crate::error::ModelError;
use crate::stage::WorkflowShape;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Organizational level a request is scoped to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// A single feature and its stories
    Feature,
    /// One team
    Team,
    /// A whole program (release train)
    Program,
    /// One planning period across a program
    Period,
    /// Several programs
    Portfolio,
}

impl ScopeKind {
    /// Coarse level used to match knowledge applicability
    #[inline]
    #[must_use]
    pub fn level(self) -> ScopeLevel {
        match self {
            Self::Feature | Self::Team => ScopeLevel::Team,
            Self::Program | Self::Period => ScopeLevel::Program,
            Self::Portfolio => ScopeLevel::Portfolio,
        }
    }

    /// Name used in wire format
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Team => "team",
            Self::Program => "program",
            Self::Period => "period",
            Self::Portfolio => "portfolio",
        }
    }

    /// Noun phrase used in insight prose
    #[inline]
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Feature => "the feature",
            Self::Team => "the team",
            Self::Program => "the program",
            Self::Period => "the planning period",
            Self::Portfolio => "the portfolio",
        }
    }
}

impl FromStr for ScopeKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feature" => Ok(Self::Feature),
            "team" => Ok(Self::Team),
            "program" | "art" => Ok(Self::Program),
            "period" | "pi" => Ok(Self::Period),
            "portfolio" => Ok(Self::Portfolio),
            _ => Err(ModelError::UnknownScope(s.to_string())),
        }
    }
}

impl Display for ScopeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse applicability level of coaching knowledge
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    Team,
    Program,
    Portfolio,
}

impl ScopeLevel {
    /// Name used in corpus headers
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Program => "program",
            Self::Portfolio => "portfolio",
        }
    }
}

/// Calendar window of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    /// First day (inclusive)
    pub start: NaiveDate,
    /// Last day (exclusive)
    pub end: NaiveDate,
}

impl AnalysisWindow {
    /// Create window
    ///
    /// # Errors
    /// Returns error if `end` precedes `start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ModelError> {
        if end < start {
            return Err(ModelError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window of `days` days ending (exclusive) at `end`
    #[must_use]
    pub fn ending(end: NaiveDate, days: u32) -> Self {
        Self {
            start: end - chrono::Duration::days(i64::from(days)),
            end,
        }
    }

    /// Length in days
    #[inline]
    #[must_use]
    pub fn period_days(&self) -> f64 {
        (self.end - self.start).num_days() as f64
    }

    /// Check if the window lies entirely before `today`
    ///
    /// A window whose last day is today or later counts as current.
    #[inline]
    #[must_use]
    pub fn is_retrospective(&self, today: NaiveDate) -> bool {
        self.end <= today
    }
}

/// Scope descriptor sent to the flow data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeDescriptor {
    /// Scope kind
    pub kind: ScopeKind,
    /// Identifier of the scoped entity (team name, program id, ...)
    pub scope_id: String,
    /// Program identifiers
    #[serde(default)]
    pub program_ids: Vec<String>,
    /// Period identifiers
    #[serde(default)]
    pub period_ids: Vec<String>,
    /// Team filter
    #[serde(default)]
    pub team: Option<String>,
    /// Days in one stage after which an item counts as stuck
    pub stuck_threshold_days: f64,
    /// Workflow shape analyzed
    #[serde(default)]
    pub workflow: WorkflowShape,
    /// Analysis window
    pub window: AnalysisWindow,
}

impl ScopeDescriptor {
    /// Create descriptor with default threshold (7 days)
    #[must_use]
    pub fn new(kind: ScopeKind, scope_id: impl Into<String>, window: AnalysisWindow) -> Self {
        Self {
            kind,
            scope_id: scope_id.into(),
            program_ids: Vec::new(),
            period_ids: Vec::new(),
            team: None,
            stuck_threshold_days: 7.0,
            workflow: WorkflowShape::default(),
            window,
        }
    }

    /// With program identifiers
    #[inline]
    #[must_use]
    pub fn with_programs(mut self, ids: Vec<String>) -> Self {
        self.program_ids = ids;
        self
    }

    /// With period identifiers
    #[inline]
    #[must_use]
    pub fn with_periods(mut self, ids: Vec<String>) -> Self {
        self.period_ids = ids;
        self
    }

    /// With team filter
    #[inline]
    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// With stuck-item threshold
    #[inline]
    #[must_use]
    pub fn with_stuck_threshold(mut self, days: f64) -> Self {
        self.stuck_threshold_days = days;
        self
    }

    /// With workflow shape
    #[inline]
    #[must_use]
    pub fn with_workflow(mut self, workflow: WorkflowShape) -> Self {
        self.workflow = workflow;
        self
    }
}

/// Throughput and lead time of one past period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Period identifier
    pub period_id: String,
    /// Items completed in the period
    pub throughput: f64,
    /// Average lead time of items completed in the period
    #[serde(default)]
    pub avg_lead_time_days: Option<f64>,
}

impl PeriodSummary {
    /// Create summary
    #[inline]
    #[must_use]
    pub fn new(period_id: impl Into<String>, throughput: f64) -> Self {
        Self {
            period_id: period_id.into(),
            throughput,
            avg_lead_time_days: None,
        }
    }

    /// With average lead time
    #[inline]
    #[must_use]
    pub fn with_lead_time(mut self, days: f64) -> Self {
        self.avg_lead_time_days = Some(days);
        self
    }
}
