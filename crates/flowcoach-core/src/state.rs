//! Append-only run state
//!
//! Each slot is written at most once by the stage that owns it; later
//! stages only read. A second write is an error, never an overwrite.

use crate::analysis::FlowAnalysis;
use crate::error::StateError;
use flowcoach_knowledge::ScoredDocument;
use flowcoach_model::{
    Insight, MetricsSnapshot, Pattern, PatternId, PeriodSummary, Severity, WorkItemFlowRecord,
};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;

/// Records fetched by the Collect stage
#[derive(Debug, Clone, Default)]
pub struct CollectedData {
    pub records: Vec<WorkItemFlowRecord>,
    pub history: Vec<PeriodSummary>,
    /// Records rejected at ingestion
    pub rejected: usize,
    /// Duration fields outside every known stage
    pub ignored_fields: usize,
}

/// Counts behind an insufficient-data outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientSample {
    pub completed: usize,
    pub minimum: usize,
    pub in_flight: usize,
}

/// State of one pipeline run
#[derive(Debug, Default)]
pub struct RunState {
    collected: OnceCell<CollectedData>,
    unavailable: OnceCell<String>,
    insufficient: OnceCell<InsufficientSample>,
    snapshot: OnceCell<MetricsSnapshot>,
    flow_analysis: OnceCell<FlowAnalysis>,
    flow_health: OnceCell<Severity>,
    patterns: OnceCell<Vec<Pattern>>,
    knowledge: OnceCell<BTreeMap<PatternId, Vec<ScoredDocument>>>,
    insights: OnceCell<Vec<Insight>>,
}

fn record<T>(cell: &OnceCell<T>, slot: &'static str, value: T) -> Result<(), StateError> {
    cell.set(value)
        .map_err(|_| StateError::AlreadyRecorded { slot })
}

impl RunState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record fetched records
    ///
    /// # Errors
    /// Returns [`StateError::AlreadyRecorded`] on a second write
    pub fn record_collected(&self, data: CollectedData) -> Result<(), StateError> {
        record(&self.collected, "collected", data)
    }

    /// Mark the flow data as unavailable
    ///
    /// # Errors
    /// Returns [`StateError::AlreadyRecorded`] on a second write
    pub fn record_unavailable(&self, reason: impl Into<String>) -> Result<(), StateError> {
        record(&self.unavailable, "unavailable", reason.into())
    }

    /// # Errors
    /// Returns [`StateError::AlreadyRecorded`] on a second write
    pub fn record_insufficient(&self, sample: InsufficientSample) -> Result<(), StateError> {
        record(&self.insufficient, "insufficient", sample)
    }

    /// # Errors
    /// Returns [`StateError::AlreadyRecorded`] on a second write
    pub fn record_snapshot(&self, snapshot: MetricsSnapshot) -> Result<(), StateError> {
        record(&self.snapshot, "snapshot", snapshot)
    }

    /// # Errors
    /// Returns [`StateError::AlreadyRecorded`] on a second write
    pub fn record_flow_analysis(&self, analysis: FlowAnalysis) -> Result<(), StateError> {
        record(&self.flow_analysis, "flow_analysis", analysis)
    }

    /// Record the patterns and overall flow health
    ///
    /// # Errors
    /// Returns [`StateError::AlreadyRecorded`] on a second write
    pub fn record_patterns(
        &self,
        flow_health: Severity,
        patterns: Vec<Pattern>,
    ) -> Result<(), StateError> {
        record(&self.flow_health, "flow_health", flow_health)?;
        record(&self.patterns, "patterns", patterns)
    }

    /// # Errors
    /// Returns [`StateError::AlreadyRecorded`] on a second write
    pub fn record_knowledge(
        &self,
        knowledge: BTreeMap<PatternId, Vec<ScoredDocument>>,
    ) -> Result<(), StateError> {
        record(&self.knowledge, "knowledge", knowledge)
    }

    /// # Errors
    /// Returns [`StateError::AlreadyRecorded`] on a second write
    pub fn record_insights(&self, insights: Vec<Insight>) -> Result<(), StateError> {
        record(&self.insights, "insights", insights)
    }

    #[inline]
    #[must_use]
    pub fn collected(&self) -> Option<&CollectedData> {
        self.collected.get()
    }

    #[inline]
    #[must_use]
    pub fn unavailable(&self) -> Option<&str> {
        self.unavailable.get().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn insufficient(&self) -> Option<InsufficientSample> {
        self.insufficient.get().copied()
    }

    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Option<&MetricsSnapshot> {
        self.snapshot.get()
    }

    #[inline]
    #[must_use]
    pub fn flow_analysis(&self) -> Option<&FlowAnalysis> {
        self.flow_analysis.get()
    }

    #[inline]
    #[must_use]
    pub fn flow_health(&self) -> Option<Severity> {
        self.flow_health.get().copied()
    }

    /// Detected patterns (empty before detection)
    #[inline]
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        self.patterns.get().map_or(&[], Vec::as_slice)
    }

    #[inline]
    #[must_use]
    pub fn knowledge(&self) -> Option<&BTreeMap<PatternId, Vec<ScoredDocument>>> {
        self.knowledge.get()
    }

    /// Synthesized insights (empty before synthesis)
    #[inline]
    #[must_use]
    pub fn insights(&self) -> &[Insight] {
        self.insights.get().map_or(&[], Vec::as_slice)
    }

    /// Take ownership of every recorded slot
    #[must_use]
    pub fn into_parts(self) -> RunParts {
        RunParts {
            collected: self.collected.into_inner(),
            snapshot: self.snapshot.into_inner(),
            flow_analysis: self.flow_analysis.into_inner(),
            flow_health: self.flow_health.into_inner(),
            patterns: self.patterns.into_inner().unwrap_or_default(),
            knowledge: self.knowledge.into_inner().unwrap_or_default(),
            insights: self.insights.into_inner().unwrap_or_default(),
        }
    }
}

/// Owned contents of a finished run
#[derive(Debug, Default)]
pub struct RunParts {
    pub collected: Option<CollectedData>,
    pub snapshot: Option<MetricsSnapshot>,
    pub flow_analysis: Option<FlowAnalysis>,
    pub flow_health: Option<Severity>,
    pub patterns: Vec<Pattern>,
    pub knowledge: BTreeMap<PatternId, Vec<ScoredDocument>>,
    pub insights: Vec<Insight>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcoach_test_utils::completed_stories;

    #[test]
    fn slots_are_write_once() {
        let state = RunState::new();
        state
            .record_collected(CollectedData {
                records: completed_stories(3, 10.0),
                ..CollectedData::default()
            })
            .unwrap();
        assert_eq!(state.collected().unwrap().records.len(), 3);

        let again = state.record_collected(CollectedData::default());
        assert_eq!(
            again,
            Err(StateError::AlreadyRecorded { slot: "collected" })
        );
        assert_eq!(state.collected().unwrap().records.len(), 3);
    }

    #[test]
    fn empty_slots_read_as_empty() {
        let state = RunState::new();
        assert!(state.snapshot().is_none());
        assert!(state.patterns().is_empty());
        assert!(state.insights().is_empty());
        assert!(state.unavailable().is_none());

        state.record_unavailable("timed out").unwrap();
        assert_eq!(state.unavailable(), Some("timed out"));
        assert!(state.record_unavailable("again").is_err());
    }

    #[test]
    fn patterns_and_health_recorded_together() {
        let state = RunState::new();
        state.record_patterns(Severity::Warning, Vec::new()).unwrap();
        assert_eq!(state.flow_health(), Some(Severity::Warning));
        assert_eq!(
            state.record_patterns(Severity::Info, Vec::new()),
            Err(StateError::AlreadyRecorded { slot: "flow_health" })
        );

        let parts = state.into_parts();
        assert_eq!(parts.flow_health, Some(Severity::Warning));
        assert!(parts.snapshot.is_none());
    }
}
