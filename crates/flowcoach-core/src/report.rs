//! Pipeline report
//!
//! The serializable result of one run: every value the run recorded, the
//! stages it visited and every stage failure.

use crate::analysis::FlowAnalysis;
use crate::failure::{FailureKind, StageFailure};
use crate::stage::{PipelineStage, Route};
use crate::state::RunParts;
use flowcoach_knowledge::ScoredDocument;
use flowcoach_model::{Insight, MetricsSnapshot, Pattern, PatternId, ScopeDescriptor, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// One knowledge document retrieved for a pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeMatch {
    pub pattern_id: PatternId,
    pub document_id: String,
    pub title: String,
    pub score: f64,
}

impl KnowledgeMatch {
    fn flatten(knowledge: &BTreeMap<PatternId, Vec<ScoredDocument>>) -> Vec<Self> {
        knowledge
            .iter()
            .flat_map(|(pattern_id, hits)| {
                hits.iter().map(move |hit| Self {
                    pattern_id: pattern_id.clone(),
                    document_id: hit.document.id.to_string(),
                    title: hit.document.title.clone(),
                    score: hit.score,
                })
            })
            .collect()
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Unique, time-sortable run identifier
    pub run_id: String,
    pub scope: ScopeDescriptor,
    pub route: Route,
    /// Stages in the order they were entered
    pub stages: Vec<PipelineStage>,
    pub records_accepted: usize,
    /// Records rejected at ingestion
    pub records_rejected: usize,
    /// Duration fields ignored at ingestion
    pub fields_ignored: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<MetricsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_health: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_analysis: Option<FlowAnalysis>,
    pub patterns: Vec<Pattern>,
    pub knowledge: Vec<KnowledgeMatch>,
    /// Insights in descending priority
    pub insights: Vec<Insight>,
    pub failures: Vec<StageFailure>,
    pub cancelled: bool,
}

impl PipelineReport {
    pub(crate) fn from_parts(
        run_id: String,
        scope: ScopeDescriptor,
        route: Route,
        stages: Vec<PipelineStage>,
        parts: RunParts,
        failures: Vec<StageFailure>,
    ) -> Self {
        let (records_accepted, records_rejected, fields_ignored) = parts
            .collected
            .as_ref()
            .map_or((0, 0, 0), |c| (c.records.len(), c.rejected, c.ignored_fields));
        Self {
            run_id,
            scope,
            route,
            stages,
            records_accepted,
            records_rejected,
            fields_ignored,
            snapshot: parts.snapshot,
            flow_health: parts.flow_health,
            flow_analysis: parts.flow_analysis,
            patterns: parts.patterns,
            knowledge: KnowledgeMatch::flatten(&parts.knowledge),
            insights: parts.insights,
            failures,
            cancelled: false,
        }
    }

    /// Empty report of a cancelled run
    pub(crate) fn cancelled(
        run_id: String,
        scope: ScopeDescriptor,
        route: Route,
        stages: Vec<PipelineStage>,
        at: PipelineStage,
    ) -> Self {
        let mut report = Self::from_parts(run_id, scope, route, stages, RunParts::default(), Vec::new());
        report.failures.push(StageFailure::new(
            at,
            FailureKind::Cancelled,
            format!("run cancelled before {at}"),
        ));
        report.cancelled = true;
        report
    }

    /// Check if any failure of `kind` was recorded
    #[must_use]
    pub fn has_failure(&self, kind: FailureKind) -> bool {
        self.failures.iter().any(|f| f.kind == kind)
    }

    /// Reason codes of every recorded failure, deduplicated in order
    #[must_use]
    pub fn failure_codes(&self) -> Vec<&'static str> {
        let mut codes: Vec<&'static str> = Vec::new();
        for failure in &self.failures {
            if !codes.contains(&failure.code) {
                codes.push(failure.code);
            }
        }
        codes
    }

    /// Check if the run reached pattern detection
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.stages.contains(&PipelineStage::DetectPatterns)
    }
}
