//! Pipeline stages and their transition table
//!
//! ```text
//! Collect → ComputeMetrics → [FlowAnalysis] → DetectPatterns
//!         → RetrieveKnowledge → Synthesize → Done
//! ```
//!
//! FlowAnalysis only runs on program and period scopes. Collect and
//! ComputeMetrics may skip straight to Synthesize when there is nothing to
//! analyze.

use crate::error::StateError;
use flowcoach_model::ScopeKind;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// One stage of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Collect,
    ComputeMetrics,
    FlowAnalysis,
    DetectPatterns,
    RetrieveKnowledge,
    Synthesize,
    Done,
}

impl PipelineStage {
    /// All stages in pipeline order
    #[must_use]
    pub fn all() -> [Self; 7] {
        [
            Self::Collect,
            Self::ComputeMetrics,
            Self::FlowAnalysis,
            Self::DetectPatterns,
            Self::RetrieveKnowledge,
            Self::Synthesize,
            Self::Done,
        ]
    }

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collect => "collect",
            Self::ComputeMetrics => "compute_metrics",
            Self::FlowAnalysis => "flow_analysis",
            Self::DetectPatterns => "detect_patterns",
            Self::RetrieveKnowledge => "retrieve_knowledge",
            Self::Synthesize => "synthesize",
            Self::Done => "done",
        }
    }

    /// Check if no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages reachable from `from`
#[must_use]
pub fn allowed_transitions(from: PipelineStage) -> Vec<PipelineStage> {
    use PipelineStage::*;
    match from {
        Collect => vec![ComputeMetrics, Synthesize],
        ComputeMetrics => vec![FlowAnalysis, DetectPatterns, Synthesize],
        FlowAnalysis => vec![DetectPatterns],
        DetectPatterns => vec![RetrieveKnowledge],
        RetrieveKnowledge => vec![Synthesize],
        Synthesize => vec![Done],
        Done => vec![],
    }
}

/// Validate a stage transition
///
/// # Errors
/// Returns [`StateError::IllegalTransition`] if `to` is not reachable from `from`
pub fn validate_transition(from: PipelineStage, to: PipelineStage) -> Result<(), StateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}

/// Path a scope takes through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Metrics straight into detection
    Direct,
    /// Team-level flow analysis between metrics and detection
    WithFlowAnalysis,
}

impl Route {
    /// Route of a scope kind
    #[inline]
    #[must_use]
    pub fn for_scope(kind: ScopeKind) -> Self {
        match kind {
            ScopeKind::Program | ScopeKind::Period => Self::WithFlowAnalysis,
            ScopeKind::Feature | ScopeKind::Team | ScopeKind::Portfolio => Self::Direct,
        }
    }

    /// Next stage on the happy path
    #[must_use]
    pub fn next(self, stage: PipelineStage) -> PipelineStage {
        use PipelineStage::*;
        match (self, stage) {
            (_, Collect) => ComputeMetrics,
            (Self::WithFlowAnalysis, ComputeMetrics) => FlowAnalysis,
            (Self::Direct, ComputeMetrics) | (_, FlowAnalysis) => DetectPatterns,
            (_, DetectPatterns) => RetrieveKnowledge,
            (_, RetrieveKnowledge) => Synthesize,
            (_, Synthesize | Done) => Done,
        }
    }

    /// Stages visited on the happy path
    #[must_use]
    pub fn stages(self) -> Vec<PipelineStage> {
        let mut stages = vec![PipelineStage::Collect];
        let mut stage = PipelineStage::Collect;
        while !stage.is_terminal() {
            stage = self.next(stage);
            stages.push(stage);
        }
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn program_scopes_run_flow_analysis() {
        assert_eq!(Route::for_scope(ScopeKind::Program), Route::WithFlowAnalysis);
        assert_eq!(Route::for_scope(ScopeKind::Period), Route::WithFlowAnalysis);
        assert_eq!(Route::for_scope(ScopeKind::Team), Route::Direct);
        assert!(Route::WithFlowAnalysis
            .stages()
            .contains(&PipelineStage::FlowAnalysis));
        assert!(!Route::Direct.stages().contains(&PipelineStage::FlowAnalysis));
    }

    #[test]
    fn skip_edges_lead_to_synthesize() {
        assert!(validate_transition(PipelineStage::Collect, PipelineStage::Synthesize).is_ok());
        assert!(
            validate_transition(PipelineStage::ComputeMetrics, PipelineStage::Synthesize).is_ok()
        );
        assert!(
            validate_transition(PipelineStage::FlowAnalysis, PipelineStage::Synthesize).is_err()
        );
    }

    #[test]
    fn done_is_terminal() {
        assert!(allowed_transitions(PipelineStage::Done).is_empty());
        assert_eq!(
            validate_transition(PipelineStage::Done, PipelineStage::Collect),
            Err(StateError::IllegalTransition {
                from: PipelineStage::Done,
                to: PipelineStage::Collect,
            })
        );
    }

    fn any_stage() -> impl Strategy<Value = PipelineStage> {
        prop::sample::select(PipelineStage::all().to_vec())
    }

    fn any_route() -> impl Strategy<Value = Route> {
        prop::sample::select(vec![Route::Direct, Route::WithFlowAnalysis])
    }

    proptest! {
        #[test]
        fn happy_path_only_takes_allowed_edges(route in any_route(), stage in any_stage()) {
            let next = route.next(stage);
            if stage.is_terminal() {
                prop_assert_eq!(next, PipelineStage::Done);
            } else {
                prop_assert!(validate_transition(stage, next).is_ok());
                prop_assert!(next > stage);
            }
        }

        #[test]
        fn validation_matches_table(from in any_stage(), to in any_stage()) {
            let allowed = allowed_transitions(from).contains(&to);
            prop_assert_eq!(validate_transition(from, to).is_ok(), allowed);
            if allowed {
                prop_assert!(to > from);
            }
        }
    }
}
