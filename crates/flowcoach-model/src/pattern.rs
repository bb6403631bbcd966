//! Detected flow patterns

use crate::evidence::EvidenceRef;
use crate::id::PatternId;
use crate::insight::Severity;
use crate::stage::StageName;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};

/// Pattern classification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    /// A stage where work accumulates
    Bottleneck,
    /// Items exceeding the time-in-stage threshold
    StuckItem,
    /// Work in progress above recommended limits
    HighWip,
    /// Wide lead time spread
    LowPredictability,
}

impl PatternKind {
    /// Symptom tag used to query coaching knowledge
    #[inline]
    #[must_use]
    pub fn symptom_tag(self) -> &'static str {
        match self {
            Self::Bottleneck => "bottleneck",
            Self::StuckItem => "stuck-item",
            Self::HighWip => "high-wip",
            Self::LowPredictability => "low-predictability",
        }
    }

    /// Human-readable label
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Bottleneck => "bottleneck",
            Self::StuckItem => "stuck item",
            Self::HighWip => "high WIP",
            Self::LowPredictability => "low predictability",
        }
    }

    /// All kinds
    #[must_use]
    pub fn all() -> [Self; 4] {
        [
            Self::Bottleneck,
            Self::StuckItem,
            Self::HighWip,
            Self::LowPredictability,
        ]
    }
}

impl Display for PatternKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.symptom_tag())
    }
}

/// What a pattern is about
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternSubject {
    /// One workflow stage
    Stage { stage: StageName },
    /// One team
    Team { team: String },
    /// The workflow as a whole
    Workflow,
}

impl PatternSubject {
    /// Stage of a stage subject
    #[inline]
    #[must_use]
    pub fn stage(&self) -> Option<&StageName> {
        match self {
            Self::Stage { stage } => Some(stage),
            _ => None,
        }
    }

    /// Stable key used in identifiers and ordering
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Stage { stage } => format!("stage:{stage}"),
            Self::Team { team } => format!("team:{team}"),
            Self::Workflow => "workflow".to_string(),
        }
    }

    /// Phrase used in prose
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Stage { stage } => format!("the {stage} stage"),
            Self::Team { team } => format!("team {team}"),
            Self::Workflow => "the workflow".to_string(),
        }
    }
}

/// A detected pattern with its evidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    /// Identifier derived from scope, kind and subject
    pub id: PatternId,
    /// Classification
    pub kind: PatternKind,
    /// Severity tier
    pub severity: Severity,
    /// What the pattern is about
    pub subject: PatternSubject,
    /// One-sentence description
    pub description: String,
    /// Snapshot fields supporting the pattern
    pub evidence: SmallVec<[EvidenceRef; 4]>,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Share of relevant items affected, in [0, 1]
    pub impact: f64,
    /// Keys of affected items (stuck items)
    pub affected_items: Vec<String>,
    /// Bottleneck score (bottleneck patterns only)
    pub score: Option<f64>,
}

impl Pattern {
    /// Create pattern
    ///
    /// The identifier is derived from `scope_id`, `kind` and `subject`.
    #[must_use]
    pub fn new(
        scope_id: &str,
        kind: PatternKind,
        severity: Severity,
        subject: PatternSubject,
        description: impl Into<String>,
    ) -> Self {
        let id = PatternId::derive(&[scope_id, kind.symptom_tag(), &subject.key()]);
        Self {
            id,
            kind,
            severity,
            subject,
            description: description.into(),
            evidence: SmallVec::new(),
            confidence: 0.5,
            impact: 0.0,
            affected_items: Vec::new(),
            score: None,
        }
    }

    /// With evidence reference
    #[inline]
    #[must_use]
    pub fn with_evidence(mut self, evidence: EvidenceRef) -> Self {
        self.evidence.push(evidence);
        self
    }

    /// With optional evidence reference (ignored if `None`)
    #[inline]
    #[must_use]
    pub fn with_optional_evidence(mut self, evidence: Option<EvidenceRef>) -> Self {
        if let Some(evidence) = evidence {
            self.evidence.push(evidence);
        }
        self
    }

    /// With confidence (clamped to [0, 1])
    #[inline]
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// With impact share (clamped to [0, 1])
    #[inline]
    #[must_use]
    pub fn with_impact(mut self, impact: f64) -> Self {
        self.impact = impact.clamp(0.0, 1.0);
        self
    }

    /// With affected item keys
    #[inline]
    #[must_use]
    pub fn with_affected_items(mut self, items: Vec<String>) -> Self {
        self.affected_items = items;
        self
    }

    /// With bottleneck score
    #[inline]
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Evidence reference pointing at this pattern
    #[inline]
    #[must_use]
    pub fn as_evidence(&self) -> EvidenceRef {
        EvidenceRef::pattern(self.id.clone(), self.kind)
    }

    /// Names of the metric fields cited as evidence
    #[must_use]
    pub fn metric_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .evidence
            .iter()
            .filter_map(|e| match e {
                EvidenceRef::Metric { field, .. } => Some(field.as_str()),
                EvidenceRef::Pattern { .. } => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::MetricField;

    #[test]
    fn pattern_id_is_stable() {
        let subject = PatternSubject::Stage {
            stage: StageName::new("review"),
        };
        let a = Pattern::new("art-1", PatternKind::Bottleneck, Severity::Warning, subject.clone(), "a");
        let b = Pattern::new("art-1", PatternKind::Bottleneck, Severity::Critical, subject, "b");
        assert_eq!(a.id, b.id);

        let other = Pattern::new(
            "art-1",
            PatternKind::StuckItem,
            Severity::Warning,
            PatternSubject::Workflow,
            "c",
        );
        assert_ne!(a.id, other.id);
    }

    #[test]
    fn builder_clamps_ranges() {
        let pattern = Pattern::new(
            "t",
            PatternKind::HighWip,
            Severity::Info,
            PatternSubject::Workflow,
            "wip",
        )
        .with_confidence(1.7)
        .with_impact(-0.2);
        assert_eq!(pattern.confidence, 1.0);
        assert_eq!(pattern.impact, 0.0);
    }

    #[test]
    fn metric_names_are_deduplicated() {
        let pattern = Pattern::new(
            "t",
            PatternKind::Bottleneck,
            Severity::Warning,
            PatternSubject::Workflow,
            "x",
        )
        .with_evidence(EvidenceRef::stage_metric(MetricField::StageMeanDays, "review", 9.0))
        .with_evidence(EvidenceRef::stage_metric(MetricField::StageMeanDays, "test", 3.0))
        .with_evidence(EvidenceRef::metric(MetricField::FlowEfficiency, 30.0));
        assert_eq!(pattern.metric_names(), vec!["flow_efficiency", "stage_mean_days"]);
    }

    #[test]
    fn symptom_tags() {
        assert_eq!(PatternKind::StuckItem.symptom_tag(), "stuck-item");
        assert_eq!(PatternKind::all().len(), 4);
    }
}
