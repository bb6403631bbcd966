//! Insight documents
//!
//! An [`Insight`] always has the same five-part body, in this order:
//! observation, interpretation, root causes, recommended actions and
//! expected outcomes. Field names and order are part of the output contract.
//!
//! Insights are only built through [`InsightBuilder`], which refuses to
//! produce one without metric or pattern evidence.

use crate::error::ModelError;
use crate::evidence::{EvidenceRef, MetricField};
use crate::id::InsightId;
use crate::pattern::PatternKind;
use crate::scope::ScopeKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Severity tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Success,
}

impl Severity {
    /// Rank, higher is more severe
    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 3,
            Self::Warning => 2,
            Self::Info => 1,
            Self::Success => 0,
        }
    }

    /// Severity on the 0–100 prioritization scale
    #[inline]
    #[must_use]
    pub fn score(self) -> f64 {
        match self {
            Self::Critical => 100.0,
            Self::Warning => 70.0,
            Self::Info => 40.0,
            Self::Success => 10.0,
        }
    }

    /// More severe of two tiers
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Success => "success",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence tier of an observation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// Derive tier from sample size and data completeness (0–1)
    #[must_use]
    pub fn from_sample(sample_size: usize, completeness: f64) -> Self {
        if sample_size >= 30 && completeness >= 0.9 {
            Self::High
        } else if sample_size >= 10 && completeness >= 0.7 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Representative confidence on the 0–100 scale
    #[inline]
    #[must_use]
    pub fn percent(self) -> u8 {
        match self {
            Self::Low => 40,
            Self::Medium => 65,
            Self::High => 85,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// What an insight is about
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    FlowHealth,
    Capacity,
    Bottleneck,
    StuckItems,
    HighWip,
    LowPredictability,
    DataUnavailable,
    InsufficientData,
}

impl From<PatternKind> for InsightCategory {
    fn from(kind: PatternKind) -> Self {
        match kind {
            PatternKind::Bottleneck => Self::Bottleneck,
            PatternKind::StuckItem => Self::StuckItems,
            PatternKind::HighWip => Self::HighWip,
            PatternKind::LowPredictability => Self::LowPredictability,
        }
    }
}

impl InsightCategory {
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FlowHealth => "flow_health",
            Self::Capacity => "capacity",
            Self::Bottleneck => "bottleneck",
            Self::StuckItems => "stuck_items",
            Self::HighWip => "high_wip",
            Self::LowPredictability => "low_predictability",
            Self::DataUnavailable => "data_unavailable",
            Self::InsufficientData => "insufficient_data",
        }
    }

    /// Check if category explains a limitation rather than the flow itself
    #[inline]
    #[must_use]
    pub fn is_explanatory(self) -> bool {
        matches!(self, Self::DataUnavailable | Self::InsufficientData)
    }
}

/// Reference point of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Target,
    Baseline,
    PreviousPeriod,
}

/// Quantitative comparison within an observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Comparison {
    pub metric: MetricField,
    pub current: f64,
    pub reference: f64,
    pub reference_kind: ReferenceKind,
    /// (current − reference) / reference × 100, absent when reference is 0
    pub delta_pct: Option<f64>,
}

impl Comparison {
    /// Create comparison, computing the relative delta
    #[must_use]
    pub fn new(metric: MetricField, current: f64, reference: f64, kind: ReferenceKind) -> Self {
        let delta_pct = if reference.abs() > f64::EPSILON {
            Some((current - reference) / reference * 100.0)
        } else {
            None
        };
        Self {
            metric,
            current,
            reference,
            reference_kind: kind,
            delta_pct,
        }
    }
}

/// Part 1: quantitative observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    pub statement: String,
    pub comparisons: Vec<Comparison>,
    pub confidence_tier: ConfidenceTier,
    pub sample_size: usize,
}

/// Part 2: systemic interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Interpretation {
    pub summary: String,
    /// Scope the interpretation applies to
    pub scope_qualifier: String,
    /// Prose appended by the optional narrative enricher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<String>,
}

/// Where a root cause came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RootCauseSource {
    /// Read directly off the metrics
    Quantitative,
    /// Retrieved coaching knowledge
    Knowledge { document_id: String, title: String },
    /// Built-in heuristic used when no knowledge matched
    Heuristic,
}

/// Part 3 entry: root cause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RootCause {
    pub description: String,
    pub evidence: EvidenceRef,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub source: RootCauseSource,
}

/// Effort estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

/// Action timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    /// Within the next iteration
    ShortTerm,
    /// Within the planning period
    MediumTerm,
    /// Beyond the planning period
    LongTerm,
}

/// Part 4 entry: recommended action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    pub description: String,
    pub owner_role: String,
    pub effort: Effort,
    /// Measurable signal that the action worked
    pub success_signal: String,
}

impl Action {
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        owner_role: impl Into<String>,
        effort: Effort,
        success_signal: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            owner_role: owner_role.into(),
            effort,
            success_signal: success_signal.into(),
        }
    }
}

/// Part 4: actions grouped by timeframe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendedActions {
    pub short_term: Vec<Action>,
    pub medium_term: Vec<Action>,
    pub long_term: Vec<Action>,
}

impl RecommendedActions {
    /// Add action to a timeframe
    pub fn push(&mut self, timeframe: Timeframe, action: Action) {
        match timeframe {
            Timeframe::ShortTerm => self.short_term.push(action),
            Timeframe::MediumTerm => self.medium_term.push(action),
            Timeframe::LongTerm => self.long_term.push(action),
        }
    }

    /// Total number of actions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.short_term.len() + self.medium_term.len() + self.long_term.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All actions with their timeframe, short-term first
    pub fn iter(&self) -> impl Iterator<Item = (Timeframe, &Action)> {
        self.short_term
            .iter()
            .map(|a| (Timeframe::ShortTerm, a))
            .chain(self.medium_term.iter().map(|a| (Timeframe::MediumTerm, a)))
            .chain(self.long_term.iter().map(|a| (Timeframe::LongTerm, a)))
    }
}

/// Leading or lagging indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Leading,
    Lagging,
}

/// Metric to watch after acting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WatchedMetric {
    pub metric: MetricField,
    pub indicator: IndicatorKind,
    pub current: Option<f64>,
    pub target: Option<f64>,
}

/// Part 5: expected outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExpectedOutcomes {
    pub metrics_to_watch: Vec<WatchedMetric>,
    pub timeline: String,
    pub risks: Vec<String>,
}

/// A five-part coaching insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Insight {
    pub id: InsightId,
    pub title: String,
    pub severity: Severity,
    /// Confidence on a 0–100 scale
    pub confidence: u8,
    pub scope: ScopeKind,
    pub scope_id: String,
    pub observation: Observation,
    pub interpretation: Interpretation,
    pub root_causes: Vec<RootCause>,
    pub recommended_actions: RecommendedActions,
    pub expected_outcomes: ExpectedOutcomes,
    /// Snapshot fields and patterns the insight rests on
    pub evidence: Vec<EvidenceRef>,
    /// Priority on a 0–100 scale
    pub priority_score: f64,
    pub category: InsightCategory,
}

impl Insight {
    /// Start building an insight
    #[inline]
    #[must_use]
    pub fn builder(
        category: InsightCategory,
        scope: ScopeKind,
        scope_id: impl Into<String>,
    ) -> InsightBuilder {
        InsightBuilder::new(category, scope, scope_id)
    }

    /// With narrative enrichment appended to the interpretation
    #[must_use]
    pub fn with_enrichment(mut self, prose: impl Into<String>) -> Self {
        let prose = prose.into();
        self.interpretation.enrichment = match self.interpretation.enrichment.take() {
            Some(existing) => Some(format!("{existing}\n\n{prose}")),
            None => Some(prose),
        };
        self
    }

    /// With priority score (clamped to [0, 100])
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, score: f64) -> Self {
        self.priority_score = score.clamp(0.0, 100.0);
        self
    }

    /// Check if any evidence cites a metric or pattern
    #[must_use]
    pub fn has_evidence(&self) -> bool {
        !self.evidence.is_empty()
    }
}

/// Builder enforcing the five-part structure and the evidence invariant
#[derive(Debug, Clone)]
pub struct InsightBuilder {
    category: InsightCategory,
    scope: ScopeKind,
    scope_id: String,
    subject: String,
    title: String,
    severity: Severity,
    confidence: u8,
    observation: Option<Observation>,
    interpretation: Option<Interpretation>,
    root_causes: Vec<RootCause>,
    actions: RecommendedActions,
    outcomes: Option<ExpectedOutcomes>,
    evidence: Vec<EvidenceRef>,
}

impl InsightBuilder {
    /// Create builder
    #[must_use]
    pub fn new(category: InsightCategory, scope: ScopeKind, scope_id: impl Into<String>) -> Self {
        Self {
            category,
            scope,
            scope_id: scope_id.into(),
            subject: String::new(),
            title: String::new(),
            severity: Severity::Info,
            confidence: 50,
            observation: None,
            interpretation: None,
            root_causes: Vec::new(),
            actions: RecommendedActions::default(),
            outcomes: None,
            evidence: Vec::new(),
        }
    }

    /// With subject key (distinguishes insights of one category)
    #[inline]
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// With confidence (capped at 100)
    #[inline]
    #[must_use]
    pub fn confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence.min(100);
        self
    }

    #[inline]
    #[must_use]
    pub fn observation(mut self, observation: Observation) -> Self {
        self.observation = Some(observation);
        self
    }

    #[inline]
    #[must_use]
    pub fn interpretation(mut self, interpretation: Interpretation) -> Self {
        self.interpretation = Some(interpretation);
        self
    }

    #[inline]
    #[must_use]
    pub fn root_cause(mut self, cause: RootCause) -> Self {
        self.root_causes.push(cause);
        self
    }

    #[inline]
    #[must_use]
    pub fn root_causes(mut self, causes: impl IntoIterator<Item = RootCause>) -> Self {
        self.root_causes.extend(causes);
        self
    }

    #[inline]
    #[must_use]
    pub fn action(mut self, timeframe: Timeframe, action: Action) -> Self {
        self.actions.push(timeframe, action);
        self
    }

    #[inline]
    #[must_use]
    pub fn outcomes(mut self, outcomes: ExpectedOutcomes) -> Self {
        self.outcomes = Some(outcomes);
        self
    }

    #[inline]
    #[must_use]
    pub fn evidence(mut self, evidence: EvidenceRef) -> Self {
        self.evidence.push(evidence);
        self
    }

    /// Build the insight
    ///
    /// Root-cause evidence is merged into the evidence list.
    ///
    /// # Errors
    /// Returns error if no evidence is cited or a section is missing
    pub fn build(self) -> Result<Insight, ModelError> {
        let title = self.title;
        let mut evidence = self.evidence;
        for cause in &self.root_causes {
            if !evidence.contains(&cause.evidence) {
                evidence.push(cause.evidence.clone());
            }
        }
        if evidence.is_empty() {
            return Err(ModelError::MissingEvidence { title });
        }

        let observation = self.observation.ok_or_else(|| ModelError::MissingSection {
            title: title.clone(),
            section: "observation",
        })?;
        let interpretation = self
            .interpretation
            .ok_or_else(|| ModelError::MissingSection {
                title: title.clone(),
                section: "interpretation",
            })?;
        if self.root_causes.is_empty() {
            return Err(ModelError::MissingSection {
                title,
                section: "root_causes",
            });
        }
        if self.actions.is_empty() {
            return Err(ModelError::MissingSection {
                title,
                section: "recommended_actions",
            });
        }
        let expected_outcomes = self.outcomes.ok_or_else(|| ModelError::MissingSection {
            title: title.clone(),
            section: "expected_outcomes",
        })?;

        let id = InsightId::derive(&[
            self.scope.as_str(),
            &self.scope_id,
            self.category.as_str(),
            &self.subject,
        ]);

        Ok(Insight {
            id,
            title,
            severity: self.severity,
            confidence: self.confidence,
            scope: self.scope,
            scope_id: self.scope_id,
            observation,
            interpretation,
            root_causes: self.root_causes,
            recommended_actions: self.actions,
            expected_outcomes,
            evidence,
            priority_score: 0.0,
            category: self.category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn observation() -> Observation {
        Observation {
            statement: "Lead time is 50.0 days against a 30.0 day target.".to_string(),
            comparisons: vec![Comparison::new(
                MetricField::AverageLeadTime,
                50.0,
                30.0,
                ReferenceKind::Target,
            )],
            confidence_tier: ConfidenceTier::High,
            sample_size: 42,
        }
    }

    fn complete_builder() -> InsightBuilder {
        Insight::builder(InsightCategory::FlowHealth, ScopeKind::Team, "team-a")
            .title("Flow health")
            .severity(Severity::Warning)
            .confidence(80)
            .observation(observation())
            .interpretation(Interpretation {
                summary: "Work waits more than it moves.".to_string(),
                scope_qualifier: "the team".to_string(),
                enrichment: None,
            })
            .root_cause(RootCause {
                description: "Long waits before review".to_string(),
                evidence: EvidenceRef::metric(MetricField::FlowEfficiency, 31.0),
                confidence: 0.7,
                source: RootCauseSource::Quantitative,
            })
            .action(
                Timeframe::ShortTerm,
                Action::new("Swarm on review", "Team", Effort::Low, "review queue < 3"),
            )
            .outcomes(ExpectedOutcomes {
                metrics_to_watch: vec![],
                timeline: "2 sprints".to_string(),
                risks: vec![],
            })
    }

    #[test]
    fn build_merges_root_cause_evidence() {
        let insight = complete_builder().build().unwrap();
        assert_eq!(
            insight.evidence,
            vec![EvidenceRef::metric(MetricField::FlowEfficiency, 31.0)]
        );
        assert!(insight.has_evidence());
    }

    #[test]
    fn build_without_evidence_fails() {
        let result = Insight::builder(InsightCategory::FlowHealth, ScopeKind::Team, "team-a")
            .title("Empty")
            .build();
        assert!(matches!(result, Err(ModelError::MissingEvidence { .. })));
    }

    #[test]
    fn build_without_actions_fails() {
        let mut builder = complete_builder();
        builder.actions = RecommendedActions::default();
        assert!(matches!(
            builder.build(),
            Err(ModelError::MissingSection {
                section: "recommended_actions",
                ..
            })
        ));
    }

    #[test]
    fn five_part_field_order_is_stable() {
        let insight = complete_builder().build().unwrap();
        let json = serde_json::to_string(&insight).unwrap();
        let order = [
            "\"id\"",
            "\"title\"",
            "\"severity\"",
            "\"confidence\"",
            "\"scope\"",
            "\"scope_id\"",
            "\"observation\"",
            "\"interpretation\"",
            "\"root_causes\"",
            "\"recommended_actions\"",
            "\"expected_outcomes\"",
            "\"evidence\"",
            "\"priority_score\"",
        ];
        // root causes carry their own "evidence" key; the top-level one is last
        let positions: Vec<usize> = order
            .iter()
            .map(|k| {
                if *k == "\"evidence\"" {
                    json.rfind(k).unwrap()
                } else {
                    json.find(k).unwrap()
                }
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn enrichment_appends() {
        let insight = complete_builder()
            .build()
            .unwrap()
            .with_enrichment("first")
            .with_enrichment("second");
        assert_eq!(
            insight.interpretation.enrichment.as_deref(),
            Some("first\n\nsecond")
        );
    }

    #[test]
    fn ids_depend_on_subject() {
        let a = complete_builder().subject("review").build().unwrap();
        let b = complete_builder().subject("testing").build().unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn confidence_tier_from_sample() {
        assert_eq!(ConfidenceTier::from_sample(42, 0.95), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_sample(42, 0.8), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_sample(6, 1.0), ConfidenceTier::Low);
    }

    #[test]
    fn severity_ranking() {
        assert_eq!(Severity::Info.max(Severity::Critical), Severity::Critical);
        assert!(Severity::Critical.score() > Severity::Warning.score());
    }
}
