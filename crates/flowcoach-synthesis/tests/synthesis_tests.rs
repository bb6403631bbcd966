use flowcoach_knowledge::{KnowledgeIndex, RetrievalConfig, Retriever, ScoredDocument};
use flowcoach_metrics::MetricsEngine;
use flowcoach_model::{
    InsightCategory, MetricsSnapshot, Pattern, PatternId, PatternKind, PatternSubject,
    RootCauseSource, ScopeDescriptor, ScopeKind, Severity, StageName, WorkItemFlowRecord,
    WorkflowShape,
};
use flowcoach_patterns::{DetectionContext, PatternDetector};
use flowcoach_synthesis::{
    EnrichmentError, EnrichmentPayload, NarrativeEnricher, ScenarioModeler, SynthesisConfig,
    SynthesisInput, SynthesisOutcome, Synthesizer,
};
use flowcoach_test_utils::{completed_stories, open_window, scenario_a, team_scope, today};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

struct Fixture {
    scope: ScopeDescriptor,
    snapshot: MetricsSnapshot,
    flow_health: Severity,
    patterns: Vec<Pattern>,
    knowledge: BTreeMap<PatternId, Vec<ScoredDocument>>,
}

impl Fixture {
    fn new(scope: ScopeDescriptor, records: &[WorkItemFlowRecord]) -> Self {
        let snapshot = MetricsEngine::default()
            .compute(&scope, records, &[])
            .unwrap();
        let detector = PatternDetector::default();
        let flow_health = detector.flow_health(&snapshot);
        let patterns = detector.detect(&snapshot, records, &DetectionContext::new(&scope, today()));
        let retriever = Retriever::new(KnowledgeIndex::builtin().unwrap(), RetrievalConfig::default());
        let knowledge = retriever.retrieve_for_patterns(&patterns, scope.kind.level());
        Self {
            scope,
            snapshot,
            flow_health,
            patterns,
            knowledge,
        }
    }

    /// Ten completed stories of 40 days; two bottleneck stages
    fn bottlenecked() -> Self {
        let scope = ScopeDescriptor::new(ScopeKind::Team, "team-alpha", open_window(30))
            .with_workflow(WorkflowShape::Story);
        Self::new(scope, &completed_stories(10, 40.0))
    }

    fn input(&self) -> SynthesisInput<'_> {
        SynthesisInput {
            scope: &self.scope,
            snapshot: &self.snapshot,
            flow_health: self.flow_health,
            patterns: &self.patterns,
            knowledge: &self.knowledge,
        }
    }
}

fn synthesize(fixture: &Fixture) -> SynthesisOutcome {
    Synthesizer::default().synthesize(fixture.input()).unwrap()
}

#[test]
fn test_every_insight_has_five_parts_and_evidence() {
    let fixture = Fixture::bottlenecked();
    let outcome = synthesize(&fixture);

    assert!(outcome.insights.len() >= 3);
    for insight in &outcome.insights {
        assert!(insight.has_evidence(), "{} has no evidence", insight.title);
        assert!(!insight.observation.statement.is_empty());
        assert!(!insight.interpretation.summary.is_empty());
        assert!(!insight.root_causes.is_empty());
        assert!(!insight.recommended_actions.is_empty());
        assert!(!insight.expected_outcomes.metrics_to_watch.is_empty());
        assert!((0.0..=100.0).contains(&insight.priority_score));
    }
    assert_eq!(
        outcome
            .insights
            .iter()
            .filter(|i| i.category == InsightCategory::FlowHealth)
            .count(),
        1
    );
}

#[test]
fn test_insights_sorted_by_priority() {
    let outcome = synthesize(&Fixture::bottlenecked());
    for pair in outcome.insights.windows(2) {
        assert!(pair[0].priority_score >= pair[1].priority_score);
    }
}

#[test]
fn test_bottleneck_cites_knowledge() {
    let fixture = Fixture::bottlenecked();
    let outcome = synthesize(&fixture);

    let bottleneck = outcome
        .insights
        .iter()
        .find(|i| i.category == InsightCategory::Bottleneck)
        .unwrap();
    let cited: Vec<&str> = bottleneck
        .root_causes
        .iter()
        .filter_map(|c| match &c.source {
            RootCauseSource::Knowledge { document_id, .. } => Some(document_id.as_str()),
            _ => None,
        })
        .collect();
    assert!(cited.contains(&"kb-bottleneck-review-queue"));
    assert!(cited.len() <= 2);
}

#[test]
fn test_knowledge_miss_falls_back_to_heuristics() {
    let mut fixture = Fixture::bottlenecked();
    fixture.knowledge.clear();
    let outcome = synthesize(&fixture);

    assert_eq!(outcome.knowledge_misses.len(), fixture.patterns.len());
    let pattern_insights: Vec<_> = outcome
        .insights
        .iter()
        .filter(|i| !matches!(i.category, InsightCategory::FlowHealth | InsightCategory::Capacity))
        .collect();
    assert!(!pattern_insights.is_empty());
    for insight in pattern_insights {
        assert!(insight
            .root_causes
            .iter()
            .any(|c| c.source == RootCauseSource::Heuristic));
        assert!(!insight
            .root_causes
            .iter()
            .any(|c| matches!(c.source, RootCauseSource::Knowledge { .. })));
    }
}

#[test]
fn test_pattern_insights_are_capped() {
    let mut fixture = Fixture::bottlenecked();
    fixture.patterns = (0..8)
        .map(|i| {
            Pattern::new(
                "team-alpha",
                PatternKind::HighWip,
                Severity::Warning,
                PatternSubject::Stage {
                    stage: StageName::new(format!("stage-{i}")),
                },
                format!("stage-{i} holds too much work"),
            )
            .with_impact(0.3)
        })
        .collect();
    fixture.knowledge.clear();

    let outcome = synthesize(&fixture);
    let high_wip = outcome
        .insights
        .iter()
        .filter(|i| i.category == InsightCategory::HighWip)
        .count();
    assert_eq!(high_wip, 6);
    assert_eq!(outcome.knowledge_misses.len(), 6);
    assert!(outcome.omitted_patterns.is_empty());

    let narrow = Synthesizer::new(SynthesisConfig::new().with_max_pattern_insights(2))
        .synthesize(fixture.input())
        .unwrap();
    assert_eq!(
        narrow
            .insights
            .iter()
            .filter(|i| i.category == InsightCategory::HighWip)
            .count(),
        2
    );
    let expected: Vec<_> = fixture.patterns[2..].iter().map(|p| p.id.clone()).collect();
    assert_eq!(narrow.omitted_patterns, expected);
}

#[test]
fn test_synthesis_is_idempotent() {
    let fixture = Fixture::bottlenecked();
    let first = synthesize(&fixture);
    let second = synthesize(&fixture);

    let ids = |o: &SynthesisOutcome| o.insights.iter().map(|i| i.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.insights, second.insights);
}

#[test]
fn test_explanatory_insights() {
    let synthesizer = Synthesizer::default();
    let scope = team_scope(30);

    let unavailable = synthesizer
        .explain_unavailable(&scope, "provider timed out after 10000 ms")
        .unwrap();
    assert_eq!(unavailable.category, InsightCategory::DataUnavailable);
    assert!(unavailable.has_evidence());
    assert!(unavailable.observation.statement.contains("provider timed out"));
    assert!(unavailable.priority_score > 0.0);

    let insufficient = synthesizer.explain_insufficient(&scope, 3, 5, 2).unwrap();
    assert_eq!(insufficient.category, InsightCategory::InsufficientData);
    assert_eq!(insufficient.observation.sample_size, 3);
    assert!(insufficient.observation.statement.contains("at least 5"));
    assert_ne!(unavailable.id, insufficient.id);
}

struct Failing;

#[async_trait::async_trait]
impl NarrativeEnricher for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn enrich(
        &self,
        _payload: EnrichmentPayload<'_>,
    ) -> Result<Option<String>, EnrichmentError> {
        Err(EnrichmentError::unavailable("failing", "connection refused"))
    }
}

struct Fixed(&'static str);

#[async_trait::async_trait]
impl NarrativeEnricher for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn enrich(
        &self,
        _payload: EnrichmentPayload<'_>,
    ) -> Result<Option<String>, EnrichmentError> {
        Ok(Some(self.0.to_string()))
    }
}

#[tokio::test]
async fn test_failing_enricher_keeps_insights() {
    let fixture = Fixture::bottlenecked();
    let plain = synthesize(&fixture);
    let outcome = Synthesizer::default()
        .synthesize_with(fixture.input(), Some(&Failing))
        .await
        .unwrap();

    assert_eq!(outcome.insights, plain.insights);
    assert_eq!(outcome.enrichment_failures.len(), outcome.insights.len());
    assert!(matches!(
        outcome.enrichment_failures[0],
        EnrichmentError::Unavailable { .. }
    ));
}

#[tokio::test]
async fn test_person_attribution_is_dropped() {
    let fixture = Fixture::bottlenecked();
    let outcome = Synthesizer::default()
        .synthesize_with(fixture.input(), Some(&Fixed("Delays are because of Dana in review.")))
        .await
        .unwrap();

    assert!(outcome
        .insights
        .iter()
        .all(|i| i.interpretation.enrichment.is_none()));
    assert!(outcome
        .enrichment_failures
        .iter()
        .all(|e| matches!(e, EnrichmentError::PersonAttribution { .. })));
    assert!(!outcome.enrichment_failures.is_empty());
}

#[tokio::test]
async fn test_enrichment_is_appended() {
    let fixture = Fixture::bottlenecked();
    let outcome = Synthesizer::default()
        .synthesize_with(fixture.input(), Some(&Fixed("Queues dominate this workflow.")))
        .await
        .unwrap();

    assert!(outcome.enrichment_failures.is_empty());
    for insight in &outcome.insights {
        assert_eq!(
            insight.interpretation.enrichment.as_deref(),
            Some("Queues dominate this workflow.")
        );
    }
}

#[tokio::test]
async fn test_scenario_modeler_enriches_overview() {
    let (scope, records) = scenario_a();
    let fixture = Fixture::new(scope, &records);
    let outcome = Synthesizer::default()
        .synthesize_with(fixture.input(), Some(&ScenarioModeler::new()))
        .await
        .unwrap();

    let overview = outcome
        .insights
        .iter()
        .find(|i| i.category == InsightCategory::FlowHealth)
        .unwrap();
    let prose = overview.interpretation.enrichment.as_deref().unwrap();
    assert!(prose.contains("expected 42,"));
    assert!(prose.contains("| Stage |"));
}
