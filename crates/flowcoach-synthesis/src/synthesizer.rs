//! Insight synthesizer
//!
//! Turns one snapshot, its patterns and the knowledge retrieved for them
//! into prioritized five-part insights: a flow-health overview, one insight
//! per pattern (capped) and a capacity insight when throughput deviates
//! from the baseline.

use crate::config::SynthesisConfig;
use crate::enrich::{apply_enrichment, NarrativeEnricher};
use crate::error::{EnrichmentError, SynthesisError};
use crate::explain;
use crate::overview;
use crate::pattern_insight::pattern_insight;
use crate::priority::{priority_score, sort_insights};
use flowcoach_knowledge::ScoredDocument;
use flowcoach_model::{
    Insight, MetricsSnapshot, Pattern, PatternId, ScopeDescriptor, Severity,
};
use std::collections::BTreeMap;

/// Inputs of one synthesis
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub scope: &'a ScopeDescriptor,
    pub snapshot: &'a MetricsSnapshot,
    /// Overall flow-health tier
    pub flow_health: Severity,
    /// Patterns in detection order
    pub patterns: &'a [Pattern],
    /// Retrieved knowledge by pattern; missing keys count as misses
    pub knowledge: &'a BTreeMap<PatternId, Vec<ScoredDocument>>,
}

/// Result of one synthesis
#[derive(Debug, Clone, Default)]
pub struct SynthesisOutcome {
    /// Insights in descending priority
    pub insights: Vec<Insight>,
    /// Patterns that fell back to heuristic root causes
    pub knowledge_misses: Vec<PatternId>,
    /// Enrichment failures (insights were kept unenhanced)
    pub enrichment_failures: Vec<EnrichmentError>,
    /// Patterns past `max_pattern_insights`, in detection order
    pub omitted_patterns: Vec<PatternId>,
}

struct Drafted<'a> {
    drafts: Vec<Draft<'a>>,
    knowledge_misses: Vec<PatternId>,
    omitted_patterns: Vec<PatternId>,
}

struct Draft<'a> {
    insight: Insight,
    impact: f64,
    pattern: Option<&'a Pattern>,
    knowledge: &'a [ScoredDocument],
}

/// Five-part insight synthesizer
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: SynthesisConfig,
}

impl Synthesizer {
    #[inline]
    #[must_use]
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Synthesize insights without enrichment
    ///
    /// # Errors
    /// Returns error if an insight cannot be assembled
    pub fn synthesize(&self, input: SynthesisInput<'_>) -> Result<SynthesisOutcome, SynthesisError> {
        Ok(self.finish(self.draft(input)?, Vec::new()))
    }

    /// Synthesize insights, enriching each one when an enricher is given
    ///
    /// Enrichment failures are collected in the outcome and never drop an
    /// insight.
    ///
    /// # Errors
    /// Returns error if an insight cannot be assembled
    pub async fn synthesize_with(
        &self,
        input: SynthesisInput<'_>,
        enricher: Option<&dyn NarrativeEnricher>,
    ) -> Result<SynthesisOutcome, SynthesisError> {
        let mut drafted = self.draft(input)?;
        let Some(enricher) = enricher else {
            return Ok(self.finish(drafted, Vec::new()));
        };

        let mut enriched = Vec::with_capacity(drafted.drafts.len());
        let mut failures = Vec::new();
        for draft in std::mem::take(&mut drafted.drafts) {
            let (insight, failure) = apply_enrichment(
                enricher,
                draft.insight,
                Some(input.snapshot),
                draft.pattern,
                draft.knowledge,
            )
            .await;
            failures.extend(failure);
            enriched.push(Draft { insight, ..draft });
        }
        drafted.drafts = enriched;
        Ok(self.finish(drafted, failures))
    }

    /// Explanatory insight for a run without flow data
    ///
    /// # Errors
    /// Returns error if the insight cannot be assembled
    pub fn explain_unavailable(
        &self,
        scope: &ScopeDescriptor,
        reason: &str,
    ) -> Result<Insight, SynthesisError> {
        let insight = explain::data_unavailable(scope, reason)?;
        let score = priority_score(&insight, 0.0, &self.config.priority);
        Ok(insight.with_priority(score))
    }

    /// Explanatory insight for a run with too few completed items
    ///
    /// # Errors
    /// Returns error if the insight cannot be assembled
    pub fn explain_insufficient(
        &self,
        scope: &ScopeDescriptor,
        completed: usize,
        minimum: usize,
        in_flight: usize,
    ) -> Result<Insight, SynthesisError> {
        let insight = explain::insufficient_data(scope, completed, minimum, in_flight)?;
        let score = priority_score(&insight, 0.0, &self.config.priority);
        Ok(insight.with_priority(score))
    }

    fn draft<'a>(&self, input: SynthesisInput<'a>) -> Result<Drafted<'a>, SynthesisError> {
        let mut drafts = Vec::new();
        let mut misses = Vec::new();

        let (insight, impact) = overview::overview(
            input.scope,
            input.snapshot,
            input.flow_health,
            input.patterns,
            &self.config,
        )?;
        drafts.push(Draft {
            insight,
            impact,
            pattern: None,
            knowledge: &[],
        });

        let shown = input.patterns.len().min(self.config.max_pattern_insights);
        let omitted: Vec<PatternId> = input.patterns[shown..]
            .iter()
            .map(|p| p.id.clone())
            .collect();
        if !omitted.is_empty() {
            tracing::info!(
                "Capped pattern insights at {} of {}",
                shown,
                input.patterns.len()
            );
        }
        for pattern in &input.patterns[..shown] {
            let knowledge: &[ScoredDocument] = input
                .knowledge
                .get(&pattern.id)
                .map_or(&[], Vec::as_slice);
            if knowledge.is_empty() {
                misses.push(pattern.id.clone());
            }
            let (insight, impact) =
                pattern_insight(input.scope, input.snapshot, pattern, knowledge, &self.config)?;
            drafts.push(Draft {
                insight,
                impact,
                pattern: Some(pattern),
                knowledge,
            });
        }

        if let Some((insight, impact)) = overview::capacity(input.scope, input.snapshot)? {
            drafts.push(Draft {
                insight,
                impact,
                pattern: None,
                knowledge: &[],
            });
        }

        Ok(Drafted {
            drafts,
            knowledge_misses: misses,
            omitted_patterns: omitted,
        })
    }

    fn finish(
        &self,
        drafted: Drafted<'_>,
        enrichment_failures: Vec<EnrichmentError>,
    ) -> SynthesisOutcome {
        let mut insights: Vec<Insight> = drafted
            .drafts
            .into_iter()
            .map(|draft| {
                let score = priority_score(&draft.insight, draft.impact, &self.config.priority);
                draft.insight.with_priority(score)
            })
            .collect();
        sort_insights(&mut insights);
        tracing::info!("Synthesized {} insight(s)", insights.len());
        SynthesisOutcome {
            insights,
            knowledge_misses: drafted.knowledge_misses,
            enrichment_failures,
            omitted_patterns: drafted.omitted_patterns,
        }
    }
}
