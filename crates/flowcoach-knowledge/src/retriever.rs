//! Hybrid retrieval
//!
//! Metadata filter first (scope level, confidence floor), then a weighted
//! sum of the keyword and semantic scorers. Candidates are scored in
//! parallel and ranked by score, ties broken by document id.

use crate::document::KnowledgeDocument;
use crate::error::KnowledgeError;
use crate::index::KnowledgeIndex;
use crate::query::KnowledgeQuery;
use crate::scoring::{KeywordScorer, SemanticScorer, TagScorer, TermFrequencyScorer};
use flowcoach_model::{ConfidenceTier, Pattern, PatternId, ScopeLevel};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Retrieval tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum matches per query
    pub top_k: usize,
    /// Minimum combined score
    pub min_score: f64,
    pub keyword_weight: f64,
    pub semantic_weight: f64,
    /// Lowest confidence tier admitted
    pub min_confidence: ConfidenceTier,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 0.15,
            keyword_weight: 0.6,
            semantic_weight: 0.4,
            min_confidence: ConfidenceTier::Medium,
        }
    }
}

impl RetrievalConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_weights(mut self, keyword: f64, semantic: f64) -> Self {
        self.keyword_weight = keyword;
        self.semantic_weight = semantic;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_min_confidence(mut self, tier: ConfidenceTier) -> Self {
        self.min_confidence = tier;
        self
    }

    /// Validate ranges
    ///
    /// # Errors
    /// Returns error if a weight or the minimum score leaves [0, 1], both
    /// weights are zero, or `top_k` is zero
    pub fn validate(&self) -> Result<(), KnowledgeError> {
        for (name, value) in [
            ("keyword_weight", self.keyword_weight),
            ("semantic_weight", self.semantic_weight),
            ("min_score", self.min_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(KnowledgeError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.keyword_weight + self.semantic_weight <= 0.0 {
            return Err(KnowledgeError::InvalidConfig(
                "at least one scorer weight must be positive".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(KnowledgeError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A retrieved document with its scores
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Arc<KnowledgeDocument>,
    /// Weighted combination
    pub score: f64,
    pub keyword_score: f64,
    pub semantic_score: f64,
}

/// Hybrid retriever over a shared index
#[derive(Clone)]
pub struct Retriever {
    index: KnowledgeIndex,
    keyword: Arc<dyn KeywordScorer>,
    semantic: Arc<dyn SemanticScorer>,
    config: RetrievalConfig,
}

impl fmt::Debug for Retriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriever")
            .field("documents", &self.index.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    /// Create retriever with the default scorers
    #[must_use]
    pub fn new(index: KnowledgeIndex, config: RetrievalConfig) -> Self {
        Self {
            index,
            keyword: Arc::new(TagScorer::default()),
            semantic: Arc::new(TermFrequencyScorer),
            config,
        }
    }

    /// Replace both scorers
    #[must_use]
    pub fn with_scorers(
        mut self,
        keyword: Arc<dyn KeywordScorer>,
        semantic: Arc<dyn SemanticScorer>,
    ) -> Self {
        self.keyword = keyword;
        self.semantic = semantic;
        self
    }

    #[inline]
    #[must_use]
    pub fn index(&self) -> &KnowledgeIndex {
        &self.index
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Top-K documents for a query; empty on a miss
    #[must_use]
    pub fn retrieve(&self, query: &KnowledgeQuery) -> Vec<ScoredDocument> {
        let candidates: Vec<&Arc<KnowledgeDocument>> = self
            .index
            .iter()
            .filter(|doc| doc.applies_to(query.level))
            .filter(|doc| doc.confidence >= self.config.min_confidence)
            .collect();

        let mut scored: Vec<ScoredDocument> = candidates
            .par_iter()
            .map(|doc| {
                let keyword_score = self.keyword.score(query, doc).clamp(0.0, 1.0);
                let semantic_score = self.semantic.score(query, doc).clamp(0.0, 1.0);
                ScoredDocument {
                    document: Arc::clone(*doc),
                    score: self.config.keyword_weight * keyword_score
                        + self.config.semantic_weight * semantic_score,
                    keyword_score,
                    semantic_score,
                }
            })
            .filter(|s| s.score >= self.config.min_score)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        scored.truncate(self.config.top_k);

        tracing::debug!(
            "Query '{}' at {} level: {} candidate(s), {} match(es)",
            query.symptom,
            query.level.as_str(),
            candidates.len(),
            scored.len()
        );
        scored
    }

    /// Matches for every pattern, keyed by pattern id
    ///
    /// Patterns without matches map to an empty list.
    #[must_use]
    pub fn retrieve_for_patterns(
        &self,
        patterns: &[Pattern],
        level: ScopeLevel,
    ) -> BTreeMap<PatternId, Vec<ScoredDocument>> {
        patterns
            .iter()
            .map(|pattern| {
                let query = KnowledgeQuery::from_pattern(pattern, level);
                (pattern.id.clone(), self.retrieve(&query))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Applicability, DocumentId};
    use crate::scoring::{MockKeywordScorer, MockSemanticScorer};

    fn doc(id: &str, scopes: Vec<Applicability>, tier: ConfidenceTier) -> KnowledgeDocument {
        KnowledgeDocument {
            id: DocumentId::new(id),
            title: id.to_string(),
            scopes,
            symptom: "bottleneck".to_string(),
            metrics: Vec::new(),
            confidence: tier,
            owner_role: None,
            body: String::new(),
            root_causes: Vec::new(),
            practices: Vec::new(),
        }
    }

    fn index() -> KnowledgeIndex {
        KnowledgeIndex::from_documents(vec![
            doc("b", vec![Applicability::Team], ConfidenceTier::High),
            doc("a", vec![Applicability::Any], ConfidenceTier::Medium),
            doc("c", vec![Applicability::Program], ConfidenceTier::High),
            doc("d", vec![Applicability::Team], ConfidenceTier::Low),
        ])
        .unwrap()
    }

    fn constant(keyword: f64, semantic: f64) -> (MockKeywordScorer, MockSemanticScorer) {
        let mut k = MockKeywordScorer::new();
        k.expect_score().returning(move |_, _| keyword);
        let mut s = MockSemanticScorer::new();
        s.expect_score().returning(move |_, _| semantic);
        (k, s)
    }

    #[test]
    fn filters_scope_and_confidence_then_breaks_ties_by_id() {
        let (k, s) = constant(0.5, 0.5);
        let retriever = Retriever::new(index(), RetrievalConfig::default())
            .with_scorers(Arc::new(k), Arc::new(s));

        let hits = retriever.retrieve(&KnowledgeQuery::new("bottleneck", ScopeLevel::Team));
        let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!((hits[0].score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn below_minimum_is_a_miss() {
        let (k, s) = constant(0.1, 0.1);
        let retriever = Retriever::new(index(), RetrievalConfig::default())
            .with_scorers(Arc::new(k), Arc::new(s));
        assert!(retriever
            .retrieve(&KnowledgeQuery::new("bottleneck", ScopeLevel::Team))
            .is_empty());
    }

    #[test]
    fn weights_applied() {
        let (k, s) = constant(1.0, 0.0);
        let retriever = Retriever::new(index(), RetrievalConfig::default())
            .with_scorers(Arc::new(k), Arc::new(s));
        let hits = retriever.retrieve(&KnowledgeQuery::new("x", ScopeLevel::Program));
        assert!(hits.iter().all(|h| (h.score - 0.6).abs() < 1e-9));
    }

    #[test]
    fn top_k_truncates() {
        let (k, s) = constant(1.0, 1.0);
        let retriever = Retriever::new(index(), RetrievalConfig::new().with_top_k(1))
            .with_scorers(Arc::new(k), Arc::new(s));
        assert_eq!(
            retriever
                .retrieve(&KnowledgeQuery::new("x", ScopeLevel::Team))
                .len(),
            1
        );
    }

    #[test]
    fn low_confidence_admitted_when_floor_lowered() {
        let (k, s) = constant(1.0, 1.0);
        let retriever = Retriever::new(
            index(),
            RetrievalConfig::new().with_min_confidence(ConfidenceTier::Low),
        )
        .with_scorers(Arc::new(k), Arc::new(s));
        let hits = retriever.retrieve(&KnowledgeQuery::new("x", ScopeLevel::Team));
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn config_validation() {
        assert!(RetrievalConfig::default().validate().is_ok());
        assert!(RetrievalConfig::new().with_weights(0.0, 0.0).validate().is_err());
        assert!(RetrievalConfig::new().with_min_score(1.5).validate().is_err());
        assert!(RetrievalConfig::new().with_top_k(0).validate().is_err());
    }
}
