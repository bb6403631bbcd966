//! Candidate scorers
//!
//! Retrieval combines two independent scorers. Both return a value in
//! [0, 1] and can be replaced or mocked.

use crate::document::KnowledgeDocument;
use crate::query::KnowledgeQuery;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]+").expect("static regex"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "each", "for", "from", "has", "have",
        "in", "into", "is", "it", "its", "of", "on", "or", "so", "that", "the", "their", "them",
        "then", "there", "these", "they", "this", "to", "up", "was", "were", "when", "which",
        "while", "with", "without", "than", "not", "no", "more", "most", "all", "one", "what",
    ]
    .into_iter()
    .collect()
});

/// Scores exact tag and metric matches
#[cfg_attr(test, mockall::automock)]
pub trait KeywordScorer: Send + Sync {
    fn score(&self, query: &KnowledgeQuery, document: &KnowledgeDocument) -> f64;
}

/// Scores textual similarity
#[cfg_attr(test, mockall::automock)]
pub trait SemanticScorer: Send + Sync {
    fn score(&self, query: &KnowledgeQuery, document: &KnowledgeDocument) -> f64;
}

/// Symptom match plus related-metric overlap
#[derive(Debug, Clone, Copy)]
pub struct TagScorer {
    /// Share of the score given by a symptom match
    pub symptom_share: f64,
}

impl Default for TagScorer {
    fn default() -> Self {
        Self { symptom_share: 0.6 }
    }
}

impl KeywordScorer for TagScorer {
    fn score(&self, query: &KnowledgeQuery, document: &KnowledgeDocument) -> f64 {
        let symptom = if document.symptom.eq_ignore_ascii_case(&query.symptom) {
            1.0
        } else {
            0.0
        };
        let overlap = if query.metrics.is_empty() {
            0.0
        } else {
            let hits = query
                .metrics
                .iter()
                .filter(|m| document.mentions_metric(m))
                .count();
            hits as f64 / query.metrics.len() as f64
        };
        (self.symptom_share * symptom + (1.0 - self.symptom_share) * overlap).clamp(0.0, 1.0)
    }
}

/// Cosine similarity of term-frequency vectors
#[derive(Debug, Clone, Copy, Default)]
pub struct TermFrequencyScorer;

impl SemanticScorer for TermFrequencyScorer {
    fn score(&self, query: &KnowledgeQuery, document: &KnowledgeDocument) -> f64 {
        let query_terms = term_frequencies(&format!(
            "{} {} {}",
            query.symptom,
            query.metrics.join(" "),
            query.text
        ));
        let doc_terms = term_frequencies(&format!(
            "{} {} {} {}",
            document.title,
            document.symptom,
            document.metrics.join(" "),
            document.body
        ));
        cosine(&query_terms, &doc_terms)
    }
}

/// Lowercased tokens without stopwords
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| t.len() > 1 && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Term counts of a text
#[must_use]
pub fn term_frequencies(text: &str) -> BTreeMap<String, f64> {
    let mut counts = BTreeMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity; 0 when either vector is empty
#[must_use]
pub fn cosine(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Applicability, DocumentId};
    use flowcoach_model::{ConfidenceTier, ScopeLevel};

    fn doc(symptom: &str, metrics: &[&str], body: &str) -> KnowledgeDocument {
        KnowledgeDocument {
            id: DocumentId::new("d"),
            title: "Doc".to_string(),
            scopes: vec![Applicability::Any],
            symptom: symptom.to_string(),
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            confidence: ConfidenceTier::High,
            owner_role: None,
            body: body.to_string(),
            root_causes: Vec::new(),
            practices: Vec::new(),
        }
    }

    #[test]
    fn tokenizer_drops_stopwords_and_punctuation() {
        assert_eq!(
            tokenize("The code-review queue, and WIP!"),
            vec!["code", "review", "queue", "wip"]
        );
    }

    #[test]
    fn tag_score_combines_symptom_and_overlap() {
        let query = KnowledgeQuery::new("bottleneck", ScopeLevel::Team)
            .with_metrics(["stage_mean_days", "stage_p85_days"]);
        let full = doc("bottleneck", &["stage_mean_days", "stage_p85_days"], "");
        let half = doc("bottleneck", &["stage_mean_days"], "");
        let other = doc("high-wip", &[], "");

        let scorer = TagScorer::default();
        assert!((scorer.score(&query, &full) - 1.0).abs() < 1e-9);
        assert!((scorer.score(&query, &half) - 0.8).abs() < 1e-9);
        assert_eq!(scorer.score(&query, &other), 0.0);
    }

    #[test]
    fn cosine_bounds() {
        let a = term_frequencies("review queue");
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-9);
        assert_eq!(cosine(&a, &term_frequencies("deployment")), 0.0);
        assert_eq!(cosine(&a, &BTreeMap::new()), 0.0);
    }

    #[test]
    fn semantic_prefers_related_text() {
        let query = KnowledgeQuery::new("bottleneck", ScopeLevel::Team)
            .with_text("items wait in the review queue");
        let related = doc("bottleneck", &[], "review queue wait items");
        let unrelated = doc("capacity", &[], "overtime budget");
        let scorer = TermFrequencyScorer;
        assert!(scorer.score(&query, &related) > scorer.score(&query, &unrelated));
    }
}
