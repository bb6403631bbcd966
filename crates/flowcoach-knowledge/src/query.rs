//! Retrieval queries

use flowcoach_model::{Pattern, ScopeLevel};

/// What retrieval looks for
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeQuery {
    /// Symptom tag (pattern kind or `flow-health` / `capacity`)
    pub symptom: String,
    pub level: ScopeLevel,
    /// Metric field names behind the symptom
    pub metrics: Vec<String>,
    /// Free text matched semantically
    pub text: String,
}

impl KnowledgeQuery {
    #[must_use]
    pub fn new(symptom: impl Into<String>, level: ScopeLevel) -> Self {
        Self {
            symptom: symptom.into(),
            level,
            metrics: Vec::new(),
            text: String::new(),
        }
    }

    /// Query describing a detected pattern
    #[must_use]
    pub fn from_pattern(pattern: &Pattern, level: ScopeLevel) -> Self {
        Self {
            symptom: pattern.kind.symptom_tag().to_string(),
            level,
            metrics: pattern
                .metric_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            text: format!(
                "{} in {}. {}",
                pattern.kind.label(),
                pattern.subject.describe(),
                pattern.description
            ),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcoach_model::{EvidenceRef, MetricField, PatternKind, PatternSubject, Severity, StageName};

    #[test]
    fn query_from_pattern() {
        let pattern = Pattern::new(
            "team-alpha",
            PatternKind::Bottleneck,
            Severity::Warning,
            PatternSubject::Stage {
                stage: StageName::new("code-review"),
            },
            "Items spend 9.0 days in code-review.",
        )
        .with_evidence(EvidenceRef::stage_metric(
            MetricField::StageMeanDays,
            "code-review",
            9.0,
        ));

        let query = KnowledgeQuery::from_pattern(&pattern, ScopeLevel::Team);
        assert_eq!(query.symptom, "bottleneck");
        assert_eq!(query.metrics, vec!["stage_mean_days".to_string()]);
        assert!(query.text.contains("code-review"));
    }
}
