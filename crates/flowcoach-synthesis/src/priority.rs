//! Insight prioritization
//!
//! priority = w_s × severity + w_u × urgency + w_c × confidence + w_i × impact,
//! every term on a 0–100 scale.

use crate::config::PriorityWeights;
use crate::heuristics::urgency;
use flowcoach_model::Insight;

/// Priority of an insight given its impact (0–100)
#[must_use]
pub fn priority_score(insight: &Insight, impact: f64, weights: &PriorityWeights) -> f64 {
    let score = weights.severity * insight.severity.score()
        + weights.urgency * urgency(insight.category)
        + weights.confidence * f64::from(insight.confidence)
        + weights.impact * impact.clamp(0.0, 100.0);
    score.clamp(0.0, 100.0)
}

/// Descending priority, ties by id
pub fn sort_insights(insights: &mut [Insight]) {
    insights.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then_with(|| a.id.cmp(&b.id))
    });
}
