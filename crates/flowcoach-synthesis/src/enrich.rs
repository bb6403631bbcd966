//! Optional narrative enrichment
//!
//! An enricher receives the full insight payload and returns prose that is
//! appended to the interpretation. Its absence or failure never prevents an
//! insight from being produced.

use crate::error::EnrichmentError;
use crate::screen::screen;
use flowcoach_knowledge::ScoredDocument;
use flowcoach_model::{Insight, MetricsSnapshot, Pattern};

/// Everything an enricher may read about one insight
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentPayload<'a> {
    pub insight: &'a Insight,
    /// Snapshot, absent for data-unavailable insights
    pub snapshot: Option<&'a MetricsSnapshot>,
    /// Pattern the insight is about, if any
    pub pattern: Option<&'a Pattern>,
    /// Knowledge retrieved for the pattern
    pub knowledge: &'a [ScoredDocument],
}

/// Narrative enricher
#[async_trait::async_trait]
pub trait NarrativeEnricher: Send + Sync {
    /// Name used in logs and failure records
    fn name(&self) -> &str;

    /// Produce prose for one insight; `Ok(None)` means nothing to add
    async fn enrich(
        &self,
        payload: EnrichmentPayload<'_>,
    ) -> Result<Option<String>, EnrichmentError>;
}

/// Run an enricher and apply its screened prose
///
/// Returns the insight unchanged together with the failure when the
/// enricher fails or its prose attributes work to a person.
pub async fn apply_enrichment(
    enricher: &dyn NarrativeEnricher,
    insight: Insight,
    snapshot: Option<&MetricsSnapshot>,
    pattern: Option<&Pattern>,
    knowledge: &[ScoredDocument],
) -> (Insight, Option<EnrichmentError>) {
    let payload = EnrichmentPayload {
        insight: &insight,
        snapshot,
        pattern,
        knowledge,
    };
    let prose = match enricher.enrich(payload).await {
        Ok(Some(prose)) => prose,
        Ok(None) => return (insight, None),
        Err(e) => {
            tracing::warn!("Enrichment skipped for {}: {}", insight.id, e);
            return (insight, Some(e));
        }
    };

    match screen(&prose) {
        Some(clean) => {
            let clean = clean.to_string();
            (insight.with_enrichment(clean), None)
        }
        None if prose.trim().is_empty() => (insight, None),
        None => {
            tracing::warn!(
                "Dropped enrichment from '{}' for {}: person attribution",
                enricher.name(),
                insight.id
            );
            (
                insight,
                Some(EnrichmentError::PersonAttribution {
                    name: enricher.name().to_string(),
                }),
            )
        }
    }
}
