//! Deterministic scenario modeling enricher
//!
//! Projects throughput ranges for the next window, tabulates stage WIP
//! against limits and shows what Little's Law predicts for lead time when
//! WIP grows with throughput unchanged.

use crate::enrich::{EnrichmentPayload, NarrativeEnricher};
use crate::error::EnrichmentError;
use flowcoach_model::{InsightCategory, MetricsSnapshot};
use std::fmt::Write as _;

/// Built-in enricher producing scenario tables
#[derive(Debug, Clone)]
pub struct ScenarioModeler {
    /// Throughput multipliers (conservative, expected, optimistic)
    throughput_range: (f64, f64, f64),
    /// WIP increases in percent
    wip_increases: Vec<f64>,
}

impl Default for ScenarioModeler {
    fn default() -> Self {
        Self {
            throughput_range: (0.8, 1.0, 1.2),
            wip_increases: vec![10.0, 25.0, 50.0],
        }
    }
}

impl ScenarioModeler {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With WIP increases to model, in percent
    #[inline]
    #[must_use]
    pub fn with_wip_increases(mut self, increases: Vec<f64>) -> Self {
        self.wip_increases = increases;
        self
    }

    /// Completed items expected over the next window of equal length
    #[must_use]
    pub fn throughput_scenarios(&self, snapshot: &MetricsSnapshot) -> (f64, f64, f64) {
        let base = snapshot.throughput_per_day() * snapshot.period_days();
        let (low, mid, high) = self.throughput_range;
        (base * low, base * mid, base * high)
    }

    /// `(WIP increase %, WIP, lead time days)` rows, empty without throughput
    #[must_use]
    pub fn wip_impact(&self, snapshot: &MetricsSnapshot) -> Vec<(f64, f64, f64)> {
        let lambda = snapshot.throughput_per_day();
        if lambda <= 0.0 {
            return Vec::new();
        }
        self.wip_increases
            .iter()
            .map(|pct| {
                let wip = snapshot.predicted_wip() * (1.0 + pct / 100.0);
                (*pct, wip, wip / lambda)
            })
            .collect()
    }

    fn render(&self, snapshot: &MetricsSnapshot, with_stages: bool) -> String {
        let mut out = String::new();
        let (low, mid, high) = self.throughput_scenarios(snapshot);
        let _ = writeln!(
            out,
            "Throughput scenarios for the next {:.0} days: conservative {:.0} items, expected {:.0}, optimistic {:.0}.",
            snapshot.period_days(),
            low,
            mid,
            high
        );

        if with_stages && !snapshot.stages().is_empty() {
            out.push_str("\n| Stage | Mean days | Predicted WIP | WIP limit |\n|---|---|---|---|\n");
            for stage in snapshot.stages() {
                let _ = writeln!(
                    out,
                    "| {} | {:.1} | {:.1} | {} |",
                    stage.stage, stage.mean_days, stage.predicted_wip, stage.recommended_wip_limit
                );
            }
        }

        let rows = self.wip_impact(snapshot);
        if !rows.is_empty() {
            let _ = write!(
                out,
                "\nIf WIP increases while throughput stays at {:.2} items/day:\n\n| WIP change | WIP | Lead time (days) |\n|---|---|---|\n",
                snapshot.throughput_per_day()
            );
            let _ = writeln!(
                out,
                "| current | {:.1} | {:.1} |",
                snapshot.predicted_wip(),
                snapshot.avg_lead_time_days()
            );
            for (pct, wip, lead) in rows {
                let _ = writeln!(out, "| +{pct:.0}% | {wip:.1} | {lead:.1} |");
            }
        }
        out.trim_end().to_string()
    }
}

#[async_trait::async_trait]
impl NarrativeEnricher for ScenarioModeler {
    fn name(&self) -> &str {
        "scenario-modeler"
    }

    async fn enrich(
        &self,
        payload: EnrichmentPayload<'_>,
    ) -> Result<Option<String>, EnrichmentError> {
        let Some(snapshot) = payload.snapshot else {
            return Ok(None);
        };
        Ok(match payload.insight.category {
            InsightCategory::FlowHealth => Some(self.render(snapshot, true)),
            InsightCategory::HighWip | InsightCategory::Capacity => {
                Some(self.render(snapshot, false))
            }
            _ => None,
        })
    }
}
