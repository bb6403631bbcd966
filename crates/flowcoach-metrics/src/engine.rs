//! Metrics computation engine
//!
//! Turns the records of one scope and window into a [`MetricsSnapshot`]:
//!
//! - λ = completed items / period days
//! - W = mean lead time of completed items
//! - L = λ × W (derived by the snapshot itself)
//! - flow efficiency = Σ active-stage days / Σ lead time × 100
//! - per-stage time statistics, predicted WIP and recommended WIP limit
//! - comparison with the historical baseline

use crate::baseline::compute_baseline;
use crate::config::MetricsConfig;
use crate::error::MetricsError;
use crate::stats::Summary;
use flowcoach_model::{
    GuardNote, LeadTimeDistribution, MetricField, MetricsSnapshot, PeriodSummary,
    ScopeDescriptor, ScopeKind, SnapshotParts, StageMetrics, StageName, WorkItemFlowRecord,
    WorkflowShape,
};
use rayon::prelude::*;

/// Identity and window of one computation
#[derive(Debug, Clone)]
pub struct MetricsRequest<'a> {
    pub scope: ScopeKind,
    pub scope_id: &'a str,
    pub workflow: WorkflowShape,
    pub period_days: f64,
}

impl<'a> MetricsRequest<'a> {
    /// Request matching a scope descriptor
    #[must_use]
    pub fn for_scope(scope: &'a ScopeDescriptor) -> Self {
        Self {
            scope: scope.kind,
            scope_id: &scope.scope_id,
            workflow: scope.workflow,
            period_days: scope.window.period_days(),
        }
    }

    /// With workflow shape
    #[inline]
    #[must_use]
    pub fn with_workflow(mut self, workflow: WorkflowShape) -> Self {
        self.workflow = workflow;
        self
    }
}

/// Flow metrics engine
///
/// Stateless apart from its configuration; one engine can serve any number
/// of concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    config: MetricsConfig,
}

impl MetricsEngine {
    /// Create engine
    #[inline]
    #[must_use]
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Compute snapshot for a scope descriptor
    ///
    /// The workflow shape analyzed is chosen by [`Self::workflow_for`].
    ///
    /// # Errors
    /// Returns [`MetricsError::InsufficientData`] or [`MetricsError::EmptyWindow`]
    /// if the data cannot support a snapshot
    pub fn compute(
        &self,
        scope: &ScopeDescriptor,
        records: &[WorkItemFlowRecord],
        history: &[PeriodSummary],
    ) -> Result<MetricsSnapshot, MetricsError> {
        let workflow = self.workflow_for(scope, records);
        let request = MetricsRequest::for_scope(scope).with_workflow(workflow);
        self.compute_request(&request, records, history)
    }

    /// Workflow shape to analyze for a scope
    ///
    /// The descriptor's shape wins whenever it has enough completed items;
    /// otherwise the shape with the most completed items is used.
    #[must_use]
    pub fn workflow_for(
        &self,
        scope: &ScopeDescriptor,
        records: &[WorkItemFlowRecord],
    ) -> WorkflowShape {
        let declared = records
            .iter()
            .filter(|r| r.workflow() == scope.workflow && r.is_completed())
            .count();
        if declared >= self.config.min_completed {
            scope.workflow
        } else {
            dominant_workflow(records, scope.workflow)
        }
    }

    /// Compute snapshot for an explicit request
    ///
    /// Records following a different workflow shape are ignored.
    ///
    /// # Errors
    /// Returns [`MetricsError::InsufficientData`] or [`MetricsError::EmptyWindow`]
    /// if the data cannot support a snapshot
    pub fn compute_request(
        &self,
        request: &MetricsRequest<'_>,
        records: &[WorkItemFlowRecord],
        history: &[PeriodSummary],
    ) -> Result<MetricsSnapshot, MetricsError> {
        if request.period_days <= 0.0 {
            tracing::warn!("Empty analysis window for {}", request.scope_id);
            return Err(MetricsError::EmptyWindow);
        }

        let relevant: Vec<&WorkItemFlowRecord> = records
            .iter()
            .filter(|r| r.workflow() == request.workflow)
            .collect();
        let completed: Vec<&WorkItemFlowRecord> =
            relevant.iter().copied().filter(|r| r.is_completed()).collect();
        if completed.len() < self.config.min_completed {
            tracing::info!(
                "Insufficient data for {}: {} completed items",
                request.scope_id,
                completed.len()
            );
            return Err(MetricsError::InsufficientData {
                completed: completed.len(),
                minimum: self.config.min_completed,
            });
        }

        let mut guard_notes = Vec::new();

        let throughput_per_day = completed.len() as f64 / request.period_days;
        let lead_times: Vec<f64> = completed.iter().map(|r| r.total_leadtime()).collect();
        let lead = Summary::of(&lead_times);
        let avg_lead_time_days = lead.mean;

        let active = self.config.active_stages(request.workflow);
        let total_lead: f64 = lead_times.iter().sum();
        let total_active: f64 = completed.iter().map(|r| r.active_days(&active)).sum();
        let flow_efficiency_pct = if total_lead > 0.0 {
            total_active / total_lead * 100.0
        } else {
            guard_notes.push(GuardNote {
                field: MetricField::FlowEfficiency,
                reason: "completed items report no lead time".to_string(),
            });
            0.0
        };

        let stages = self.stage_metrics(request.workflow, &completed, throughput_per_day, &active);

        let baseline = match compute_baseline(
            history,
            completed.len() as f64,
            avg_lead_time_days,
            &self.config,
        ) {
            Ok(baseline) => Some(baseline),
            Err(note) => {
                if !history.is_empty() {
                    tracing::warn!("Baseline unavailable for {}: {}", request.scope_id, note.reason);
                }
                guard_notes.push(note);
                None
            }
        };

        let data_completeness = if relevant.is_empty() {
            0.0
        } else {
            relevant.iter().filter(|r| r.is_complete_data()).count() as f64 / relevant.len() as f64
        };

        let snapshot = MetricsSnapshot::from_parts(SnapshotParts {
            scope: request.scope,
            scope_id: request.scope_id.to_string(),
            workflow: request.workflow,
            period_days: request.period_days,
            total_count: relevant.len(),
            completed_count: completed.len(),
            in_flight_count: relevant.iter().filter(|r| r.is_in_flight()).count(),
            throughput_per_day,
            avg_lead_time_days,
            flow_efficiency_pct,
            lead_time: LeadTimeDistribution {
                median_days: lead.median,
                p85_days: lead.p85,
                p95_days: lead.p95,
                std_dev_days: lead.std_dev,
                coefficient_of_variation: lead.coefficient_of_variation(),
            },
            stages,
            baseline,
            data_completeness,
            guard_notes,
        });

        tracing::info!(
            "Computed metrics for {} {}: λ={:.3}/day W={:.1}d L={:.1} FE={:.1}%",
            request.scope,
            request.scope_id,
            snapshot.throughput_per_day(),
            snapshot.avg_lead_time_days(),
            snapshot.predicted_wip(),
            snapshot.flow_efficiency_display()
        );
        Ok(snapshot)
    }

    /// Per-stage statistics in workflow order
    ///
    /// Stages are summarized in parallel; stages with no recorded
    /// durations are omitted.
    fn stage_metrics(
        &self,
        workflow: WorkflowShape,
        completed: &[&WorkItemFlowRecord],
        throughput_per_day: f64,
        active: &[StageName],
    ) -> Vec<StageMetrics> {
        let buffer = self.config.wip_buffer;
        workflow
            .stages()
            .par_iter()
            .filter_map(|name| {
                let stage = StageName::new(name);
                let days: Vec<f64> = completed.iter().filter_map(|r| r.stage_days(&stage)).collect();
                if days.is_empty() {
                    return None;
                }
                let summary = Summary::of(&days);
                let predicted_wip = throughput_per_day * summary.mean;
                Some(StageMetrics {
                    active: active.contains(&stage),
                    stage,
                    sample_count: summary.count,
                    mean_days: summary.mean,
                    median_days: summary.median,
                    p85_days: summary.p85,
                    p95_days: summary.p95,
                    max_days: summary.max,
                    predicted_wip,
                    recommended_wip_limit: recommended_limit(predicted_wip, buffer),
                })
            })
            .collect()
    }
}

/// ceil(predicted WIP × buffer), at least 1
#[must_use]
pub fn recommended_limit(predicted_wip: f64, buffer: f64) -> u32 {
    let limit = (predicted_wip * buffer).ceil();
    if limit.is_finite() && limit >= 1.0 {
        limit.min(f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

/// Workflow shape with the most completed records
///
/// In-flight items do not vote.
#[must_use]
pub fn dominant_workflow(records: &[WorkItemFlowRecord], fallback: WorkflowShape) -> WorkflowShape {
    let (stories, features) = records
        .iter()
        .filter(|r| r.is_completed())
        .fold((0usize, 0usize), |(s, f), r| match r.workflow() {
            WorkflowShape::Story => (s + 1, f),
            WorkflowShape::Feature => (s, f + 1),
        });
    match stories.cmp(&features) {
        std::cmp::Ordering::Greater => WorkflowShape::Story,
        std::cmp::Ordering::Less => WorkflowShape::Feature,
        std::cmp::Ordering::Equal => fallback,
    }
}
