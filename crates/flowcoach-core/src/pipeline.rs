//! Insight pipeline orchestrator
//!
//! A [`Pipeline`] holds what runs share: configuration, the flow data
//! provider, the engines and the immutable knowledge index. Each request is
//! a [`PipelineRun`] over freshly allocated [`RunState`], stepping through
//! the stage table until `Done`.
//!
//! # Degraded paths
//!
//! - Provider failure, timeout or no usable records: skip to Synthesize
//!   with a data-unavailable explanation
//! - Too few completed items: skip to Synthesize with an insufficient-data
//!   explanation
//! - Cancellation: an empty report with reason code `CANCELLED`

use crate::analysis::FlowAnalysis;
use crate::cancel::CancellationFlag;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, ProviderError, StateError};
use crate::failure::{FailureKind, StageFailure};
use crate::provider::FlowDataProvider;
use crate::report::PipelineReport;
use crate::stage::{validate_transition, PipelineStage, Route};
use crate::state::{CollectedData, InsufficientSample, RunState};
use chrono::NaiveDate;
use flowcoach_knowledge::{KnowledgeIndex, Retriever};
use flowcoach_metrics::MetricsEngine;
use flowcoach_model::{Ingested, RecordBatch, ScopeDescriptor, Severity};
use flowcoach_patterns::{DetectionContext, PatternDetector};
use flowcoach_synthesis::{NarrativeEnricher, SynthesisError, SynthesisInput, Synthesizer};
use std::future::Future;
use std::sync::Arc;
use ulid::Ulid;

/// Failure that ends a run early
#[derive(Debug, thiserror::Error)]
enum StepError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// Shared pipeline
pub struct Pipeline {
    config: PipelineConfig,
    provider: Arc<dyn FlowDataProvider>,
    metrics: MetricsEngine,
    detector: PatternDetector,
    retriever: Retriever,
    synthesizer: Synthesizer,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("provider", &self.provider.name())
            .field("documents", &self.retriever.index().len())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create pipeline over a loaded knowledge index
    ///
    /// # Errors
    /// Returns [`PipelineError::Config`] if the configuration is invalid
    pub fn new(
        config: PipelineConfig,
        provider: Arc<dyn FlowDataProvider>,
        index: KnowledgeIndex,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            metrics: MetricsEngine::new(config.metrics.clone()),
            detector: PatternDetector::new(config.detector.clone()),
            retriever: Retriever::new(index, config.retrieval.clone()),
            synthesizer: Synthesizer::new(config.synthesis.clone()),
            provider,
            config,
        })
    }

    /// Create pipeline, loading the corpus directory named in the
    /// configuration or the built-in corpus
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the corpus fails to load
    pub async fn from_config(
        config: PipelineConfig,
        provider: Arc<dyn FlowDataProvider>,
    ) -> Result<Self, PipelineError> {
        let index = match &config.corpus_dir {
            Some(dir) => KnowledgeIndex::load_dir(dir).await?,
            None => KnowledgeIndex::builtin()?,
        };
        tracing::info!("Knowledge index holds {} document(s)", index.len());
        Self::new(config, provider, index)
    }

    /// With a custom retriever (e.g. other scorers)
    #[must_use]
    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = retriever;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Prepare a run for one scope
    #[must_use]
    pub fn run(&self, scope: ScopeDescriptor) -> PipelineRun<'_> {
        PipelineRun {
            pipeline: self,
            scope,
            enricher: None,
            today: None,
            cancellation: CancellationFlag::new(),
            run_id: Ulid::new(),
        }
    }

    /// Run independent scopes concurrently
    pub async fn run_many(
        &self,
        scopes: impl IntoIterator<Item = ScopeDescriptor>,
    ) -> Vec<PipelineReport> {
        run_many(scopes.into_iter().map(|scope| self.run(scope))).await
    }
}

/// Execute prepared runs concurrently, reports in input order
pub async fn run_many<'p>(runs: impl IntoIterator<Item = PipelineRun<'p>>) -> Vec<PipelineReport> {
    futures::future::join_all(runs.into_iter().map(PipelineRun::execute)).await
}

/// One pipeline run
pub struct PipelineRun<'p> {
    pipeline: &'p Pipeline,
    scope: ScopeDescriptor,
    enricher: Option<Arc<dyn NarrativeEnricher>>,
    today: Option<NaiveDate>,
    cancellation: CancellationFlag,
    run_id: Ulid,
}

impl<'p> PipelineRun<'p> {
    /// With narrative enricher for this run
    #[must_use]
    pub fn with_enricher(mut self, enricher: Arc<dyn NarrativeEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// With the date the analysis runs on (defaults to today, UTC)
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// With cancellation flag
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    #[inline]
    #[must_use]
    pub fn run_id(&self) -> Ulid {
        self.run_id
    }

    /// Execute the run
    ///
    /// Never fails: every degraded path is recorded in the report.
    pub async fn execute(self) -> PipelineReport {
        let route = Route::for_scope(self.scope.kind);
        let state = RunState::new();
        let mut failures = Vec::new();
        let mut visited = Vec::new();
        let mut stage = PipelineStage::Collect;
        tracing::info!(
            "Run {} started for {} '{}'",
            self.run_id,
            self.scope.kind,
            self.scope.scope_id
        );

        loop {
            if self.cancellation.is_cancelled() {
                tracing::warn!("Run {} cancelled before {}", self.run_id, stage);
                return PipelineReport::cancelled(
                    self.run_id.to_string(),
                    self.scope,
                    route,
                    visited,
                    stage,
                );
            }
            visited.push(stage);
            if stage.is_terminal() {
                break;
            }

            tracing::info!("Run {}: {}", self.run_id, stage);
            let next = match self.step(stage, route, &state, &mut failures).await {
                Ok(next) => next,
                Err(e) => {
                    tracing::warn!("Run {} stopped in {}: {}", self.run_id, stage, e);
                    failures.push(StageFailure::new(
                        stage,
                        FailureKind::ComputationGuard,
                        e.to_string(),
                    ));
                    break;
                }
            };
            if let Err(e) = validate_transition(stage, next) {
                tracing::warn!("Run {}: {}", self.run_id, e);
                failures.push(StageFailure::new(
                    stage,
                    FailureKind::ComputationGuard,
                    e.to_string(),
                ));
                break;
            }
            stage = next;
        }

        tracing::info!(
            "Run {} finished with {} insight(s), {} failure(s)",
            self.run_id,
            state.insights().len(),
            failures.len()
        );
        PipelineReport::from_parts(
            self.run_id.to_string(),
            self.scope,
            route,
            visited,
            state.into_parts(),
            failures,
        )
    }

    async fn step(
        &self,
        stage: PipelineStage,
        route: Route,
        state: &RunState,
        failures: &mut Vec<StageFailure>,
    ) -> Result<PipelineStage, StepError> {
        match stage {
            PipelineStage::Collect => self.collect(route, state, failures).await,
            PipelineStage::ComputeMetrics => self.compute_metrics(route, state, failures),
            PipelineStage::FlowAnalysis => self.flow_analysis(route, state),
            PipelineStage::DetectPatterns => self.detect_patterns(route, state),
            PipelineStage::RetrieveKnowledge => self.retrieve_knowledge(route, state, failures),
            PipelineStage::Synthesize => self.synthesize(route, state, failures).await,
            PipelineStage::Done => Ok(PipelineStage::Done),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        let provider = &self.pipeline.provider;
        tokio::time::timeout(self.pipeline.config.provider_timeout(), call)
            .await
            .map_err(|_| ProviderError::Timeout {
                name: provider.name().to_string(),
                timeout_ms: self.pipeline.config.provider_timeout_ms,
            })?
    }

    async fn collect(
        &self,
        route: Route,
        state: &RunState,
        failures: &mut Vec<StageFailure>,
    ) -> Result<PipelineStage, StepError> {
        let provider = &self.pipeline.provider;
        let raw = match self.bounded(provider.fetch_records(&self.scope)).await {
            Ok(raw) => raw,
            Err(e) => return Ok(unavailable(state, failures, e.to_string())?),
        };
        let history = match self.bounded(provider.fetch_history(&self.scope)).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("History unavailable for {}: {}", self.scope.scope_id, e);
                Vec::new()
            }
        };

        let fetched = raw.len();
        let Ingested {
            records,
            rejected,
            ignored_fields,
        } = RecordBatch {
            records: raw,
            history: Vec::new(),
        }
        .ingest(self.scope.workflow, &self.pipeline.config.ingest);
        if records.is_empty() {
            let reason = if fetched == 0 {
                format!("provider '{}' returned no records", provider.name())
            } else {
                format!("all {fetched} records were rejected at ingestion")
            };
            return Ok(unavailable(state, failures, reason)?);
        }

        tracing::debug!(
            "Collected {} record(s), {} rejected, {} field(s) ignored, {} history period(s)",
            records.len(),
            rejected.len(),
            ignored_fields,
            history.len()
        );
        state.record_collected(CollectedData {
            records,
            history,
            rejected: rejected.len(),
            ignored_fields,
        })?;
        Ok(route.next(PipelineStage::Collect))
    }

    fn compute_metrics(
        &self,
        route: Route,
        state: &RunState,
        failures: &mut Vec<StageFailure>,
    ) -> Result<PipelineStage, StepError> {
        let collected = state
            .collected()
            .ok_or(StateError::Missing { slot: "collected" })?;
        let stage = PipelineStage::ComputeMetrics;

        match self
            .pipeline
            .metrics
            .compute(&self.scope, &collected.records, &collected.history)
        {
            Ok(snapshot) => {
                for note in snapshot.guard_notes() {
                    failures.push(StageFailure::new(
                        stage,
                        FailureKind::ComputationGuard,
                        format!("{} not computed: {}", note.field.as_str(), note.reason),
                    ));
                }
                tracing::debug!(
                    "λ = {:.3}/day, W = {:.1} days, L = {:.1}, flow efficiency {}%",
                    snapshot.throughput_per_day(),
                    snapshot.avg_lead_time_days(),
                    snapshot.predicted_wip(),
                    snapshot.flow_efficiency_display()
                );
                state.record_snapshot(snapshot)?;
                Ok(route.next(stage))
            }
            Err(e) if e.is_insufficient_data() => {
                let workflow = self
                    .pipeline
                    .metrics
                    .workflow_for(&self.scope, &collected.records);
                let relevant = collected.records.iter().filter(|r| r.workflow() == workflow);
                let (completed, in_flight) = relevant.fold((0, 0), |(c, f), r| {
                    (c + usize::from(r.is_completed()), f + usize::from(r.is_in_flight()))
                });
                failures.push(StageFailure::new(
                    stage,
                    FailureKind::InsufficientData,
                    e.to_string(),
                ));
                state.record_insufficient(InsufficientSample {
                    completed,
                    minimum: self.pipeline.config.metrics.min_completed,
                    in_flight,
                })?;
                Ok(PipelineStage::Synthesize)
            }
            Err(e) => {
                failures.push(StageFailure::new(
                    stage,
                    FailureKind::ComputationGuard,
                    e.to_string(),
                ));
                state.record_unavailable(format!("metrics could not be computed: {e}"))?;
                Ok(PipelineStage::Synthesize)
            }
        }
    }

    fn flow_analysis(&self, route: Route, state: &RunState) -> Result<PipelineStage, StepError> {
        let collected = state
            .collected()
            .ok_or(StateError::Missing { slot: "collected" })?;
        let snapshot = state
            .snapshot()
            .ok_or(StateError::Missing { slot: "snapshot" })?;
        let analysis = FlowAnalysis::compute(
            snapshot,
            &collected.records,
            self.pipeline.config.detector.wip_tolerance,
        );
        tracing::debug!(
            "Flow analysis: {} team(s), {} overloaded",
            analysis.teams.len(),
            analysis.overloaded_teams.len()
        );
        state.record_flow_analysis(analysis)?;
        Ok(route.next(PipelineStage::FlowAnalysis))
    }

    fn detect_patterns(&self, route: Route, state: &RunState) -> Result<PipelineStage, StepError> {
        let collected = state
            .collected()
            .ok_or(StateError::Missing { slot: "collected" })?;
        let snapshot = state
            .snapshot()
            .ok_or(StateError::Missing { slot: "snapshot" })?;
        let today = self
            .today
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let detector = &self.pipeline.detector;

        let patterns = detector.detect(
            snapshot,
            &collected.records,
            &DetectionContext::new(&self.scope, today),
        );
        state.record_patterns(detector.flow_health(snapshot), patterns)?;
        Ok(route.next(PipelineStage::DetectPatterns))
    }

    fn retrieve_knowledge(
        &self,
        route: Route,
        state: &RunState,
        failures: &mut Vec<StageFailure>,
    ) -> Result<PipelineStage, StepError> {
        let patterns = state.patterns();
        let knowledge = self
            .pipeline
            .retriever
            .retrieve_for_patterns(patterns, self.scope.kind.level());
        for pattern in patterns {
            if knowledge.get(&pattern.id).map_or(true, Vec::is_empty) {
                failures.push(StageFailure::new(
                    PipelineStage::RetrieveKnowledge,
                    FailureKind::KnowledgeRetrievalMiss,
                    format!(
                        "no knowledge matched {} in {}; heuristic root causes used",
                        pattern.kind.label().to_lowercase(),
                        pattern.subject.describe()
                    ),
                ));
            }
        }
        state.record_knowledge(knowledge)?;
        Ok(route.next(PipelineStage::RetrieveKnowledge))
    }

    async fn synthesize(
        &self,
        route: Route,
        state: &RunState,
        failures: &mut Vec<StageFailure>,
    ) -> Result<PipelineStage, StepError> {
        let synthesizer = &self.pipeline.synthesizer;
        let insights = if let Some(reason) = state.unavailable() {
            vec![synthesizer.explain_unavailable(&self.scope, reason)?]
        } else if let Some(sample) = state.insufficient() {
            vec![synthesizer.explain_insufficient(
                &self.scope,
                sample.completed,
                sample.minimum,
                sample.in_flight,
            )?]
        } else {
            let snapshot = state
                .snapshot()
                .ok_or(StateError::Missing { slot: "snapshot" })?;
            let knowledge = state
                .knowledge()
                .ok_or(StateError::Missing { slot: "knowledge" })?;
            let input = SynthesisInput {
                scope: &self.scope,
                snapshot,
                flow_health: state.flow_health().unwrap_or(Severity::Info),
                patterns: state.patterns(),
                knowledge,
            };
            let outcome = synthesizer
                .synthesize_with(input, self.enricher.as_deref())
                .await?;
            failures.extend(outcome.enrichment_failures.iter().map(|e| {
                StageFailure::new(
                    PipelineStage::Synthesize,
                    FailureKind::EnrichmentUnavailable,
                    e.to_string(),
                )
            }));
            if !outcome.omitted_patterns.is_empty() {
                let omitted: Vec<String> = state
                    .patterns()
                    .iter()
                    .filter(|p| outcome.omitted_patterns.contains(&p.id))
                    .map(|p| format!("{} at {}", p.kind.label(), p.subject.describe()))
                    .collect();
                failures.push(StageFailure::new(
                    PipelineStage::Synthesize,
                    FailureKind::InsightsCapped,
                    format!(
                        "{} pattern(s) beyond the limit of {} insights: {}",
                        omitted.len(),
                        synthesizer.config().max_pattern_insights,
                        omitted.join(", ")
                    ),
                ));
            }
            outcome.insights
        };
        state.record_insights(insights)?;
        Ok(route.next(PipelineStage::Synthesize))
    }
}

fn unavailable(
    state: &RunState,
    failures: &mut Vec<StageFailure>,
    reason: String,
) -> Result<PipelineStage, StateError> {
    tracing::warn!("Flow data unavailable: {}", reason);
    failures.push(StageFailure::new(
        PipelineStage::Collect,
        FailureKind::DataUnavailable,
        reason.clone(),
    ));
    state.record_unavailable(reason)?;
    Ok(PipelineStage::Synthesize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockFlowDataProvider;
    use flowcoach_model::{InsightCategory, RawFlowRecord};
    use flowcoach_test_utils::{program_scope, sample_batch_json, team_scope, today};
    use pretty_assertions::assert_eq;

    fn pipeline(provider: MockFlowDataProvider) -> Pipeline {
        Pipeline::new(
            PipelineConfig::default(),
            Arc::new(provider),
            KnowledgeIndex::builtin().unwrap(),
        )
        .unwrap()
    }

    fn sample_records() -> Vec<RawFlowRecord> {
        RecordBatch::from_json(&sample_batch_json()).unwrap().records
    }

    #[tokio::test]
    async fn provider_error_yields_data_unavailable() {
        let mut provider = MockFlowDataProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_fetch_records()
            .times(1)
            .returning(|_| Err(ProviderError::unavailable("mock", "connection refused")));
        provider.expect_fetch_history().never();

        let report = pipeline(provider).run(team_scope(30)).execute().await;
        assert_eq!(
            report.stages,
            vec![
                PipelineStage::Collect,
                PipelineStage::Synthesize,
                PipelineStage::Done
            ]
        );
        assert_eq!(report.failure_codes(), vec!["DATA_UNAVAILABLE"]);
        assert_eq!(report.insights.len(), 1);
        assert_eq!(report.insights[0].category, InsightCategory::DataUnavailable);
        assert!(report.insights[0]
            .observation
            .statement
            .contains("connection refused"));
    }

    #[tokio::test]
    async fn history_failure_degrades_to_guard_note() {
        let mut provider = MockFlowDataProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_fetch_records()
            .returning(|_| Ok(sample_records()));
        provider
            .expect_fetch_history()
            .returning(|_| Err(ProviderError::unavailable("mock", "history offline")));

        let report = pipeline(provider)
            .run(program_scope(30))
            .with_today(today())
            .execute()
            .await;
        assert!(report.snapshot.is_some());
        assert!(report.has_failure(FailureKind::ComputationGuard));
        assert!(!report.has_failure(FailureKind::DataUnavailable));
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn each_run_fetches_its_own_records() {
        let mut provider = MockFlowDataProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_fetch_records()
            .times(2)
            .returning(|_| Ok(sample_records()));
        provider.expect_fetch_history().times(2).returning(|_| Ok(Vec::new()));

        let pipeline = pipeline(provider);
        let reports = pipeline
            .run_many(vec![program_scope(30), program_scope(30)])
            .await;
        assert_eq!(reports.len(), 2);
        assert_ne!(reports[0].run_id, reports[1].run_id);
    }
}
