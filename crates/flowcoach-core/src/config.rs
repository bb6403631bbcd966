//! Pipeline configuration
//!
//! Aggregates the configuration of every stage. Every field has a default,
//! so an empty TOML document is a valid configuration.
//!
//! ```toml
//! provider_timeout_ms = 5000
//!
//! [ingest]
//! extra_stages = ["implementing", "validating"]
//!
//! [metrics]
//! baseline_periods = 6
//!
//! [detector]
//! target_lead_time_days = 21.0
//!
//! [retrieval]
//! min_confidence = "high"
//! ```

use crate::error::PipelineError;
use flowcoach_knowledge::RetrievalConfig;
use flowcoach_metrics::MetricsConfig;
use flowcoach_model::IngestConfig;
use flowcoach_patterns::DetectorConfig;
use flowcoach_synthesis::SynthesisConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ingest: IngestConfig,
    pub metrics: MetricsConfig,
    pub detector: DetectorConfig,
    pub retrieval: RetrievalConfig,
    pub synthesis: SynthesisConfig,
    /// Upper bound on one flow data provider call
    pub provider_timeout_ms: u64,
    /// Knowledge corpus directory; the built-in corpus when unset
    pub corpus_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ingest: IngestConfig::default(),
            metrics: MetricsConfig::default(),
            detector: DetectorConfig::default(),
            retrieval: RetrievalConfig::default(),
            synthesis: SynthesisConfig::default(),
            provider_timeout_ms: 10_000,
            corpus_dir: None,
        }
    }
}

impl PipelineConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_provider_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.provider_timeout_ms = timeout_ms;
        self
    }

    /// With lead time target for both flow health and insight comparisons
    #[inline]
    #[must_use]
    pub fn with_target_lead_time(mut self, days: f64) -> Self {
        self.detector.target_lead_time_days = days;
        self.synthesis.target_lead_time_days = days;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_synthesis(mut self, synthesis: SynthesisConfig) -> Self {
        self.synthesis = synthesis;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_corpus_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.corpus_dir = Some(dir.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Returns error if the document is malformed or a value is out of range
    pub fn from_toml_str(input: &str) -> Result<Self, PipelineError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is malformed or out of range
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let input = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PipelineError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&input)?;
        tracing::info!("Loaded pipeline configuration from {}", path.display());
        Ok(config)
    }

    /// Validate every section
    ///
    /// # Errors
    /// Returns [`PipelineError::Config`] naming the first invalid value
    pub fn validate(&self) -> Result<(), PipelineError> {
        let config = |e: &dyn std::fmt::Display| PipelineError::Config(e.to_string());
        self.metrics.validate().map_err(|e| config(&e))?;
        self.detector.validate().map_err(|e| config(&e))?;
        self.retrieval.validate().map_err(|e| config(&e))?;
        self.synthesis.validate().map_err(|e| config(&e))?;
        if self.provider_timeout_ms == 0 {
            return Err(PipelineError::Config(
                "provider_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcoach_model::ConfidenceTier;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_default() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.provider_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn sections_override_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            provider_timeout_ms = 2500

            [metrics]
            baseline_periods = 4

            [retrieval]
            top_k = 3
            min_confidence = "high"

            [synthesis]
            max_pattern_insights = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.provider_timeout_ms, 2500);
        assert_eq!(config.metrics.baseline_periods, 4);
        assert_eq!(config.metrics.min_completed, MetricsConfig::default().min_completed);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.min_confidence, ConfidenceTier::High);
        assert_eq!(config.synthesis.max_pattern_insights, 4);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = PipelineConfig::from_toml_str("[metrics]\nwip_buffer = 0.5").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(err.to_string().contains("wip_buffer"));

        let err = PipelineConfig::from_toml_str("provider_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));

        let err = PipelineConfig::from_toml_str("provider_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, PipelineError::Toml(_)));
    }

    #[test]
    fn target_lead_time_sets_both_sections() {
        let config = PipelineConfig::new().with_target_lead_time(21.0);
        assert_eq!(config.detector.target_lead_time_days, 21.0);
        assert_eq!(config.synthesis.target_lead_time_days, 21.0);
    }

    #[tokio::test]
    async fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowcoach.toml");
        std::fs::write(&path, "provider_timeout_ms = 1500\n").unwrap();

        let config = PipelineConfig::load(&path).await.unwrap();
        assert_eq!(config.provider_timeout_ms, 1500);

        let missing = PipelineConfig::load(dir.path().join("absent.toml")).await;
        assert!(matches!(missing, Err(PipelineError::Io { .. })));
    }
}
