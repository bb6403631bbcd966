//! Flow data provider
//!
//! The upstream timing-data service is read-only and external. Records
//! arrive in wire form and are validated by the Collect stage, so a
//! provider never has to reject individual records itself.

use crate::error::ProviderError;
use flowcoach_model::{PeriodSummary, RawFlowRecord, RecordBatch, ScopeDescriptor};
use std::path::{Path, PathBuf};

/// Source of flow records for a scope
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FlowDataProvider: Send + Sync {
    /// Name used in logs and failure messages
    fn name(&self) -> &str;

    /// Fetch the records of a scope
    async fn fetch_records(
        &self,
        scope: &ScopeDescriptor,
    ) -> Result<Vec<RawFlowRecord>, ProviderError>;

    /// Fetch per-period history for baselining; none by default
    async fn fetch_history(
        &self,
        _scope: &ScopeDescriptor,
    ) -> Result<Vec<PeriodSummary>, ProviderError> {
        Ok(Vec::new())
    }
}

/// In-memory provider serving one fixed batch
#[derive(Debug, Clone, Default)]
pub struct StaticFlowProvider {
    batch: RecordBatch,
}

impl StaticFlowProvider {
    #[inline]
    #[must_use]
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Provider serving a JSON batch or bare record array
    ///
    /// # Errors
    /// Returns error if the JSON is malformed
    pub fn from_json(input: &str) -> Result<Self, ProviderError> {
        Ok(Self::new(RecordBatch::from_json(input)?))
    }
}

#[async_trait::async_trait]
impl FlowDataProvider for StaticFlowProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_records(
        &self,
        _scope: &ScopeDescriptor,
    ) -> Result<Vec<RawFlowRecord>, ProviderError> {
        Ok(self.batch.records.clone())
    }

    async fn fetch_history(
        &self,
        _scope: &ScopeDescriptor,
    ) -> Result<Vec<PeriodSummary>, ProviderError> {
        Ok(self.batch.history.clone())
    }
}

/// Provider reading a JSON batch file on every call
#[derive(Debug, Clone)]
pub struct JsonFileFlowProvider {
    path: PathBuf,
}

impl JsonFileFlowProvider {
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<RecordBatch, ProviderError> {
        let input = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ProviderError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(RecordBatch::from_json(&input)?)
    }
}

#[async_trait::async_trait]
impl FlowDataProvider for JsonFileFlowProvider {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn fetch_records(
        &self,
        _scope: &ScopeDescriptor,
    ) -> Result<Vec<RawFlowRecord>, ProviderError> {
        let batch = self.read().await?;
        tracing::debug!(
            "Read {} record(s) from {}",
            batch.records.len(),
            self.path.display()
        );
        Ok(batch.records)
    }

    async fn fetch_history(
        &self,
        _scope: &ScopeDescriptor,
    ) -> Result<Vec<PeriodSummary>, ProviderError> {
        Ok(self.read().await?.history)
    }
}

/// Provider calling the flow data service over HTTP
///
/// `GET {base}/records` answers a batch or a bare record array;
/// `GET {base}/history` answers an array of period summaries, and a 404
/// there means no history.
#[derive(Debug, Clone)]
pub struct HttpFlowProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFlowProvider {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, resource: &str, scope: &ScopeDescriptor) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/{resource}", self.base_url))
            .query(&scope_query(scope))
    }
}

/// Query parameters describing a scope
#[must_use]
pub fn scope_query(scope: &ScopeDescriptor) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("scope", scope.kind.as_str().to_string()),
        ("scope_id", scope.scope_id.clone()),
        ("workflow", scope.workflow.as_str().to_string()),
        ("start", scope.window.start.to_string()),
        ("end", scope.window.end.to_string()),
        ("stuck_threshold_days", scope.stuck_threshold_days.to_string()),
    ];
    query.extend(scope.program_ids.iter().map(|p| ("program", p.clone())));
    query.extend(scope.period_ids.iter().map(|p| ("period", p.clone())));
    if let Some(team) = &scope.team {
        query.push(("team", team.clone()));
    }
    query
}

#[async_trait::async_trait]
impl FlowDataProvider for HttpFlowProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_records(
        &self,
        scope: &ScopeDescriptor,
    ) -> Result<Vec<RawFlowRecord>, ProviderError> {
        let response = self.get("records", scope).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::unavailable(
                self.name(),
                format!("records endpoint answered {}", response.status()),
            ));
        }
        let body = response.text().await?;
        Ok(RecordBatch::from_json(&body)?.records)
    }

    async fn fetch_history(
        &self,
        scope: &ScopeDescriptor,
    ) -> Result<Vec<PeriodSummary>, ProviderError> {
        let response = self.get("history", scope).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        Ok(response.error_for_status()?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcoach_test_utils::{program_scope, sample_batch_json};

    #[tokio::test]
    async fn static_provider_serves_batch() {
        let provider = StaticFlowProvider::from_json(&sample_batch_json()).unwrap();
        let scope = program_scope(30);
        assert_eq!(provider.fetch_records(&scope).await.unwrap().len(), 12);
        assert_eq!(provider.fetch_history(&scope).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn json_file_provider_reads_on_each_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, sample_batch_json()).unwrap();

        let provider = JsonFileFlowProvider::new(&path);
        let scope = program_scope(30);
        assert_eq!(provider.fetch_records(&scope).await.unwrap().len(), 12);

        std::fs::write(&path, r#"[{"key": "FEAT-1", "analysis": 2}]"#).unwrap();
        assert_eq!(provider.fetch_records(&scope).await.unwrap().len(), 1);
        assert!(provider.fetch_history(&scope).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_file_provider_errors() {
        let dir = tempfile::tempdir().unwrap();
        let scope = program_scope(30);

        let missing = JsonFileFlowProvider::new(dir.path().join("absent.json"));
        assert!(matches!(
            missing.fetch_records(&scope).await,
            Err(ProviderError::Io { .. })
        ));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileFlowProvider::new(&path).fetch_records(&scope).await,
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn scope_query_carries_filters() {
        let scope = program_scope(30)
            .with_periods(vec!["PI-3".to_string()])
            .with_team("alpha");
        let query = scope_query(&scope);
        assert!(query.contains(&("scope", "program".to_string())));
        assert!(query.contains(&("program", "art-1".to_string())));
        assert!(query.contains(&("period", "PI-3".to_string())));
        assert!(query.contains(&("team", "alpha".to_string())));
        assert!(query.contains(&("start", "2024-02-24".to_string())));
    }

    #[test]
    fn base_url_is_trimmed() {
        let provider = HttpFlowProvider::new("http://flow.local/api/");
        assert_eq!(provider.base_url(), "http://flow.local/api");
    }
}
