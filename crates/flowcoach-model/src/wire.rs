//! Provider wire format
//!
//! Records arrive as JSON objects with a handful of metadata fields and one
//! field per workflow stage, either flattened into the object or nested
//! under `stages`. Durations may be numbers, numeric strings or `null`;
//! `null` and absent fields mean the stage was not recorded.
//!
//! Feature workflows vary between organizations (9 to 11 stages). Stage
//! names beyond the known layout are kept as extra stages when they are
//! nested under `stages` or declared in [`IngestConfig::extra_stages`];
//! any other flattened field carrying a duration is ignored and counted.

use crate::error::ModelError;
use crate::record::{ItemStatus, ScopeTags, WorkItemFlowRecord};
use crate::scope::PeriodSummary;
use crate::stage::{StageName, WorkflowShape};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ingestion settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Flattened field names accepted as stages beyond the known layout
    pub extra_stages: Vec<String>,
}

impl IngestConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With an additional stage name
    #[must_use]
    pub fn with_extra_stage(mut self, name: impl Into<String>) -> Self {
        self.extra_stages.push(name.into());
        self
    }

    fn is_extra(&self, stage: &StageName) -> bool {
        self.extra_stages.iter().any(|s| StageName::new(s) == *stage)
    }
}

/// A converted record and the duration fields it could not place
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedRecord {
    pub record: WorkItemFlowRecord,
    /// Duration fields outside every known or declared stage
    pub ignored_fields: usize,
}

/// Outcome of ingesting a batch
#[derive(Debug, Default)]
pub struct Ingested {
    pub records: Vec<WorkItemFlowRecord>,
    pub rejected: Vec<ModelError>,
    /// Duration fields ignored across all accepted records
    pub ignored_fields: usize,
}

/// One record as sent by the flow data provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFlowRecord {
    #[serde(default, alias = "issue_key", alias = "id")]
    pub key: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "art")]
    pub program: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default, alias = "pi")]
    pub period: Option<String>,
    #[serde(default)]
    pub workflow: Option<String>,
    #[serde(default, alias = "lead_time", alias = "leadtime")]
    pub total_leadtime: Option<Value>,
    #[serde(default)]
    pub current_stage: Option<String>,
    /// Nested stage map
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<IndexMap<String, Value>>,
    /// Flattened stage fields (and anything else the provider sends)
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

impl RawFlowRecord {
    /// Convert into a validated record with default ingestion settings
    ///
    /// # Errors
    /// Returns error if the key is missing or a duration is unreadable or invalid
    pub fn into_record(
        self,
        default_shape: WorkflowShape,
    ) -> Result<WorkItemFlowRecord, ModelError> {
        Ok(self.convert(default_shape, &IngestConfig::default())?.record)
    }

    /// Convert into a validated record
    ///
    /// The workflow shape is read from `workflow` when present, otherwise
    /// inferred from stage names with `default_shape` as fallback. A missing
    /// status is `completed` when a terminal stage was reached. Known stages
    /// of the other workflow shape count as ignored fields.
    ///
    /// # Errors
    /// Returns error if the key is missing or a duration is unreadable or invalid
    pub fn convert(
        self,
        default_shape: WorkflowShape,
        config: &IngestConfig,
    ) -> Result<ConvertedRecord, ModelError> {
        let key = self
            .key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ModelError::MissingKey)?;

        let mut durations: Vec<(StageName, f64)> = Vec::new();
        let mut extra: Vec<(StageName, f64)> = Vec::new();
        let mut ignored_fields = 0usize;
        let nested = self.stages.into_iter().flatten().map(|e| (true, e));
        let flattened = self.fields.into_iter().map(|e| (false, e));
        for (is_nested, (name, value)) in nested.chain(flattened) {
            let stage = stage_field(&name);
            let seen = |list: &[(StageName, f64)]| list.iter().any(|(s, _)| s == &stage);
            if seen(&durations) || seen(&extra) {
                continue;
            }
            if is_known_stage(&stage) {
                if let Some(days) = read_days(&key, stage.as_str(), &value)? {
                    durations.push((stage, days));
                }
            } else if is_nested || config.is_extra(&stage) {
                if let Some(days) = read_days(&key, stage.as_str(), &value)? {
                    extra.push((stage, days));
                }
            } else if looks_like_days(&value) {
                tracing::debug!("Ignoring duration field {} of {}", name, key);
                ignored_fields += 1;
            }
        }

        let workflow = match self.workflow.as_deref() {
            Some(raw) => raw.parse()?,
            None => WorkflowShape::infer(durations.iter().map(|(s, _)| s), default_shape),
        };
        let foreign = durations.iter().filter(|(s, _)| !workflow.contains(s)).count();
        if foreign > 0 {
            tracing::debug!("{} has {} stage(s) outside the {} workflow", key, foreign, workflow);
            ignored_fields += foreign;
        }

        let status = match self.status.as_deref() {
            Some(raw) => ItemStatus::parse_lenient(raw),
            None if durations.iter().any(|(s, _)| workflow.is_terminal(s)) => {
                ItemStatus::Completed
            }
            None if durations.is_empty() => ItemStatus::NotStarted,
            None => ItemStatus::InProgress,
        };

        let mut record = WorkItemFlowRecord::new(key.clone(), status, workflow, durations)?
            .with_tags(ScopeTags {
                program: self.program,
                team: self.team,
                period: self.period,
            })
            .with_extra_stages(extra)?;
        if let Some(value) = self.total_leadtime {
            if let Some(days) = read_days(&key, "total_leadtime", &value)? {
                record = record.with_total_leadtime(days)?;
            }
        }
        if let Some(current) = self.current_stage {
            record = record.with_current_stage(StageName::new(current));
        }
        Ok(ConvertedRecord {
            record,
            ignored_fields,
        })
    }
}

/// Strip a `_days` suffix and normalize
fn stage_field(name: &str) -> StageName {
    let stage = StageName::new(name);
    match stage.as_str().strip_suffix("-days") {
        Some(base) => StageName::new(base),
        None => stage,
    }
}

fn is_known_stage(stage: &StageName) -> bool {
    WorkflowShape::Feature.contains(stage) || WorkflowShape::Story.contains(stage)
}

fn looks_like_days(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

fn read_days(item: &str, stage: &str, value: &Value) -> Result<Option<f64>, ModelError> {
    let unreadable = || ModelError::UnreadableDuration {
        item: item.to_string(),
        stage: stage.to_string(),
        raw: value.to_string(),
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(unreadable),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| unreadable()),
        _ => Err(unreadable()),
    }
}

/// Records plus optional period history, as stored in a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub records: Vec<RawFlowRecord>,
    #[serde(default)]
    pub history: Vec<PeriodSummary>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchForm {
    Batch(RecordBatch),
    Records(Vec<RawFlowRecord>),
}

impl RecordBatch {
    /// Decode from JSON, accepting either a batch object or a bare record array
    ///
    /// # Errors
    /// Returns error if the input is not valid JSON of either form
    pub fn from_json(input: &str) -> Result<Self, ModelError> {
        Ok(match serde_json::from_str::<BatchForm>(input)? {
            BatchForm::Batch(batch) => batch,
            BatchForm::Records(records) => Self {
                records,
                history: Vec::new(),
            },
        })
    }

    /// Convert every raw record with default settings, separating rejected ones
    #[must_use]
    pub fn into_records(
        self,
        default_shape: WorkflowShape,
    ) -> (Vec<WorkItemFlowRecord>, Vec<ModelError>) {
        let ingested = self.ingest(default_shape, &IngestConfig::default());
        (ingested.records, ingested.rejected)
    }

    /// Convert every raw record
    ///
    /// Rejected records are returned with their error so callers can
    /// account for them in data completeness.
    #[must_use]
    pub fn ingest(self, default_shape: WorkflowShape, config: &IngestConfig) -> Ingested {
        let mut out = Ingested {
            records: Vec::with_capacity(self.records.len()),
            ..Ingested::default()
        };
        for raw in self.records {
            match raw.convert(default_shape, config) {
                Ok(converted) => {
                    out.ignored_fields += converted.ignored_fields;
                    out.records.push(converted.record);
                }
                Err(e) => {
                    tracing::warn!("Rejected flow record: {}", e);
                    out.rejected.push(e);
                }
            }
        }
        if out.ignored_fields > 0 {
            tracing::warn!(
                "Ignored {} duration field(s) outside the known stages",
                out.ignored_fields
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> RawFlowRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn flattened_stage_fields() {
        let raw = parse(
            r#"{
                "key": "STORY-7",
                "status": "Done",
                "team": "alpha",
                "Refinement": 2,
                "In Development": "4.5",
                "code_review": null,
                "in_testing": 3,
                "deployed": 0.5,
                "assignee_count": 2
            }"#,
        );
        let record = raw.into_record(WorkflowShape::Feature).unwrap();
        assert_eq!(record.workflow(), WorkflowShape::Story);
        assert_eq!(record.status(), ItemStatus::Completed);
        assert_eq!(record.team(), Some("alpha"));
        assert_eq!(record.stage_days(&StageName::new("in-development")), Some(4.5));
        assert_eq!(record.stage_days(&StageName::new("code-review")), None);
        assert_eq!(record.total_leadtime(), 9.5);
    }

    #[test]
    fn nested_stages_and_aliases() {
        let raw = parse(
            r#"{
                "issue_key": "FEAT-1",
                "art": "art-1",
                "pi": "PI-3",
                "workflow": "feature",
                "lead_time": 40,
                "stages": {"analysis": 5, "in_progress": 20, "review_days": 6}
            }"#,
        );
        let record = raw.into_record(WorkflowShape::Story).unwrap();
        assert_eq!(record.key(), "FEAT-1");
        assert_eq!(record.tags().program.as_deref(), Some("art-1"));
        assert_eq!(record.tags().period.as_deref(), Some("PI-3"));
        assert_eq!(record.total_leadtime(), 40.0);
        assert_eq!(record.stage_days(&StageName::new("review")), Some(6.0));
        assert_eq!(record.status(), ItemStatus::InProgress);
        assert_eq!(record.current_stage().unwrap().as_str(), "review");
    }

    #[test]
    fn undeclared_feature_stages_are_counted_not_lost_silently() {
        let json = r#"{
            "key": "FEAT-9",
            "status": "done",
            "workflow": "feature",
            "analysis": 5,
            "implementing": 10,
            "validating": "4",
            "summary": "Checkout redesign"
        }"#;

        let converted = parse(json)
            .convert(WorkflowShape::Feature, &IngestConfig::default())
            .unwrap();
        assert_eq!(converted.ignored_fields, 2);
        assert_eq!(converted.record.total_leadtime(), 5.0);

        let config = IngestConfig::new()
            .with_extra_stage("implementing")
            .with_extra_stage("Validating");
        let converted = parse(json).convert(WorkflowShape::Feature, &config).unwrap();
        assert_eq!(converted.ignored_fields, 0);
        assert_eq!(converted.record.total_leadtime(), 19.0);
        assert_eq!(converted.record.stages().len(), 1);
        assert_eq!(converted.record.extra_stages().len(), 2);
    }

    #[test]
    fn nested_unknown_stages_are_kept() {
        let raw = parse(
            r#"{
                "key": "FEAT-2",
                "workflow": "feature",
                "stages": {"analysis": 2, "implementing": 7, "deployed": 1}
            }"#,
        );
        let converted = raw
            .convert(WorkflowShape::Feature, &IngestConfig::default())
            .unwrap();
        assert_eq!(converted.ignored_fields, 0);
        assert_eq!(converted.record.total_leadtime(), 9.0);
        assert_eq!(converted.record.status(), ItemStatus::Completed);
    }

    #[test]
    fn unreadable_duration_is_rejected() {
        let raw = parse(r#"{"key": "S-1", "in_testing": "three"}"#);
        let err = raw.into_record(WorkflowShape::Story).unwrap_err();
        assert!(matches!(err, ModelError::UnreadableDuration { .. }));
        assert!(err.is_record_level());
    }

    #[test]
    fn missing_key_is_rejected() {
        let raw = parse(r#"{"status": "done", "deployed": 1}"#);
        assert!(matches!(
            raw.into_record(WorkflowShape::Story),
            Err(ModelError::MissingKey)
        ));
    }

    #[test]
    fn batch_accepts_bare_array() {
        let batch = RecordBatch::from_json(r#"[{"key": "A", "deployed": 1}]"#).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert!(batch.history.is_empty());
    }

    #[test]
    fn batch_splits_rejected_records() {
        let batch = RecordBatch::from_json(
            r#"{
                "records": [
                    {"key": "A", "in_development": 2, "deployed": 1},
                    {"key": "B", "in_development": -2}
                ],
                "history": [{"period_id": "S-1", "throughput": 12}]
            }"#,
        )
        .unwrap();
        assert_eq!(batch.history.len(), 1);
        let (records, rejected) = batch.into_records(WorkflowShape::Story);
        assert_eq!(records.len(), 1);
        assert_eq!(rejected.len(), 1);
    }

    #[test]
    fn ingest_sums_ignored_fields() {
        let batch = RecordBatch::from_json(
            r#"[
                {"key": "A", "in_development": 2, "blocked_days": 3},
                {"key": "B", "in_development": 1, "integration_test": 4}
            ]"#,
        )
        .unwrap();
        let ingested = batch.ingest(WorkflowShape::Story, &IngestConfig::default());
        assert_eq!(ingested.records.len(), 2);
        assert!(ingested.rejected.is_empty());
        assert_eq!(ingested.ignored_fields, 2);
    }
}
