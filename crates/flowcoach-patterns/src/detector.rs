//! Pattern detector
//!
//! Runs every detection over one snapshot and its records and returns the
//! patterns in a deterministic order: severity, confidence, kind, subject.

use crate::bottleneck::detect_bottlenecks;
use crate::config::DetectorConfig;
use crate::predictability::detect_low_predictability;
use crate::severity::flow_health;
use crate::stuck::detect_stuck;
use crate::wip::{detect_high_wip, WipDistribution};
use chrono::NaiveDate;
use flowcoach_model::{MetricsSnapshot, Pattern, ScopeDescriptor, Severity, WorkItemFlowRecord};

/// Scope and date a detection runs against
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub scope: &'a ScopeDescriptor,
    /// Date the analysis runs on
    pub today: NaiveDate,
}

impl<'a> DetectionContext<'a> {
    /// Create context
    #[inline]
    #[must_use]
    pub fn new(scope: &'a ScopeDescriptor, today: NaiveDate) -> Self {
        Self { scope, today }
    }

    /// Check if terminal items are judged for stuck detection
    #[inline]
    #[must_use]
    pub fn is_retrospective(&self) -> bool {
        self.scope.window.is_retrospective(self.today)
    }
}

/// Bottleneck and pattern detector
#[derive(Debug, Clone, Default)]
pub struct PatternDetector {
    config: DetectorConfig,
}

impl PatternDetector {
    /// Create detector
    #[inline]
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Overall flow-health tier of a snapshot
    #[inline]
    #[must_use]
    pub fn flow_health(&self, snapshot: &MetricsSnapshot) -> Severity {
        flow_health(snapshot, &self.config)
    }

    /// In-flight distribution of the records following the snapshot's workflow
    #[must_use]
    pub fn wip_distribution(
        &self,
        snapshot: &MetricsSnapshot,
        records: &[WorkItemFlowRecord],
    ) -> WipDistribution {
        let workflow = snapshot.workflow();
        WipDistribution::from_records(
            records.iter().filter(|r| r.workflow() == workflow),
            workflow,
        )
    }

    /// Detect all patterns
    #[must_use]
    pub fn detect(
        &self,
        snapshot: &MetricsSnapshot,
        records: &[WorkItemFlowRecord],
        context: &DetectionContext<'_>,
    ) -> Vec<Pattern> {
        let workflow = snapshot.workflow();
        let relevant: Vec<&WorkItemFlowRecord> =
            records.iter().filter(|r| r.workflow() == workflow).collect();
        let threshold = context.scope.stuck_threshold_days;

        let mut patterns = detect_bottlenecks(snapshot, &relevant, threshold, &self.config);
        patterns.extend(detect_stuck(
            snapshot,
            &relevant,
            threshold,
            context.is_retrospective(),
            &self.config,
        ));
        let distribution = WipDistribution::from_records(relevant.iter().copied(), workflow);
        patterns.extend(detect_high_wip(snapshot, &distribution, &self.config));
        patterns.extend(detect_low_predictability(snapshot, &self.config));

        sort_patterns(&mut patterns);
        tracing::info!(
            "Detected {} pattern(s) for {} {}",
            patterns.len(),
            snapshot.scope(),
            snapshot.scope_id()
        );
        patterns
    }
}

/// Severity desc, confidence desc, kind, subject
pub fn sort_patterns(patterns: &mut [Pattern]) {
    patterns.sort_by(|a, b| {
        b.severity
            .rank()
            .cmp(&a.severity.rank())
            .then_with(|| b.confidence.total_cmp(&a.confidence))
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.subject.key().cmp(&b.subject.key()))
    });
}
