//! Little's Law per group of records (team, period)

use crate::stats::mean;
use flowcoach_model::WorkItemFlowRecord;
use serde::Serialize;

/// λ, W and L of one group
///
/// Unlike a full snapshot, a group breakdown has no minimum sample size;
/// a group without completed items reports zeros.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFlow {
    pub group: String,
    pub completed: usize,
    pub in_flight: usize,
    pub throughput_per_day: f64,
    pub avg_lead_time_days: f64,
    pub predicted_wip: f64,
}

impl GroupFlow {
    /// Compute Little's Law figures for a group
    #[must_use]
    pub fn compute<'a>(
        group: impl Into<String>,
        records: impl IntoIterator<Item = &'a WorkItemFlowRecord>,
        period_days: f64,
    ) -> Self {
        let mut lead_times = Vec::new();
        let mut in_flight = 0;
        for record in records {
            if record.is_completed() {
                lead_times.push(record.total_leadtime());
            } else if record.is_in_flight() {
                in_flight += 1;
            }
        }
        let throughput_per_day = if period_days > 0.0 {
            lead_times.len() as f64 / period_days
        } else {
            0.0
        };
        let avg_lead_time_days = mean(&lead_times);
        Self {
            group: group.into(),
            completed: lead_times.len(),
            in_flight,
            throughput_per_day,
            avg_lead_time_days,
            predicted_wip: throughput_per_day * avg_lead_time_days,
        }
    }

    /// Observed in-flight count over predicted WIP (0 when nothing is predicted)
    #[inline]
    #[must_use]
    pub fn wip_ratio(&self) -> f64 {
        if self.predicted_wip > 0.0 {
            self.in_flight as f64 / self.predicted_wip
        } else {
            0.0
        }
    }
}
