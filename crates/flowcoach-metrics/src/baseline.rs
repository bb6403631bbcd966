//! Historical capacity baseline

use crate::config::MetricsConfig;
use crate::stats::mean;
use flowcoach_model::{CapacityBaseline, CapacityStatus, GuardNote, MetricField, PeriodSummary};

/// Compare the current period against the most recent past periods
///
/// `history` is in chronological order; only the last
/// `config.baseline_periods` entries are used. Returns a guard note instead
/// of a baseline when there is no history or the baseline mean is zero.
pub fn compute_baseline(
    history: &[PeriodSummary],
    current_throughput: f64,
    current_lead_time_days: f64,
    config: &MetricsConfig,
) -> Result<CapacityBaseline, GuardNote> {
    if history.is_empty() {
        return Err(GuardNote {
            field: MetricField::BaselineUtilization,
            reason: "no period history available".to_string(),
        });
    }

    let recent = &history[history.len().saturating_sub(config.baseline_periods)..];
    let throughputs: Vec<f64> = recent.iter().map(|p| p.throughput).collect();
    let baseline_throughput = mean(&throughputs);
    if baseline_throughput <= 0.0 {
        return Err(GuardNote {
            field: MetricField::BaselineUtilization,
            reason: format!(
                "baseline throughput over {} periods is zero",
                recent.len()
            ),
        });
    }

    let lead_times: Vec<f64> = recent.iter().filter_map(|p| p.avg_lead_time_days).collect();
    let baseline_lead_time_days = (!lead_times.is_empty()).then(|| mean(&lead_times));
    let lead_time_deviation_pct = baseline_lead_time_days
        .filter(|w| *w > 0.0)
        .map(|w| (current_lead_time_days - w) / w * 100.0);

    let utilization_pct = current_throughput / baseline_throughput * 100.0;
    let status = if utilization_pct > config.over_capacity_pct {
        CapacityStatus::OverCapacity
    } else if utilization_pct < config.under_capacity_pct {
        CapacityStatus::UnderCapacity
    } else {
        CapacityStatus::Nominal
    };

    tracing::debug!(
        "Baseline over {} periods: {:.3} items/period, utilization {:.1}%",
        recent.len(),
        baseline_throughput,
        utilization_pct
    );

    Ok(CapacityBaseline {
        periods_used: recent.len(),
        baseline_throughput,
        baseline_lead_time_days,
        current_throughput,
        previous_period_throughput: recent.last().map(|p| p.throughput),
        throughput_deviation_pct: (current_throughput - baseline_throughput) / baseline_throughput
            * 100.0,
        lead_time_deviation_pct,
        utilization_pct,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(values: &[f64]) -> Vec<PeriodSummary> {
        values
            .iter()
            .enumerate()
            .map(|(i, t)| PeriodSummary::new(format!("P{i}"), *t))
            .collect()
    }

    #[test]
    fn uses_only_most_recent_periods() {
        let config = MetricsConfig::new().with_baseline_periods(2);
        let baseline = compute_baseline(&history(&[100.0, 10.0, 20.0]), 15.0, 0.0, &config).unwrap();
        assert_eq!(baseline.periods_used, 2);
        assert_eq!(baseline.baseline_throughput, 15.0);
        assert_eq!(baseline.status, CapacityStatus::Nominal);
        assert_eq!(baseline.previous_period_throughput, Some(20.0));
    }

    #[test]
    fn zero_baseline_yields_guard_note() {
        let note = compute_baseline(&history(&[0.0, 0.0]), 5.0, 0.0, &MetricsConfig::default())
            .unwrap_err();
        assert_eq!(note.field, MetricField::BaselineUtilization);
    }

    #[test]
    fn empty_history_yields_guard_note() {
        assert!(compute_baseline(&[], 5.0, 0.0, &MetricsConfig::default()).is_err());
    }

    #[test]
    fn under_capacity() {
        let baseline =
            compute_baseline(&history(&[40.0, 40.0]), 20.0, 0.0, &MetricsConfig::default()).unwrap();
        assert_eq!(baseline.utilization_pct, 50.0);
        assert_eq!(baseline.throughput_deviation_pct, -50.0);
        assert_eq!(baseline.status, CapacityStatus::UnderCapacity);
        assert_eq!(baseline.lead_time_deviation_pct, None);
    }
}
