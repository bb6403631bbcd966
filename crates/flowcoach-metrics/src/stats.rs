//! Descriptive statistics over day counts

/// Arithmetic mean (0 for an empty slice)
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (0 for an empty slice)
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentile of an ascending-sorted slice, linear interpolation between ranks
///
/// `p` is in [0, 100]. Returns 0 for an empty slice.
#[must_use]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Summary of one sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p85: f64,
    pub p95: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl Summary {
    /// Summarize values (any order)
    #[must_use]
    pub fn of(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            count: sorted.len(),
            mean: mean(&sorted),
            median: percentile_sorted(&sorted, 50.0),
            p85: percentile_sorted(&sorted, 85.0),
            p95: percentile_sorted(&sorted, 95.0),
            max: sorted.last().copied().unwrap_or(0.0),
            std_dev: std_dev(&sorted),
        }
    }

    /// Standard deviation over mean (0 when the mean is 0)
    #[inline]
    #[must_use]
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean > 0.0 {
            self.std_dev / self.mean
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&sorted, 50.0), 3.0);
        assert!((percentile_sorted(&sorted, 85.0) - 4.4).abs() < 1e-12);
        assert_eq!(percentile_sorted(&sorted, 100.0), 5.0);
        assert_eq!(percentile_sorted(&[], 50.0), 0.0);
        assert_eq!(percentile_sorted(&[7.0], 95.0), 7.0);
    }

    #[test]
    fn summary_of_unsorted_values() {
        let summary = Summary::of(&[5.0, 1.0, 3.0]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.max, 5.0);
    }

    #[test]
    fn coefficient_of_variation_zero_mean() {
        assert_eq!(Summary::of(&[0.0, 0.0]).coefficient_of_variation(), 0.0);
        assert_eq!(Summary::of(&[2.0, 2.0]).coefficient_of_variation(), 0.0);
    }

    #[test]
    fn population_std_dev() {
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
    }
}
