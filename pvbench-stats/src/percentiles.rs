//! Percentile Computation

/// Compute a single percentile from per-invocation periods
///
/// Uses linear interpolation between nearest ranks. Returns 0.0 for an
/// empty slice.
///
/// # Examples
///
/// ```
/// # use pvbench_stats::compute_percentile;
/// let periods = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(compute_percentile(&periods, 50.0), 3.0);
/// assert_eq!(compute_percentile(&periods, 100.0), 5.0);
/// ```
pub fn compute_percentile(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    if values.len() == 1 {
        return values[0];
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let p = (percentile / 100.0).clamp(0.0, 1.0);

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}
