//! Case Statistics
//!
//! Each sample contributes one value: its mean time per invocation. The
//! margin of error is the half-width of a Student-t confidence interval
//! around the mean of those values, built from the standard error.

use crate::percentiles::compute_percentile;
use crate::sample::Sample;
use crate::tdist::{ConfidenceLevel, critical_value};
use crate::NANOS_PER_SEC;
use serde::{Deserialize, Serialize};

/// Statistics derived from the samples of one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStatistics {
    /// Number of samples
    pub sample_count: usize,
    /// Total invocations across all samples
    pub iterations: u64,
    /// Mean nanoseconds per invocation
    pub mean_ns: f64,
    /// Median of per-sample invocation times
    pub median_ns: f64,
    /// Fastest per-sample invocation time
    pub min_ns: f64,
    /// Slowest per-sample invocation time
    pub max_ns: f64,
    /// Sample standard deviation of per-sample invocation times
    pub std_dev_ns: f64,
    /// Standard error of the mean
    pub sem_ns: f64,
    /// Margin of error (confidence interval half-width) in nanoseconds
    #[serde(with = "unbounded")]
    pub moe_ns: f64,
    /// Relative margin of error, percent of the mean.
    /// Infinite with fewer than two samples.
    #[serde(with = "unbounded")]
    pub rme: f64,
    /// Invocations per second (`1e9 / mean_ns`)
    pub ops_per_sec: f64,
    /// Confidence level the margin was computed at
    pub confidence_level: ConfidenceLevel,
}

/// Margins are unbounded until two samples exist. JSON has no infinity, so
/// they travel as `null`.
mod unbounded {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        value.is_finite().then_some(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// Compute statistics for the samples collected so far.
pub fn compute_statistics(samples: &[Sample], level: ConfidenceLevel) -> CaseStatistics {
    let periods: Vec<f64> = samples.iter().map(Sample::period_nanos).collect();
    let iterations = samples.iter().map(|s| s.iterations).sum();
    let n = periods.len();

    if n == 0 {
        return CaseStatistics {
            sample_count: 0,
            iterations: 0,
            mean_ns: 0.0,
            median_ns: 0.0,
            min_ns: 0.0,
            max_ns: 0.0,
            std_dev_ns: 0.0,
            sem_ns: 0.0,
            moe_ns: f64::INFINITY,
            rme: f64::INFINITY,
            ops_per_sec: 0.0,
            confidence_level: level,
        };
    }

    let mean = periods.iter().sum::<f64>() / n as f64;

    let (std_dev, sem, moe) = if n < 2 {
        (0.0, 0.0, f64::INFINITY)
    } else {
        let variance = periods.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let std_dev = variance.sqrt();
        let sem = std_dev / (n as f64).sqrt();
        (std_dev, sem, sem * critical_value(level, n - 1))
    };

    let rme = if moe.is_infinite() {
        f64::INFINITY
    } else if mean > 0.0 {
        moe / mean * 100.0
    } else {
        0.0
    };

    let ops_per_sec = if mean > 0.0 { NANOS_PER_SEC / mean } else { 0.0 };

    let min = periods.iter().copied().fold(f64::INFINITY, f64::min);
    let max = periods.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    CaseStatistics {
        sample_count: n,
        iterations,
        mean_ns: mean,
        median_ns: compute_percentile(&periods, 50.0),
        min_ns: min,
        max_ns: max,
        std_dev_ns: std_dev,
        sem_ns: sem,
        moe_ns: moe,
        rme,
        ops_per_sec,
        confidence_level: level,
    }
}

impl CaseStatistics {
    /// Whether the relative margin of error is at or below `target` percent
    pub fn within_margin(&self, target: f64) -> bool {
        self.rme <= target
    }

    /// Coefficient of variation (relative stddev, percent)
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean_ns == 0.0 {
            0.0
        } else {
            (self.std_dev_ns / self.mean_ns) * 100.0
        }
    }
}
