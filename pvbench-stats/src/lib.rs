#![warn(missing_docs)]
//! pvbench Statistical Engine
//!
//! Turns measured samples into the numbers the harness reports:
//! - `Sample`: one timed batch (elapsed nanoseconds, invocation count)
//! - Mean time per invocation and operations per second
//! - Standard-error based margin of error using Student-t critical values
//! - Median/min/max per-invocation times via linear-interpolated percentiles

mod percentiles;
mod sample;
mod summary;
mod tdist;

pub use percentiles::compute_percentile;
pub use sample::Sample;
pub use summary::{CaseStatistics, compute_statistics};
pub use tdist::{ConfidenceLevel, StatsError, critical_value};

/// Default confidence level (95%)
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Nanoseconds per second, used for ops/sec conversion
pub const NANOS_PER_SEC: f64 = 1_000_000_000.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!((DEFAULT_CONFIDENCE_LEVEL - 0.95).abs() < f64::EPSILON);
        assert_eq!(NANOS_PER_SEC, 1e9);
    }
}
