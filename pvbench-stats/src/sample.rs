//! Measurement Samples

use serde::{Deserialize, Serialize};

/// One timed batch of case invocations.
///
/// The sampling loop keeps invoking a case until its window elapses, so a
/// sample covers `iterations` back-to-back invocations measured as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock nanoseconds covered by this sample
    pub elapsed_nanos: u64,
    /// Number of invocations timed in this sample (at least 1)
    pub iterations: u64,
}

impl Sample {
    /// Create a sample. A zero iteration count is clamped to one.
    #[inline]
    pub fn new(elapsed_nanos: u64, iterations: u64) -> Self {
        Self {
            elapsed_nanos,
            iterations: iterations.max(1),
        }
    }

    /// Mean nanoseconds per invocation within this sample
    #[inline]
    pub fn period_nanos(&self) -> f64 {
        self.elapsed_nanos as f64 / self.iterations as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period() {
        let sample = Sample::new(1_000, 4);
        assert!((sample.period_nanos() - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_iterations_clamped() {
        let sample = Sample::new(500, 0);
        assert_eq!(sample.iterations, 1);
        assert!((sample.period_nanos() - 500.0).abs() < f64::EPSILON);
    }
}
