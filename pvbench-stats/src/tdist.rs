//! Student-t Critical Values
//!
//! Two-sided critical values for the confidence levels the harness supports.
//! Degrees of freedom above 30 use the normal approximation, so the value
//! never increases as samples accumulate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by statistics configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// Only 90%, 95% and 99% confidence levels have critical value tables
    #[error("unsupported confidence level {0} (expected 0.90, 0.95 or 0.99)")]
    UnsupportedConfidence(f64),
}

/// Confidence level for margin-of-error computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum ConfidenceLevel {
    /// 90% two-sided
    P90,
    /// 95% two-sided
    #[default]
    P95,
    /// 99% two-sided
    P99,
}

impl ConfidenceLevel {
    /// Level as a fraction (e.g. 0.95)
    pub fn as_fraction(self) -> f64 {
        match self {
            ConfidenceLevel::P90 => 0.90,
            ConfidenceLevel::P95 => 0.95,
            ConfidenceLevel::P99 => 0.99,
        }
    }

    fn table(self) -> (&'static [f64; 30], f64) {
        match self {
            ConfidenceLevel::P90 => (&T_90, 1.645),
            ConfidenceLevel::P95 => (&T_95, 1.96),
            ConfidenceLevel::P99 => (&T_99, 2.576),
        }
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = StatsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        const TOLERANCE: f64 = 1e-9;
        if (value - 0.90).abs() < TOLERANCE {
            Ok(ConfidenceLevel::P90)
        } else if (value - 0.95).abs() < TOLERANCE {
            Ok(ConfidenceLevel::P95)
        } else if (value - 0.99).abs() < TOLERANCE {
            Ok(ConfidenceLevel::P99)
        } else {
            Err(StatsError::UnsupportedConfidence(value))
        }
    }
}

impl From<ConfidenceLevel> for f64 {
    fn from(level: ConfidenceLevel) -> f64 {
        level.as_fraction()
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.as_fraction() * 100.0)
    }
}

/// Two-sided Student-t critical value for `df` degrees of freedom.
///
/// `df == 0` is treated as one degree of freedom.
pub fn critical_value(level: ConfidenceLevel, df: usize) -> f64 {
    let (table, normal) = level.table();
    match df {
        0 => table[0],
        1..=30 => table[df - 1],
        _ => normal,
    }
}

#[rustfmt::skip]
const T_90: [f64; 30] = [
    6.314, 2.920, 2.353, 2.132, 2.015, 1.943, 1.895, 1.860, 1.833, 1.812,
    1.796, 1.782, 1.771, 1.761, 1.753, 1.746, 1.740, 1.734, 1.729, 1.725,
    1.721, 1.717, 1.714, 1.711, 1.708, 1.706, 1.703, 1.701, 1.699, 1.697,
];

#[rustfmt::skip]
const T_95: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228,
    2.201, 2.179, 2.160, 2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086,
    2.080, 2.074, 2.069, 2.064, 2.060, 2.056, 2.052, 2.048, 2.045, 2.042,
];

#[rustfmt::skip]
const T_99: [f64; 30] = [
    63.657, 9.925, 5.841, 4.604, 4.032, 3.707, 3.499, 3.355, 3.250, 3.169,
    3.106, 3.055, 3.012, 2.977, 2.947, 2.921, 2.898, 2.878, 2.861, 2.845,
    2.831, 2.819, 2.807, 2.797, 2.787, 2.779, 2.771, 2.763, 2.756, 2.750,
];
