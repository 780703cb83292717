//! Report Data Structures

use chrono::{DateTime, Utc};
use pvbench_core::{CaseOutcome, CaseStatus, Convergence, SamplerConfig, SuiteResult};
use pvbench_stats::CaseStatistics;
use serde::{Deserialize, Serialize};

/// Version of the JSON layout below
pub const SCHEMA_VERSION: u32 = 1;

/// Complete suite report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub results: Vec<CaseReport>,
    /// Completed case with the highest ops/sec
    pub fastest: Option<String>,
    /// Whether the suite was cancelled before every case ran
    pub cancelled: bool,
    pub summary: ReportSummary,
}

/// Report metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    /// pvbench version that produced the report
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub config: ReportConfig,
}

/// Execution configuration captured in report metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Pushes per invocation
    pub len: u32,
    pub sample_window_ns: u64,
    pub min_samples: usize,
    pub target_rme: f64,
    pub max_time_ns: u64,
    pub confidence_level: f64,
}

impl ReportConfig {
    /// Capture the sampler settings used for a workload of `len` pushes
    pub fn new(len: u32, sampler: &SamplerConfig) -> Self {
        Self {
            len,
            sample_window_ns: sampler.sample_window_ns,
            min_samples: sampler.min_samples,
            target_rme: sampler.target_rme,
            max_time_ns: sampler.max_time_ns,
            confidence_level: sampler.confidence_level.as_fraction(),
        }
    }
}

/// Per-case entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub status: CaseReportStatus,
    pub metrics: Option<CaseMetrics>,
    pub failure: Option<FailureInfo>,
    pub skip_reason: Option<String>,
}

/// Case status as reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseReportStatus {
    /// Margin of error reached its target
    Converged,
    /// Measured, but the time budget ran out first
    LowConfidence,
    Failed,
    Skipped,
}

/// Timing metrics of a measured case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseMetrics {
    pub samples: usize,
    pub iterations: u64,
    pub mean_ns: f64,
    pub median_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
    pub std_dev_ns: f64,
    /// Margin of error in nanoseconds; absent when fewer than two samples exist
    pub moe_ns: Option<f64>,
    /// Relative margin of error, percent; absent when unbounded
    pub rme: Option<f64>,
    pub ops_per_sec: f64,
    pub confidence_level: f64,
    /// Wall-clock nanoseconds spent sampling
    pub elapsed_ns: u64,
}

impl From<&CaseStatistics> for CaseMetrics {
    fn from(stats: &CaseStatistics) -> Self {
        Self {
            samples: stats.sample_count,
            iterations: stats.iterations,
            mean_ns: stats.mean_ns,
            median_ns: stats.median_ns,
            min_ns: stats.min_ns,
            max_ns: stats.max_ns,
            std_dev_ns: stats.std_dev_ns,
            moe_ns: finite(stats.moe_ns),
            rme: finite(stats.rme),
            ops_per_sec: stats.ops_per_sec,
            confidence_level: stats.confidence_level.as_fraction(),
            elapsed_ns: 0, // Filled from the measurement
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Failure information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub kind: String,
    pub message: String,
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_cases: usize,
    pub converged: usize,
    pub low_confidence: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Sum of per-case sampling time
    pub total_sampling_ms: f64,
}

impl From<&CaseOutcome> for CaseReport {
    fn from(outcome: &CaseOutcome) -> Self {
        let mut report = CaseReport {
            name: outcome.name.clone(),
            status: CaseReportStatus::Skipped,
            metrics: None,
            failure: None,
            skip_reason: None,
        };

        match &outcome.status {
            CaseStatus::Completed(measurement) => {
                report.status = match measurement.convergence {
                    Convergence::Converged => CaseReportStatus::Converged,
                    Convergence::BudgetExhausted => CaseReportStatus::LowConfidence,
                };
                let mut metrics = CaseMetrics::from(&measurement.statistics);
                metrics.elapsed_ns = measurement.elapsed_ns;
                report.metrics = Some(metrics);
            }
            CaseStatus::Failed { kind, message } => {
                report.status = CaseReportStatus::Failed;
                report.failure = Some(FailureInfo {
                    kind: kind.to_string(),
                    message: message.clone(),
                });
            }
            CaseStatus::Skipped { reason } => {
                report.skip_reason = Some(reason.clone());
            }
        }

        report
    }
}

/// Build the serializable report for a finished suite
pub fn build_report(result: &SuiteResult, config: ReportConfig) -> Report {
    let results: Vec<CaseReport> = result.outcomes.iter().map(CaseReport::from).collect();

    let mut summary = ReportSummary {
        total_cases: results.len(),
        ..ReportSummary::default()
    };
    for case in &results {
        match case.status {
            CaseReportStatus::Converged => summary.converged += 1,
            CaseReportStatus::LowConfidence => summary.low_confidence += 1,
            CaseReportStatus::Failed => summary.failed += 1,
            CaseReportStatus::Skipped => summary.skipped += 1,
        }
        if let Some(metrics) = &case.metrics {
            summary.total_sampling_ms += metrics.elapsed_ns as f64 / 1_000_000.0;
        }
    }

    Report {
        meta: ReportMeta {
            schema_version: SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            config,
        },
        results,
        fastest: result.fastest.clone(),
        cancelled: result.cancelled,
        summary,
    }
}

/// Suite with one case in every state
#[cfg(test)]
pub(crate) fn sample_result() -> SuiteResult {
    use pvbench_core::{FailureKind, Measurement};
    use pvbench_stats::{ConfidenceLevel, Sample, compute_statistics};

    let samples = vec![Sample::new(1_000_000, 1_000); 5];
    let measured = |convergence| {
        CaseStatus::Completed(Measurement {
            statistics: compute_statistics(&samples, ConfidenceLevel::P95),
            samples: samples.clone(),
            convergence,
            elapsed_ns: 5_000_000,
        })
    };

    SuiteResult::new(
        vec![
            CaseOutcome {
                name: "fast".into(),
                status: measured(Convergence::Converged),
            },
            CaseOutcome {
                name: "slow".into(),
                status: measured(Convergence::BudgetExhausted),
            },
            CaseOutcome {
                name: "broken".into(),
                status: CaseStatus::Failed {
                    kind: FailureKind::ReleaseProtocol,
                    message: "1 handle(s) still live after the invocation completed".into(),
                },
            },
            CaseOutcome {
                name: "array".into(),
                status: CaseStatus::Skipped {
                    reason: "20000 pushes exceed the adapter limit of 10000".into(),
                },
            },
        ],
        false,
    )
}
