//! Sampler - The Convergence Loop
//!
//! Measures one case until its timing is trustworthy or its budget runs out.
//!
//! - One warm-up invocation, timed only to size the first batch
//! - Each sample times a batch of back-to-back invocations sized to fill the
//!   sample window, so the clock is read twice per batch, not per invocation
//! - After every sample, statistics are recomputed; the loop stops once the
//!   relative margin of error is within target and enough samples exist, or
//!   once the time budget is spent
//!
//! Nothing in here yields or awaits: a measurement window is never shared
//! with other work scheduled by the harness.

use crate::case::CaseError;
use crate::measure::Clock;
use pvbench_stats::{CaseStatistics, ConfidenceLevel, Sample, compute_statistics};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default duration of one sample window (50ms)
pub const DEFAULT_SAMPLE_WINDOW_NS: u64 = 50_000_000;

/// Default minimum number of samples before convergence is accepted
pub const DEFAULT_MIN_SAMPLES: usize = 5;

/// Fewest samples that can produce a finite margin of error
pub const MIN_SAMPLE_COUNT: usize = 2;

/// Default relative margin of error target, percent
pub const DEFAULT_TARGET_RME: f64 = 1.0;

/// Default per-case time budget (5s)
pub const DEFAULT_MAX_TIME_NS: u64 = 5_000_000_000;

/// Invalid sampler settings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplerConfigError {
    /// The sample window must be positive
    #[error("sample window must be greater than zero")]
    ZeroWindow,

    /// The per-case budget must be positive
    #[error("per-case time budget must be greater than zero")]
    ZeroBudget,

    /// The margin target must be a finite, non-negative percentage
    #[error("target margin of error must be a non-negative percentage, got {0}")]
    InvalidTarget(f64),
}

/// Convergence settings for one case
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Target duration of each sample in nanoseconds
    pub sample_window_ns: u64,
    /// Minimum samples before the margin target can end sampling
    pub min_samples: usize,
    /// Relative margin of error target, percent
    pub target_rme: f64,
    /// Wall-clock budget for the sampling phase of one case, nanoseconds
    pub max_time_ns: u64,
    /// Confidence level of the margin of error
    pub confidence_level: ConfidenceLevel,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_window_ns: DEFAULT_SAMPLE_WINDOW_NS,
            min_samples: DEFAULT_MIN_SAMPLES,
            target_rme: DEFAULT_TARGET_RME,
            max_time_ns: DEFAULT_MAX_TIME_NS,
            confidence_level: ConfidenceLevel::default(),
        }
    }
}

impl SamplerConfig {
    /// Reject settings the loop cannot honor
    pub fn validate(&self) -> Result<(), SamplerConfigError> {
        if self.sample_window_ns == 0 {
            return Err(SamplerConfigError::ZeroWindow);
        }
        if self.max_time_ns == 0 {
            return Err(SamplerConfigError::ZeroBudget);
        }
        if !self.target_rme.is_finite() || self.target_rme < 0.0 {
            return Err(SamplerConfigError::InvalidTarget(self.target_rme));
        }
        Ok(())
    }

    /// Minimum sample count actually enforced
    pub fn effective_min_samples(&self) -> usize {
        self.min_samples.max(MIN_SAMPLE_COUNT)
    }
}

/// How a case's sampling ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Convergence {
    /// Margin of error reached the target
    Converged,
    /// Time budget ran out first; statistics are best-effort
    BudgetExhausted,
}

/// Frozen result of sampling one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Statistics over all samples
    pub statistics: CaseStatistics,
    /// Raw samples in collection order
    pub samples: Vec<Sample>,
    /// Why sampling stopped
    pub convergence: Convergence,
    /// Nanoseconds spent sampling (warm-up excluded)
    pub elapsed_ns: u64,
}

impl Measurement {
    /// Whether the margin target was missed
    pub fn is_low_confidence(&self) -> bool {
        self.convergence == Convergence::BudgetExhausted
    }
}

/// Accumulates samples for one case
pub struct Sampler<C> {
    clock: C,
    config: SamplerConfig,
    samples: Vec<Sample>,
    statistics: CaseStatistics,
    iters_per_sample: u64,
    started_at: Option<u64>,
}

impl<C: Clock> Sampler<C> {
    /// Sampler reading time from `clock`
    pub fn new(clock: C, config: SamplerConfig) -> Self {
        Self {
            clock,
            config,
            samples: Vec::new(),
            statistics: compute_statistics(&[], config.confidence_level),
            iters_per_sample: 1,
            started_at: None,
        }
    }

    /// Run the case once, untimed for reporting, to size the first batch
    pub fn warm_up<F>(&mut self, run: &mut F) -> Result<(), CaseError>
    where
        F: FnMut() -> Result<(), CaseError>,
    {
        let start = self.clock.now_nanos();
        run()?;
        let elapsed = self.clock.now_nanos().saturating_sub(start);
        self.iters_per_sample = self.batch_size_for(elapsed as f64);
        Ok(())
    }

    /// Time one batch of invocations and fold it into the statistics
    pub fn take_sample<F>(&mut self, run: &mut F) -> Result<&CaseStatistics, CaseError>
    where
        F: FnMut() -> Result<(), CaseError>,
    {
        let iterations = self.iters_per_sample;
        let start = self.clock.now_nanos();
        self.started_at.get_or_insert(start);

        for _ in 0..iterations {
            run()?;
        }

        let elapsed = self.clock.now_nanos().saturating_sub(start);
        let sample = Sample::new(elapsed, iterations);
        self.samples.push(sample);
        self.statistics = compute_statistics(&self.samples, self.config.confidence_level);
        self.iters_per_sample = self.batch_size_for(sample.period_nanos());

        tracing::trace!(
            sample = self.samples.len(),
            iterations,
            elapsed_ns = elapsed,
            rme = self.statistics.rme,
            "sample taken"
        );

        Ok(&self.statistics)
    }

    /// `Some` once sampling should stop
    pub fn convergence(&self) -> Option<Convergence> {
        if self.samples.len() >= self.config.effective_min_samples()
            && self.statistics.within_margin(self.config.target_rme)
        {
            return Some(Convergence::Converged);
        }
        if self.elapsed_ns() >= self.config.max_time_ns {
            return Some(Convergence::BudgetExhausted);
        }
        None
    }

    /// Samples collected so far
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Statistics over the samples collected so far
    pub fn statistics(&self) -> &CaseStatistics {
        &self.statistics
    }

    /// Invocations the next sample will time
    pub fn iters_per_sample(&self) -> u64 {
        self.iters_per_sample
    }

    /// Nanoseconds since the first sample started
    pub fn elapsed_ns(&self) -> u64 {
        self.started_at
            .map(|start| self.clock.now_nanos().saturating_sub(start))
            .unwrap_or(0)
    }

    /// Freeze the samples into a measurement
    pub fn finish(self, convergence: Convergence) -> Measurement {
        let elapsed_ns = self.elapsed_ns();
        Measurement {
            statistics: self.statistics,
            samples: self.samples,
            convergence,
            elapsed_ns,
        }
    }

    /// Invocations needed to fill one window at `period` ns each.
    /// A single invocation longer than the window is sampled alone.
    fn batch_size_for(&self, period: f64) -> u64 {
        if period <= 0.0 {
            return 1;
        }
        ((self.config.sample_window_ns as f64 / period).ceil() as u64).max(1)
    }
}

/// Run the full sampling loop: warm-up → samples until convergence → finish
///
/// Any error from `run` aborts the remaining samples.
pub fn run_sampling_loop<C, F>(
    clock: C,
    config: &SamplerConfig,
    mut run: F,
) -> Result<Measurement, CaseError>
where
    C: Clock,
    F: FnMut() -> Result<(), CaseError>,
{
    let mut sampler = Sampler::new(clock, *config);
    sampler.warm_up(&mut run)?;

    loop {
        sampler.take_sample(&mut run)?;
        if let Some(convergence) = sampler.convergence() {
            return Ok(sampler.finish(convergence));
        }
    }
}
