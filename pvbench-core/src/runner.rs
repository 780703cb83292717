//! Suite Runner
//!
//! Drives the registered cases one at a time, in registration order. The
//! only suspension point is between cases: a case's measurement runs
//! synchronously from warm-up to its last sample. Cancellation is observed
//! at the same boundary, so a cancelled suite always reports whole cases.

use crate::case::{Case, CaseError, FailureKind};
use crate::measure::{Clock, MonotonicClock};
use crate::registry::CaseRegistry;
use crate::sampler::{Measurement, SamplerConfig, run_sampling_loop};
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

/// Receives results as the suite progresses.
///
/// Every method has an empty default, so a reporter implements only what
/// it prints.
pub trait Reporter {
    /// Called once before the first case with the number of cases
    fn suite_started(&mut self, _cases: usize) {}

    /// Called after each case, in registration order
    fn case_finished(&mut self, _outcome: &CaseOutcome) {}

    /// Called once after the last case ran or the suite was cancelled
    fn suite_finished(&mut self, _result: &SuiteResult) {}
}

/// Discards everything
impl Reporter for () {}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn suite_started(&mut self, cases: usize) {
        (**self).suite_started(cases)
    }

    fn case_finished(&mut self, outcome: &CaseOutcome) {
        (**self).case_finished(outcome)
    }

    fn suite_finished(&mut self, result: &SuiteResult) {
        (**self).suite_finished(result)
    }
}

/// What happened to one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum CaseStatus {
    /// Measured; statistics may be low-confidence
    Completed(Measurement),
    /// An invocation failed; remaining samples were abandoned
    Failed {
        /// Failure category
        kind: FailureKind,
        /// Human-readable cause
        message: String,
    },
    /// Not measured
    Skipped {
        /// Why the case was not measured
        reason: String,
    },
}

/// Result of one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOutcome {
    /// Case name
    pub name: String,
    /// Outcome
    #[serde(flatten)]
    pub status: CaseStatus,
}

impl CaseOutcome {
    /// Measurement, for completed cases
    pub fn measurement(&self) -> Option<&Measurement> {
        match &self.status {
            CaseStatus::Completed(measurement) => Some(measurement),
            _ => None,
        }
    }

    /// Whether the case failed
    pub fn is_failed(&self) -> bool {
        matches!(self.status, CaseStatus::Failed { .. })
    }

    /// Operations per second, for completed cases
    pub fn ops_per_sec(&self) -> Option<f64> {
        self.measurement().map(|m| m.statistics.ops_per_sec)
    }
}

/// Outcome of a whole suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Per-case outcomes in registration order
    pub outcomes: Vec<CaseOutcome>,
    /// Name of the completed case with the highest ops/sec
    pub fastest: Option<String>,
    /// Whether the suite stopped early
    pub cancelled: bool,
}

impl SuiteResult {
    /// Assemble a result, picking the fastest completed case.
    /// Ties keep the earlier case.
    pub fn new(outcomes: Vec<CaseOutcome>, cancelled: bool) -> Self {
        let mut fastest: Option<(&str, f64)> = None;
        for outcome in &outcomes {
            if let Some(ops) = outcome.ops_per_sec() {
                match fastest {
                    Some((_, best)) if ops <= best => {}
                    _ => fastest = Some((outcome.name.as_str(), ops)),
                }
            }
        }
        let fastest = fastest.map(|(name, _)| name.to_string());

        Self {
            outcomes,
            fastest,
            cancelled,
        }
    }

    /// Outcome of the named case
    pub fn get(&self, name: &str) -> Option<&CaseOutcome> {
        self.outcomes.iter().find(|outcome| outcome.name == name)
    }

    /// Whether any case failed
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(CaseOutcome::is_failed)
    }

    /// Number of failed cases
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }
}

/// Requests that a running suite stop before its next case
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Handle that is not yet cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the suite at the next case boundary
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Stop requests from outside the suite, such as an OS interrupt.
///
/// Polled at every case boundary after the runner has yielded to the
/// runtime, so an event that arrived while the previous case was measuring
/// has already been delivered.
pub trait Interrupt {
    /// `true` if the suite should stop before the next case
    fn poll_interrupt(&mut self, cx: &mut Context<'_>) -> bool;
}

/// Never interrupts
impl Interrupt for () {
    fn poll_interrupt(&mut self, _cx: &mut Context<'_>) -> bool {
        false
    }
}

/// Sequential, cancellable runner
pub struct SuiteRunner<C = MonotonicClock> {
    clock: C,
    config: SamplerConfig,
    cancel: CancelHandle,
}

impl SuiteRunner<MonotonicClock> {
    /// Runner timing with the monotonic wall clock
    pub fn new(config: SamplerConfig) -> Self {
        Self::with_clock(MonotonicClock::new(), config)
    }
}

impl<C: Clock> SuiteRunner<C> {
    /// Runner timing with `clock`
    pub fn with_clock(clock: C, config: SamplerConfig) -> Self {
        Self {
            clock,
            config,
            cancel: CancelHandle::new(),
        }
    }

    /// Sampler settings applied to every case
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Handle for cancelling this runner's suite
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run every case in `registry`, reporting each outcome as it lands
    pub async fn run<R>(&self, registry: &mut CaseRegistry, reporter: &mut R) -> SuiteResult
    where
        R: Reporter + ?Sized,
    {
        self.run_until(registry, reporter, &mut ()).await
    }

    /// Like [`run`](Self::run), additionally stopping at the first case
    /// boundary where `interrupt` fires
    pub async fn run_until<R, I>(
        &self,
        registry: &mut CaseRegistry,
        reporter: &mut R,
        interrupt: &mut I,
    ) -> SuiteResult
    where
        R: Reporter + ?Sized,
        I: Interrupt + ?Sized,
    {
        tracing::info!(cases = registry.len(), "suite started");
        reporter.suite_started(registry.len());

        let mut outcomes = Vec::with_capacity(registry.len());
        let mut cancelled = false;

        for case in registry.iter_mut() {
            tokio::task::yield_now().await;
            if std::future::poll_fn(|cx| Poll::Ready(interrupt.poll_interrupt(cx))).await {
                tracing::warn!("interrupt received, stopping before the next case");
                self.cancel.cancel();
            }
            if self.cancel.is_cancelled() {
                tracing::info!(remaining = case.name(), "suite cancelled");
                cancelled = true;
                break;
            }

            let outcome = self.run_case(case);
            reporter.case_finished(&outcome);
            outcomes.push(outcome);
        }

        let result = SuiteResult::new(outcomes, cancelled);
        tracing::info!(
            completed = result.outcomes.len(),
            failed = result.failure_count(),
            fastest = result.fastest.as_deref().unwrap_or("-"),
            cancelled,
            "suite finished"
        );
        reporter.suite_finished(&result);
        result
    }

    /// Measure a single case
    pub fn run_case(&self, case: &mut Case) -> CaseOutcome {
        let name = case.name().to_string();

        if let Some(reason) = case.skip_reason() {
            tracing::info!(case = %name, reason, "case skipped");
            return CaseOutcome {
                name,
                status: CaseStatus::Skipped {
                    reason: reason.to_string(),
                },
            };
        }

        tracing::debug!(case = %name, "measuring case");
        let result = catch_unwind(AssertUnwindSafe(|| {
            run_sampling_loop(&self.clock, &self.config, || case.run())
        }));

        let status = match result {
            Ok(Ok(measurement)) => {
                if measurement.is_low_confidence() {
                    tracing::warn!(
                        case = %name,
                        rme = measurement.statistics.rme,
                        samples = measurement.samples.len(),
                        "time budget exhausted before the margin target was reached"
                    );
                } else {
                    tracing::debug!(
                        case = %name,
                        ops_per_sec = measurement.statistics.ops_per_sec,
                        rme = measurement.statistics.rme,
                        "case converged"
                    );
                }
                CaseStatus::Completed(measurement)
            }
            Ok(Err(err)) => failed(&name, err),
            Err(panic) => {
                let message = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                failed(&name, CaseError::Panicked(message))
            }
        };

        CaseOutcome { name, status }
    }
}

fn failed(name: &str, err: CaseError) -> CaseStatus {
    tracing::warn!(case = name, kind = %err.kind(), %err, "case failed");
    let message = match &err {
        CaseError::Panicked(message) => message.clone(),
        other => other.to_string(),
    };
    CaseStatus::Failed {
        kind: err.kind(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ConsListAdapter, CountingAdapter, TickClock};
    use crate::workload::AppendWorkload;

    /// One push costs 1µs, so an invocation of 1000 pushes fills a 1ms window
    fn scenario_config() -> SamplerConfig {
        SamplerConfig {
            sample_window_ns: 1_000_000,
            max_time_ns: 1_000_000_000,
            ..SamplerConfig::default()
        }
    }

    #[derive(Default)]
    struct Recorder {
        started: Option<usize>,
        finished: Vec<String>,
        cancel_after: Option<(usize, CancelHandle)>,
        summary: Option<SuiteResult>,
    }

    impl Reporter for Recorder {
        fn suite_started(&mut self, cases: usize) {
            self.started = Some(cases);
        }

        fn case_finished(&mut self, outcome: &CaseOutcome) {
            self.finished.push(outcome.name.clone());
            if let Some((after, handle)) = &self.cancel_after {
                if self.finished.len() == *after {
                    handle.cancel();
                }
            }
        }

        fn suite_finished(&mut self, result: &SuiteResult) {
            self.summary = Some(result.clone());
        }
    }

    fn timed_registry(clock: &TickClock, names: &[&str]) -> CaseRegistry {
        let mut registry = CaseRegistry::new();
        for name in names {
            let adapter = ConsListAdapter::new(*name).with_clock(clock.clone(), 1_000);
            registry
                .register_adapter(adapter, AppendWorkload::default())
                .unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_fastest_tie_goes_to_first_registered() {
        let clock = TickClock::new();
        let mut registry = timed_registry(&clock, &["A"]);

        let mut slow = ConsListAdapter::new("B").with_clock(clock.clone(), 1_000);
        let workload = AppendWorkload::default();
        registry
            .register("B", move || {
                workload.run(&mut slow)?;
                workload.run(&mut slow)?;
                Ok(())
            })
            .unwrap();

        let adapter = ConsListAdapter::new("C").with_clock(clock.clone(), 1_000);
        registry.register_adapter(adapter, workload).unwrap();

        let runner = SuiteRunner::with_clock(clock.clone(), scenario_config());
        let mut recorder = Recorder::default();
        let result = runner.run(&mut registry, &mut recorder).await;

        assert_eq!(recorder.started, Some(3));
        assert_eq!(recorder.finished, vec!["A", "B", "C"]);
        assert_eq!(recorder.summary.as_ref(), Some(&result));

        let ops = |name| result.get(name).unwrap().ops_per_sec().unwrap();
        assert_eq!(ops("A"), 1_000.0);
        assert_eq!(ops("B"), 500.0);
        assert_eq!(ops("C"), 1_000.0);
        assert_eq!(result.fastest.as_deref(), Some("A"));
        assert!(!result.cancelled);
    }

    #[tokio::test]
    async fn test_failing_case_does_not_stop_suite() {
        let clock = TickClock::new();
        let mut registry = timed_registry(&clock, &["before"]);
        registry
            .register("broken", || Err(CaseError::execution("always fails")))
            .unwrap();
        registry
            .register("panics", || -> Result<(), CaseError> { panic!("boom") })
            .unwrap();
        registry
            .add(Case::from_adapter(
                CountingAdapter::new("leaky").ignoring_releases(),
                AppendWorkload::new(3),
            ))
            .unwrap();
        registry
            .add(Case::from_adapter(
                ConsListAdapter::new("after").with_clock(clock.clone(), 1_000),
                AppendWorkload::default(),
            ))
            .unwrap();

        let runner = SuiteRunner::with_clock(clock.clone(), scenario_config());
        let result = runner.run(&mut registry, &mut ()).await;

        assert_eq!(result.outcomes.len(), 5);
        assert!(result.get("before").unwrap().measurement().is_some());
        assert!(result.get("after").unwrap().measurement().is_some());
        assert_eq!(
            result.get("broken").unwrap().status,
            CaseStatus::Failed {
                kind: FailureKind::Execution,
                message: "always fails".into(),
            }
        );
        assert_eq!(
            result.get("panics").unwrap().status,
            CaseStatus::Failed {
                kind: FailureKind::Panicked,
                message: "boom".into(),
            }
        );
        assert!(matches!(
            result.get("leaky").unwrap().status,
            CaseStatus::Failed {
                kind: FailureKind::ReleaseProtocol,
                ..
            }
        ));
        assert!(result.has_failures());
        assert_eq!(result.failure_count(), 3);
        assert_eq!(result.fastest.as_deref(), Some("before"));
    }

    #[tokio::test]
    async fn test_cancellation_between_cases() {
        let clock = TickClock::new();
        let mut registry = timed_registry(&clock, &["first", "second", "third"]);
        let runner = SuiteRunner::with_clock(clock.clone(), scenario_config());

        let mut recorder = Recorder {
            cancel_after: Some((1, runner.cancel_handle())),
            ..Recorder::default()
        };
        let result = runner.run(&mut registry, &mut recorder).await;

        assert!(result.cancelled);
        assert_eq!(recorder.finished, vec!["first"]);
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.fastest.as_deref(), Some("first"));
        assert_eq!(recorder.summary, Some(result));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let clock = TickClock::new();
        let mut registry = timed_registry(&clock, &["only"]);
        let runner = SuiteRunner::with_clock(clock, scenario_config());
        runner.cancel_handle().cancel();

        let result = runner.run(&mut registry, &mut ()).await;
        assert!(result.cancelled);
        assert!(result.outcomes.is_empty());
        assert_eq!(result.fastest, None);
    }

    #[tokio::test]
    async fn test_skipped_case_is_not_measured() {
        let clock = TickClock::new();
        let mut registry = CaseRegistry::new();
        let adapter = ConsListAdapter::new("bounded")
            .with_clock(clock.clone(), 1_000)
            .with_max_len(10);
        registry
            .register_adapter(adapter, AppendWorkload::new(11))
            .unwrap();

        let runner = SuiteRunner::with_clock(clock.clone(), scenario_config());
        let result = runner.run(&mut registry, &mut ()).await;

        assert_eq!(clock.now_nanos(), 0);
        assert_eq!(
            result.outcomes[0].status,
            CaseStatus::Skipped {
                reason: "11 pushes exceed the adapter limit of 10".into(),
            }
        );
        assert_eq!(result.fastest, None);
        assert!(!result.has_failures());
    }

    /// Fires on the given poll, counting from one
    struct FireOnPoll {
        polls: usize,
        fire_at: usize,
    }

    impl Interrupt for FireOnPoll {
        fn poll_interrupt(&mut self, _cx: &mut Context<'_>) -> bool {
            self.polls += 1;
            self.polls == self.fire_at
        }
    }

    #[tokio::test]
    async fn test_interrupt_polled_before_every_case() {
        let clock = TickClock::new();
        let mut registry = timed_registry(&clock, &["first", "second", "third"]);
        let runner = SuiteRunner::with_clock(clock.clone(), scenario_config());

        let mut interrupt = FireOnPoll {
            polls: 0,
            fire_at: 2,
        };
        let result = runner
            .run_until(&mut registry, &mut (), &mut interrupt)
            .await;

        assert!(result.cancelled);
        assert_eq!(interrupt.polls, 2);
        assert_eq!(result.outcomes.len(), 1);
        assert!(runner.cancel_handle().is_cancelled());
    }

    #[tokio::test]
    async fn test_interrupt_before_first_case_runs_nothing() {
        let clock = TickClock::new();
        let mut registry = timed_registry(&clock, &["only"]);
        let runner = SuiteRunner::with_clock(clock.clone(), scenario_config());

        let mut interrupt = FireOnPoll {
            polls: 0,
            fire_at: 1,
        };
        let result = runner
            .run_until(&mut registry, &mut (), &mut interrupt)
            .await;

        assert!(result.cancelled);
        assert!(result.outcomes.is_empty());
        assert_eq!(clock.now_nanos(), 0);
    }

    #[test]
    fn test_single_sample_result_survives_json() {
        use pvbench_stats::{ConfidenceLevel, Sample, compute_statistics};

        let samples = vec![Sample::new(2_000, 2)];
        let outcome = CaseOutcome {
            name: "once".into(),
            status: CaseStatus::Completed(Measurement {
                statistics: compute_statistics(&samples, ConfidenceLevel::P95),
                samples,
                convergence: crate::sampler::Convergence::BudgetExhausted,
                elapsed_ns: 2_000,
            }),
        };
        let result = SuiteResult::new(vec![outcome], false);

        let json = serde_json::to_string(&result).unwrap();
        let back: SuiteResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert!(back.outcomes[0].measurement().unwrap().statistics.rme.is_infinite());
    }

    #[test]
    fn test_suite_result_fastest_ignores_non_completed() {
        let skipped = CaseOutcome {
            name: "skipped".into(),
            status: CaseStatus::Skipped {
                reason: "n/a".into(),
            },
        };
        let result = SuiteResult::new(vec![skipped], false);
        assert_eq!(result.fastest, None);
        assert!(result.get("skipped").is_some());
        assert!(result.get("missing").is_none());
    }
}
