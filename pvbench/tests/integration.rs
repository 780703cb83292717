//! Integration tests for pvbench

use pvbench::testing::{ConsListAdapter, CountingAdapter, TickClock};
use pvbench::*;
use pvbench_core::Sampler;

/// 1µs per push: 1000 pushes fill a 1ms window exactly once
fn scenario_config() -> SamplerConfig {
    SamplerConfig {
        sample_window_ns: 1_000_000,
        max_time_ns: 1_000_000_000,
        ..SamplerConfig::default()
    }
}

/// Manual adapters leave nothing outstanding, for every length including 0
#[test]
fn test_leak_freedom() {
    for len in [0, 1, 2, 5, 64, 1000] {
        let workload = AppendWorkload::new(len);

        let mut counting = CountingAdapter::new("counting");
        workload.run(&mut counting).unwrap();
        assert_eq!(counting.outstanding(), Some(0), "counting, len {len}");

        let mut rpds = Released::new(RpdsVector);
        workload.run(&mut rpds).unwrap();
        assert_eq!(rpds.outstanding(), Some(0), "rpds, len {len}");

        let mut im = Released::new(ImVector);
        workload.run(&mut im).unwrap();
        assert_eq!(im.outstanding(), Some(0), "im, len {len}");
    }
}

/// Five pushes: five superseded handles plus the final one, each released once
#[test]
fn test_release_protocol_five_pushes() {
    let mut adapter = CountingAdapter::new("counting");
    AppendWorkload::new(5).run(&mut adapter).unwrap();

    assert_eq!(adapter.handles_created(), 6);
    assert_eq!(adapter.releases(), 6);
    assert_eq!(adapter.release_counts().len(), 6);
    assert!(adapter.release_counts().values().all(|&count| count == 1));
    assert_eq!(adapter.outstanding(), Some(0));
}

/// Every adapter materializes 0..N-1
#[test]
fn test_cross_implementation_equivalence() {
    for len in [0, 1, 32, 1000] {
        let workload = AppendWorkload::new(len);
        let mut registry = CaseRegistry::new();
        register_push_suite(&mut registry, workload).unwrap();
        registry
            .register_adapter(CountingAdapter::new("counting-Released"), workload)
            .unwrap();

        assert_eq!(
            check_equivalence(&mut registry, workload),
            Ok(PUSH_SUITE.len() + 1)
        );
    }

    let mut array = CopyArray::new();
    assert_eq!(
        AppendWorkload::new(4).materialize(&mut array).unwrap(),
        vec![0, 1, 2, 3]
    );
}

/// Iteration order is registration order, and stays so
#[test]
fn test_registry_order_is_repeatable() {
    let mut registry = CaseRegistry::new();
    register_push_suite(&mut registry, AppendWorkload::new(10)).unwrap();

    let first: Vec<String> = registry.names().map(str::to_string).collect();
    let second: Vec<String> = registry.iter().map(|case| case.name().to_string()).collect();
    assert_eq!(first, PUSH_SUITE);
    assert_eq!(first, second);
}

/// A duplicate name is rejected and the first registration survives
#[test]
fn test_duplicate_keeps_first() {
    let workload = AppendWorkload::new(20);
    let mut registry = CaseRegistry::new();
    registry
        .register_adapter(ConsListAdapter::new("dup").with_max_len(10), workload)
        .unwrap();

    let err = registry
        .register_adapter(ConsListAdapter::new("dup"), workload)
        .unwrap_err();
    assert_eq!(err, RegistryError::DuplicateName("dup".into()));
    assert_eq!(registry.len(), 1);
    assert!(registry.get("dup").unwrap().skip_reason().is_some());
}

/// Relative margin never grows while a deterministic case is sampled
#[test]
fn test_margin_non_increasing() {
    let clock = TickClock::new();
    let config = SamplerConfig {
        sample_window_ns: 10_000,
        max_time_ns: u64::MAX,
        ..SamplerConfig::default()
    };
    let mut adapter = ConsListAdapter::new("cons").with_clock(clock.clone(), 3);
    let workload = AppendWorkload::new(100);
    let mut run = || workload.run(&mut adapter).map_err(CaseError::from);

    let mut sampler = Sampler::new(&clock, config);
    sampler.warm_up(&mut run).unwrap();
    let mut previous = f64::INFINITY;
    for _ in 0..12 {
        let rme = sampler.take_sample(&mut run).unwrap().rme;
        assert!(rme >= 0.0);
        assert!(rme <= previous);
        previous = rme;
    }
}

/// A and C equally fast, B half as fast: A wins by registration order
#[tokio::test]
async fn test_abc_scenario() {
    let clock = TickClock::new();
    let workload = AppendWorkload::default();
    let mut registry = CaseRegistry::new();
    registry
        .register_adapter(
            ConsListAdapter::new("A").with_clock(clock.clone(), 1_000),
            workload,
        )
        .unwrap();
    let mut b = ConsListAdapter::new("B").with_clock(clock.clone(), 2_000);
    registry
        .register("B", move || Ok(workload.run(&mut b)?))
        .unwrap();
    registry
        .register_adapter(
            ConsListAdapter::new("C").with_clock(clock.clone(), 1_000),
            workload,
        )
        .unwrap();

    let runner = SuiteRunner::with_clock(clock, scenario_config());
    let result = runner.run(&mut registry, &mut ()).await;

    let ops = |name: &str| result.get(name).unwrap().ops_per_sec().unwrap();
    assert!(ops("B") < ops("A"));
    assert!(ops("B") < ops("C"));
    assert_eq!(ops("A"), ops("C"));
    assert_eq!(result.fastest.as_deref(), Some("A"));

    let report = build_report(&result, ReportConfig::new(workload.len(), runner.config()));
    let text = pvbench_report::format_human_output(&report);
    assert!(text.contains("A x 1,000 ops/sec ±0.00% (5 runs sampled)"));
    assert!(text.ends_with("Fastest is A\n"));
}

/// One case always fails; the others still get statistics
#[tokio::test]
async fn test_failing_case_isolated() {
    let clock = TickClock::new();
    let workload = AppendWorkload::default();
    let mut registry = CaseRegistry::new();
    registry
        .register_adapter(
            ConsListAdapter::new("ok-1").with_clock(clock.clone(), 1_000),
            workload,
        )
        .unwrap();
    registry
        .register_adapter(CountingAdapter::new("faulty").fail_push_at(3), workload)
        .unwrap();
    registry
        .register_adapter(
            ConsListAdapter::new("ok-2").with_clock(clock.clone(), 1_000),
            workload,
        )
        .unwrap();

    let runner = SuiteRunner::with_clock(clock, scenario_config());
    let mut console = ConsoleReporter::new(Vec::new());
    let result = runner.run(&mut registry, &mut console).await;

    assert_eq!(result.outcomes.len(), 3);
    assert_eq!(result.failure_count(), 1);
    assert!(result.get("faulty").unwrap().is_failed());
    assert!(result.get("ok-1").unwrap().measurement().is_some());
    assert!(result.get("ok-2").unwrap().measurement().is_some());

    let output = String::from_utf8(console.into_inner()).unwrap();
    let lines: Vec<_> = output.lines().collect();
    assert!(lines[1].starts_with("faulty: FAILED (execution)"), "{output}");
    assert_eq!(lines.last().copied(), Some("Fastest is ok-1"));
}

/// Cancelling mid-suite keeps the finished cases and runs no more
#[tokio::test]
async fn test_cancelled_suite_reports_partial_result() {
    struct CancelAfterFirst(CancelHandle);

    impl Reporter for CancelAfterFirst {
        fn case_finished(&mut self, _outcome: &CaseOutcome) {
            self.0.cancel();
        }
    }

    let clock = TickClock::new();
    let workload = AppendWorkload::default();
    let mut registry = CaseRegistry::new();
    for name in ["first", "second"] {
        registry
            .register_adapter(
                ConsListAdapter::new(name).with_clock(clock.clone(), 1_000),
                workload,
            )
            .unwrap();
    }

    let runner = SuiteRunner::with_clock(clock, scenario_config());
    let mut reporter = CancelAfterFirst(runner.cancel_handle());
    let result = runner.run(&mut registry, &mut reporter).await;

    assert!(result.cancelled);
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.fastest.as_deref(), Some("first"));

    let report = build_report(&result, ReportConfig::new(workload.len(), runner.config()));
    assert!(report.cancelled);
    assert_eq!(report.summary.total_cases, 1);
}

/// The real push suite runs end to end on the wall clock and reports as JSON
#[tokio::test]
async fn test_push_suite_end_to_end() {
    let workload = AppendWorkload::new(100);
    let mut registry = CaseRegistry::new();
    register_push_suite(&mut registry, workload).unwrap();

    let config = SamplerConfig {
        sample_window_ns: 100_000,
        max_time_ns: 20_000_000,
        ..SamplerConfig::default()
    };
    let runner = SuiteRunner::new(config);
    let result = runner.run(&mut registry, &mut ()).await;

    assert!(!result.has_failures());
    assert_eq!(result.outcomes.len(), PUSH_SUITE.len());
    for outcome in &result.outcomes {
        assert!(outcome.ops_per_sec().unwrap() > 0.0, "{}", outcome.name);
    }
    assert!(result.fastest.is_some());

    let report = build_report(&result, ReportConfig::new(workload.len(), &config));
    let json = generate_json_report(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["meta"]["config"]["len"], 100);
    assert_eq!(value["results"].as_array().unwrap().len(), PUSH_SUITE.len());
    assert_eq!(value["results"][0]["name"], "rpds.Vector");
}
