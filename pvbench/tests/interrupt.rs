//! Ctrl-C handling of the suite driver
//!
//! SIGINT is process-wide, so this lives in its own test binary with a
//! single test: nothing else may be running a suite when it is raised.

#![cfg(unix)]

use pvbench::testing::ConsListAdapter;
use pvbench::*;
use pvbench_cli::{Settings, run_suite};

fn settings() -> Settings {
    Settings {
        workload: AppendWorkload::new(16),
        sampler: SamplerConfig {
            sample_window_ns: 100_000,
            max_time_ns: 5_000_000,
            target_rme: 100.0,
            ..SamplerConfig::default()
        },
        format: OutputFormat::Human,
        output: None,
        pin_cpu: None,
        verify: false,
    }
}

/// `total` cases; the one at `interrupting` raises SIGINT on its first invocation
fn registry(total: usize, interrupting: usize) -> CaseRegistry {
    let workload = settings().workload;
    let mut registry = CaseRegistry::new();
    for index in 0..total {
        let name = format!("case-{index}");
        let mut adapter = ConsListAdapter::new(name.clone());
        let mut raised = index != interrupting;
        registry
            .register(name, move || {
                if !raised {
                    raised = true;
                    // SAFETY: raise delivers SIGINT to the calling thread only
                    unsafe { libc::raise(libc::SIGINT) };
                }
                Ok(workload.run(&mut adapter)?)
            })
            .unwrap();
    }
    registry
}

fn names(result: &SuiteResult) -> Vec<&str> {
    result.outcomes.iter().map(|o| o.name.as_str()).collect()
}

/// An interrupt finishes the current case, reports it, and runs no more
#[test]
fn test_ctrl_c_stops_after_current_case() {
    let result = run_suite(&settings(), registry(2, 0), &mut ()).unwrap();
    assert!(result.cancelled);
    assert_eq!(names(&result), ["case-0"]);
    assert!(result.outcomes[0].measurement().is_some());

    let result = run_suite(&settings(), registry(3, 1), &mut ()).unwrap();
    assert!(result.cancelled);
    assert_eq!(names(&result), ["case-0", "case-1"]);
    assert!(!result.has_failures());
    assert!(result.fastest.is_some());
}
