#![warn(missing_docs)]
//! # pvbench
//!
//! Micro-benchmark harness comparing persistent vector implementations under
//! a single workload: push `0..N` onto an empty vector, keeping only the
//! newest version.
//!
//! - **Uniform adapters**: every backend implements `Adapter`; manually
//!   released backends get move-only handles, so the release protocol is
//!   enforced by the type system and re-checked at runtime
//! - **Convergent sampling**: adaptive batches until the Student-t relative
//!   margin of error reaches its target, or the per-case budget runs out
//! - **Cooperative runner**: cases run one at a time on a current-thread
//!   tokio runtime, yielding and honoring cancellation only between cases
//! - **Reports**: Benchmark.js-style console lines or a JSON report
//!
//! ## Quick Start
//!
//! ```ignore
//! use pvbench::prelude::*;
//!
//! let workload = AppendWorkload::new(1000);
//! let mut registry = CaseRegistry::new();
//! register_push_suite(&mut registry, workload)?;
//!
//! let runner = SuiteRunner::new(SamplerConfig::default());
//! let result = runner.run(&mut registry, &mut ConsoleReporter::stdout()).await;
//! println!("{:?}", result.fastest);
//! ```
//!
//! ## Custom Adapters
//!
//! ```ignore
//! struct MyVector;
//!
//! impl Adapter for MyVector {
//!     type Handle = my_crate::Vector<Element>;
//!     fn name(&self) -> &str { "my.Vector" }
//!     fn kind(&self) -> AdapterKind { AdapterKind::GcManaged }
//!     fn empty(&mut self) -> Self::Handle { my_crate::Vector::new() }
//!     fn push(&mut self, v: &Self::Handle, x: Element) -> Result<Self::Handle, AdapterError> {
//!         Ok(v.push(x))
//!     }
//!     fn materialize(&self, v: &Self::Handle) -> Result<Vec<Element>, AdapterError> {
//!         Ok(v.iter().copied().collect())
//!     }
//! }
//! ```

// Re-export core types
pub use pvbench_core::{
    Adapter, AdapterError, AdapterKind, AppendWorkload, CancelHandle, Case, CaseError,
    CaseOutcome, CaseRegistry, CaseStatus, Clock, Convergence, Element, EquivalenceError,
    FailureKind, Interrupt, Measurement, MonotonicClock, RegistryError, ReleaseProtocolViolation,
    Reporter, SamplerConfig, SuiteResult, SuiteRunner, check_equivalence, testing,
};

// Re-export adapters
pub use pvbench_adapters::{
    CopyArray, ImVector, PUSH_SUITE, Released, RpdsVector, RpdsVectorSync, register_push_suite,
};

// Re-export stats
pub use pvbench_stats::{CaseStatistics, ConfidenceLevel, Sample, compute_statistics};

// Re-export reporting
pub use pvbench_report::{
    ConsoleReporter, OutputFormat, Report, ReportConfig, build_report, generate_json_report,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Adapter, AdapterError, AdapterKind, AppendWorkload, CaseError, CaseRegistry,
        ConsoleReporter, Element, SamplerConfig, SuiteRunner, register_push_suite,
    };
}

/// Run the pvbench CLI harness.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     pvbench::run()
/// }
/// ```
pub use pvbench_cli::{run, run_with_registry};
