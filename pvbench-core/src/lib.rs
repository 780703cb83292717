#![warn(missing_docs)]
//! pvbench Core - Harness Runtime
//!
//! Everything between a persistent vector implementation and a set of
//! numbers:
//! - `Adapter`: the uniform push/release contract a backend implements
//! - `AppendWorkload`: N sequential pushes under the release protocol
//! - `CaseRegistry`: ordered, uniquely named benchmark cases
//! - `Sampler`: warm-up, adaptive batches and margin-of-error convergence
//! - `SuiteRunner`: sequential async driver with cancellation and a
//!   `Reporter` seam
//! - `check_equivalence`: verifies every adapter builds the same vector

mod adapter;
mod case;
mod measure;
mod registry;
mod runner;
mod sampler;
mod verify;
mod workload;

pub mod testing;

pub use adapter::{Adapter, AdapterError, AdapterKind, Element, ReleaseProtocolViolation};
pub use case::{Case, CaseError, FailureKind};
pub use measure::{Clock, MonotonicClock, pin_to_cpu};
pub use registry::{CaseRegistry, RegistryError};
pub use runner::{
    CancelHandle, CaseOutcome, CaseStatus, Interrupt, Reporter, SuiteResult, SuiteRunner,
};
pub use sampler::{
    Convergence, DEFAULT_MAX_TIME_NS, DEFAULT_MIN_SAMPLES, DEFAULT_SAMPLE_WINDOW_NS,
    DEFAULT_TARGET_RME, MIN_SAMPLE_COUNT, Measurement, Sampler, SamplerConfig, SamplerConfigError,
    run_sampling_loop,
};
pub use verify::{EquivalenceError, EquivalenceMismatch, MismatchDetail, check_equivalence};
pub use workload::{AppendWorkload, DEFAULT_WORKLOAD_LEN};
