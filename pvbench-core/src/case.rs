//! Benchmark Cases
//!
//! A case is a named, self-contained unit of work. Cases built from an
//! adapter own that adapter and run the append workload against it; after
//! every invocation the adapter's live-handle count must be back to zero.

use crate::adapter::{Adapter, AdapterError, AdapterKind, Element, ReleaseProtocolViolation};
use crate::workload::AppendWorkload;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Failure of one case invocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseError {
    /// A manually-released handle was misused or leaked
    #[error("release protocol violation: {0}")]
    ReleaseProtocol(ReleaseProtocolViolation),

    /// The case body reported an error
    #[error("{0}")]
    Execution(String),

    /// The case body panicked
    #[error("panicked: {0}")]
    Panicked(String),
}

impl CaseError {
    /// Execution failure with a message
    pub fn execution(message: impl std::fmt::Display) -> Self {
        CaseError::Execution(message.to_string())
    }

    /// Category used in reports
    pub fn kind(&self) -> FailureKind {
        match self {
            CaseError::ReleaseProtocol(_) => FailureKind::ReleaseProtocol,
            CaseError::Execution(_) => FailureKind::Execution,
            CaseError::Panicked(_) => FailureKind::Panicked,
        }
    }
}

impl From<AdapterError> for CaseError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Protocol(violation) => CaseError::ReleaseProtocol(violation),
            other => CaseError::Execution(other.to_string()),
        }
    }
}

impl From<ReleaseProtocolViolation> for CaseError {
    fn from(violation: ReleaseProtocolViolation) -> Self {
        CaseError::ReleaseProtocol(violation)
    }
}

/// Failure categories reported per case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Release protocol violation
    ReleaseProtocol,
    /// Case body returned an error
    Execution,
    /// Case body panicked
    Panicked,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::ReleaseProtocol => write!(f, "release protocol"),
            FailureKind::Execution => write!(f, "execution"),
            FailureKind::Panicked => write!(f, "panic"),
        }
    }
}

type RunFn = Box<dyn FnMut() -> Result<(), CaseError>>;
type MaterializeFn = Box<dyn FnMut() -> Result<Vec<Element>, CaseError>>;

/// One named benchmark case
pub struct Case {
    name: String,
    kind: Option<AdapterKind>,
    skip_reason: Option<String>,
    run: RunFn,
    materialize: Option<MaterializeFn>,
}

impl Case {
    /// Case from an arbitrary body
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: FnMut() -> Result<(), CaseError> + 'static,
    {
        Self {
            name: name.into(),
            kind: None,
            skip_reason: None,
            run: Box::new(run),
            materialize: None,
        }
    }

    /// Case running `workload` against `adapter`, named after the adapter.
    ///
    /// If the adapter cannot hold `workload.len()` elements the case is
    /// created in the skipped state.
    pub fn from_adapter<A>(adapter: A, workload: AppendWorkload) -> Self
    where
        A: Adapter + 'static,
    {
        let name = adapter.name().to_string();
        Self::named(name, adapter, workload)
    }

    /// Like [`Case::from_adapter`] with an explicit case name
    pub fn named<A>(name: impl Into<String>, adapter: A, workload: AppendWorkload) -> Self
    where
        A: Adapter + 'static,
    {
        let kind = adapter.kind();
        let skip_reason = match adapter.max_len() {
            Some(limit) if !workload.fits(&adapter) => Some(format!(
                "{} pushes exceed the adapter limit of {limit}",
                workload.len()
            )),
            _ => None,
        };

        let adapter = Rc::new(RefCell::new(adapter));
        let run_adapter = Rc::clone(&adapter);

        let run = move || {
            let mut adapter = run_adapter.borrow_mut();
            workload.run(&mut *adapter)?;
            ensure_released(&*adapter)
        };

        let materialize = move || {
            let mut adapter = adapter.borrow_mut();
            let contents = workload.materialize(&mut *adapter)?;
            ensure_released(&*adapter)?;
            Ok(contents)
        };

        Self {
            name: name.into(),
            kind: Some(kind),
            skip_reason,
            run: Box::new(run),
            materialize: Some(Box::new(materialize)),
        }
    }

    /// Case name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adapter kind, for adapter-backed cases
    pub fn kind(&self) -> Option<AdapterKind> {
        self.kind
    }

    /// Why the case will not be measured, if it is skipped
    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }

    /// Execute the case body once
    #[inline]
    pub fn run(&mut self) -> Result<(), CaseError> {
        (self.run)()
    }

    /// Execute once and return the final vector contents.
    ///
    /// `None` for cases not built from an adapter.
    pub fn materialize(&mut self) -> Option<Result<Vec<Element>, CaseError>> {
        self.materialize.as_mut().map(|materialize| materialize())
    }
}

impl std::fmt::Debug for Case {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Case")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("skip_reason", &self.skip_reason)
            .finish_non_exhaustive()
    }
}

fn ensure_released<A: Adapter + ?Sized>(adapter: &A) -> Result<(), CaseError> {
    match adapter.outstanding() {
        Some(live) if live > 0 => Err(ReleaseProtocolViolation::Outstanding { live }.into()),
        _ => Ok(()),
    }
}
