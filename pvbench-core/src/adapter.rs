//! Adapter Contract
//!
//! An adapter wraps one persistent vector implementation behind three
//! operations: `empty`, `push` and, for manually-released backends, `release`.
//! The harness never sees the concrete vector type, only `Adapter::Handle`.
//!
//! Handles are moved into `release`, so a well-typed workload cannot release
//! the same version twice or push onto a version it already gave back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Element type pushed by the append workload
pub type Element = u32;

/// How an adapter reclaims superseded versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    /// Reclamation is automatic; `release` is never called by the workload
    GcManaged,
    /// Every handle must be released exactly once after it is superseded
    ManuallyReleased,
}

impl AdapterKind {
    /// Whether the workload must call `release` on superseded handles
    #[inline]
    pub fn requires_release(self) -> bool {
        matches!(self, AdapterKind::ManuallyReleased)
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterKind::GcManaged => write!(f, "gc"),
            AdapterKind::ManuallyReleased => write!(f, "manual"),
        }
    }
}

/// Misuse of a manually-released handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseProtocolViolation {
    /// A handle was pushed onto or read after being released
    #[error("handle {handle} used after release")]
    UseAfterRelease {
        /// Adapter-specific handle identity
        handle: u64,
    },
    /// A handle was released a second time
    #[error("handle {handle} released twice")]
    DoubleRelease {
        /// Adapter-specific handle identity
        handle: u64,
    },
    /// Handles were still live after an invocation returned
    #[error("{live} handle(s) still live after the invocation completed")]
    Outstanding {
        /// Number of unreleased handles
        live: usize,
    },
}

/// Errors an adapter operation can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The release protocol was broken
    #[error(transparent)]
    Protocol(#[from] ReleaseProtocolViolation),

    /// The backend cannot hold more elements
    #[error("capacity exceeded: at most {limit} elements")]
    CapacityExceeded {
        /// Maximum supported length
        limit: usize,
    },

    /// Backend-specific failure
    #[error("{0}")]
    Backend(String),
}

/// Uniform capability interface over one persistent vector implementation.
///
/// `push` must leave its input observably unchanged and valid: the returned
/// handle is a new version that may share structure with the input.
pub trait Adapter {
    /// Opaque reference to one immutable vector version
    type Handle;

    /// Display name, used as the default case name
    fn name(&self) -> &str;

    /// Reclamation discipline of this backend
    fn kind(&self) -> AdapterKind;

    /// A fresh, independent zero-element vector
    fn empty(&mut self) -> Self::Handle;

    /// Append `element`, returning the new version
    fn push(&mut self, handle: &Self::Handle, element: Element)
    -> Result<Self::Handle, AdapterError>;

    /// Give a superseded version back to the backend.
    ///
    /// GC-managed adapters keep the default, which simply drops the handle.
    fn release(&mut self, handle: Self::Handle) -> Result<(), AdapterError> {
        drop(handle);
        Ok(())
    }

    /// Read a version back as an ordered sequence
    fn materialize(&self, handle: &Self::Handle) -> Result<Vec<Element>, AdapterError>;

    /// Number of live handles, for backends that track them
    fn outstanding(&self) -> Option<usize> {
        None
    }

    /// Largest supported vector length, if bounded
    fn max_len(&self) -> Option<usize> {
        None
    }
}
