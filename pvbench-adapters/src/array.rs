//! Copy-on-Push Array
//!
//! Baseline with no structural sharing: every push allocates a new buffer
//! and copies the whole input. Quadratic in the number of pushes, hence the
//! length limit.

use pvbench_core::{Adapter, AdapterError, AdapterKind, Element};
use std::sync::Arc;

/// Longest vector the array baseline will build
pub const ARRAY_MAX_LEN: usize = 10_000;

/// Immutable `Arc<[u32]>` copied on every push
#[derive(Debug, Clone, Copy)]
pub struct CopyArray {
    max_len: usize,
}

impl Default for CopyArray {
    fn default() -> Self {
        Self {
            max_len: ARRAY_MAX_LEN,
        }
    }
}

impl CopyArray {
    /// Array with the default length limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Array with a custom length limit
    pub fn with_max_len(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl Adapter for CopyArray {
    type Handle = Arc<[Element]>;

    fn name(&self) -> &str {
        "array"
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::GcManaged
    }

    fn empty(&mut self) -> Self::Handle {
        Arc::from([])
    }

    fn push(&mut self, handle: &Self::Handle, element: Element) -> Result<Self::Handle, AdapterError> {
        if handle.len() >= self.max_len {
            return Err(AdapterError::CapacityExceeded {
                limit: self.max_len,
            });
        }
        let mut next = Vec::with_capacity(handle.len() + 1);
        next.extend_from_slice(handle);
        next.push(element);
        Ok(next.into())
    }

    fn materialize(&self, handle: &Self::Handle) -> Result<Vec<Element>, AdapterError> {
        Ok(handle.to_vec())
    }

    fn max_len(&self) -> Option<usize> {
        Some(self.max_len)
    }
}
