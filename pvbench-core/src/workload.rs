//! Append Workload
//!
//! The single workload the harness measures: start from an empty vector and
//! push `0..len` one element at a time, always keeping only the newest
//! version. For manually-released adapters every superseded version, the
//! initial empty one included, is released right after its successor exists,
//! and the final version is released before the invocation returns.

use crate::adapter::{Adapter, AdapterError, Element};

/// Default number of pushes per invocation
pub const DEFAULT_WORKLOAD_LEN: u32 = 1000;

/// Sequential append of `0..len`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendWorkload {
    len: u32,
}

impl Default for AppendWorkload {
    fn default() -> Self {
        Self::new(DEFAULT_WORKLOAD_LEN)
    }
}

impl AppendWorkload {
    /// Workload pushing `len` elements
    pub fn new(len: u32) -> Self {
        Self { len }
    }

    /// Number of pushes per invocation
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the workload pushes nothing
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The exact element sequence every adapter must end up holding
    pub fn expected(&self) -> Vec<Element> {
        (0..self.len).collect()
    }

    /// Whether the adapter can hold `len` elements
    pub fn fits<A: Adapter + ?Sized>(&self, adapter: &A) -> bool {
        adapter
            .max_len()
            .is_none_or(|limit| self.len as usize <= limit)
    }

    /// Run one invocation, leaving no live handles behind
    pub fn run<A: Adapter + ?Sized>(&self, adapter: &mut A) -> Result<(), AdapterError> {
        let last = self.build(adapter)?;
        std::hint::black_box(&last);
        finish(adapter, last)
    }

    /// Run one invocation and return the final contents.
    ///
    /// The final version is released even when reading it back fails.
    pub fn materialize<A: Adapter + ?Sized>(
        &self,
        adapter: &mut A,
    ) -> Result<Vec<Element>, AdapterError> {
        let last = self.build(adapter)?;
        let contents = adapter.materialize(&last);
        let released = finish(adapter, last);
        let contents = contents?;
        released?;
        Ok(contents)
    }

    fn build<A: Adapter + ?Sized>(&self, adapter: &mut A) -> Result<A::Handle, AdapterError> {
        let manual = adapter.kind().requires_release();
        let mut current = adapter.empty();

        for x in 0..self.len {
            let next = match adapter.push(&current, x) {
                Ok(next) => next,
                Err(err) => {
                    if manual {
                        abandon(adapter, current);
                    }
                    return Err(err);
                }
            };

            let superseded = std::mem::replace(&mut current, next);
            if manual {
                if let Err(err) = adapter.release(superseded) {
                    abandon(adapter, current);
                    return Err(err);
                }
            }
        }

        Ok(current)
    }
}

fn finish<A: Adapter + ?Sized>(adapter: &mut A, handle: A::Handle) -> Result<(), AdapterError> {
    if adapter.kind().requires_release() {
        adapter.release(handle)
    } else {
        drop(handle);
        Ok(())
    }
}

/// Best-effort release on an error path; the original error wins.
fn abandon<A: Adapter + ?Sized>(adapter: &mut A, handle: A::Handle) {
    if let Err(err) = adapter.release(handle) {
        tracing::debug!(adapter = adapter.name(), %err, "release failed while unwinding workload");
    }
}
