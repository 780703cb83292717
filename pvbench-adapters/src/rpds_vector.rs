//! rpds Backends
//!
//! `rpds::Vector` is a persistent bit-partitioned trie; `push_back` returns a
//! new vector sharing every untouched node with its input. The two adapters
//! differ only in the pointer kind: `Rc` for the plain vector, `Arc` for the
//! thread-safe one.

use pvbench_core::{Adapter, AdapterError, AdapterKind, Element};
use rpds::{Vector, VectorSync};

/// `rpds::Vector` with `Rc` nodes
#[derive(Debug, Default, Clone, Copy)]
pub struct RpdsVector;

impl Adapter for RpdsVector {
    type Handle = Vector<Element>;

    fn name(&self) -> &str {
        "rpds.Vector"
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::GcManaged
    }

    fn empty(&mut self) -> Self::Handle {
        Vector::new()
    }

    #[inline]
    fn push(&mut self, handle: &Self::Handle, element: Element) -> Result<Self::Handle, AdapterError> {
        Ok(handle.push_back(element))
    }

    fn materialize(&self, handle: &Self::Handle) -> Result<Vec<Element>, AdapterError> {
        Ok(handle.iter().copied().collect())
    }
}

/// `rpds::VectorSync` with `Arc` nodes
#[derive(Debug, Default, Clone, Copy)]
pub struct RpdsVectorSync;

impl Adapter for RpdsVectorSync {
    type Handle = VectorSync<Element>;

    fn name(&self) -> &str {
        "rpds.VectorSync"
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::GcManaged
    }

    fn empty(&mut self) -> Self::Handle {
        Vector::new_sync()
    }

    #[inline]
    fn push(&mut self, handle: &Self::Handle, element: Element) -> Result<Self::Handle, AdapterError> {
        Ok(handle.push_back(element))
    }

    fn materialize(&self, handle: &Self::Handle) -> Result<Vec<Element>, AdapterError> {
        Ok(handle.iter().copied().collect())
    }
}
