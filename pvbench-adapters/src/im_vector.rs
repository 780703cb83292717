//! im Backend
//!
//! `im::Vector` is an RRB tree with `Arc` nodes. Cloning is O(1), and
//! `push_back` on the clone copies only the path it touches, so push-by-clone
//! leaves the input version intact.

use pvbench_core::{Adapter, AdapterError, AdapterKind, Element};

/// `im::Vector`
#[derive(Debug, Default, Clone, Copy)]
pub struct ImVector;

impl Adapter for ImVector {
    type Handle = im::Vector<Element>;

    fn name(&self) -> &str {
        "im.Vector"
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::GcManaged
    }

    fn empty(&mut self) -> Self::Handle {
        im::Vector::new()
    }

    #[inline]
    fn push(&mut self, handle: &Self::Handle, element: Element) -> Result<Self::Handle, AdapterError> {
        let mut next = handle.clone();
        next.push_back(element);
        Ok(next)
    }

    fn materialize(&self, handle: &Self::Handle) -> Result<Vec<Element>, AdapterError> {
        Ok(handle.iter().copied().collect())
    }
}
