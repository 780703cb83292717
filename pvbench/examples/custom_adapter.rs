//! Custom Adapter Example
//!
//! Adds a hand-written persistent vector to the standard push suite: a
//! chunked vector whose full chunks are shared between versions and whose
//! partial tail chunk is copied on push.
//!
//! Run with:
//!   cargo run --example custom_adapter                 # Run the full suite
//!   cargo run --example custom_adapter -- chunked      # Only the new adapter
//!   cargo run --example custom_adapter -- list         # List cases
//!   cargo run --example custom_adapter -- --verify     # Check contents first

use pvbench::prelude::*;
use std::rc::Rc;

const CHUNK: usize = 32;

/// Full chunks shared by reference, tail copied on every push
#[derive(Clone, Default)]
struct ChunkedVector {
    chunks: Rc<Vec<Rc<[Element; CHUNK]>>>,
    tail: Rc<[Element]>,
}

impl ChunkedVector {
    fn push(&self, element: Element) -> Self {
        let mut tail = Vec::with_capacity(self.tail.len() + 1);
        tail.extend_from_slice(&self.tail);
        tail.push(element);

        match <[Element; CHUNK]>::try_from(tail.as_slice()) {
            Ok(full) => {
                let mut chunks = Vec::with_capacity(self.chunks.len() + 1);
                chunks.extend(self.chunks.iter().cloned());
                chunks.push(Rc::new(full));
                Self {
                    chunks: Rc::new(chunks),
                    tail: Vec::new().into(),
                }
            }
            Err(_) => Self {
                chunks: Rc::clone(&self.chunks),
                tail: tail.into(),
            },
        }
    }

    fn to_vec(&self) -> Vec<Element> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.iter())
            .chain(self.tail.iter())
            .copied()
            .collect()
    }
}

struct Chunked;

impl Adapter for Chunked {
    type Handle = ChunkedVector;

    fn name(&self) -> &str {
        "chunked"
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::GcManaged
    }

    fn empty(&mut self) -> Self::Handle {
        ChunkedVector::default()
    }

    fn push(&mut self, handle: &Self::Handle, element: Element) -> Result<Self::Handle, AdapterError> {
        Ok(handle.push(element))
    }

    fn materialize(&self, handle: &Self::Handle) -> Result<Vec<Element>, AdapterError> {
        Ok(handle.to_vec())
    }
}

fn main() -> anyhow::Result<()> {
    pvbench::run_with_registry(|registry, workload| {
        register_push_suite(registry, workload)?;
        registry.register_adapter(Chunked, workload)
    })
}
