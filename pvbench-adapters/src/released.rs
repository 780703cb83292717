//! Manually-Released Stores
//!
//! Wraps a GC-managed backend so that every version lives in a slab slot
//! owned by the adapter. Callers only hold a [`ReleasedHandle`] (slot plus a
//! store-wide id) and must give each one back through `release`. A handle
//! whose slot is vacant or holds a different id is stale: pushing onto it is
//! a use-after-release, releasing it again is a double release.

use pvbench_core::{Adapter, AdapterError, AdapterKind, Element, ReleaseProtocolViolation};
use slab::Slab;

/// Move-only reference to a version stored in a [`Released`] adapter
#[derive(Debug, PartialEq, Eq)]
pub struct ReleasedHandle {
    key: usize,
    id: u64,
}

impl ReleasedHandle {
    /// Store-wide identity of this version
    pub fn id(&self) -> u64 {
        self.id
    }
}

struct Entry<H> {
    id: u64,
    version: H,
}

/// Manually-released store over the versions of `A`
pub struct Released<A: Adapter> {
    name: String,
    inner: A,
    versions: Slab<Entry<A::Handle>>,
    next_id: u64,
}

impl<A: Adapter> Released<A> {
    /// Store over `inner`, named `"<inner>-Released"`
    pub fn new(inner: A) -> Self {
        Self {
            name: format!("{}-Released", inner.name()),
            inner,
            versions: Slab::new(),
            next_id: 0,
        }
    }

    /// Number of live versions
    pub fn live(&self) -> usize {
        self.versions.len()
    }

    fn store(&mut self, version: A::Handle) -> ReleasedHandle {
        let id = self.next_id;
        self.next_id += 1;
        let key = self.versions.insert(Entry { id, version });
        ReleasedHandle { key, id }
    }
}

fn lookup<'a, H>(
    versions: &'a Slab<Entry<H>>,
    handle: &ReleasedHandle,
) -> Result<&'a H, ReleaseProtocolViolation> {
    match versions.get(handle.key) {
        Some(entry) if entry.id == handle.id => Ok(&entry.version),
        _ => Err(ReleaseProtocolViolation::UseAfterRelease { handle: handle.id }),
    }
}

impl<A: Adapter> std::fmt::Debug for Released<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Released")
            .field("name", &self.name)
            .field("live", &self.versions.len())
            .finish_non_exhaustive()
    }
}

impl<A: Adapter> Adapter for Released<A> {
    type Handle = ReleasedHandle;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::ManuallyReleased
    }

    fn empty(&mut self) -> Self::Handle {
        let version = self.inner.empty();
        self.store(version)
    }

    fn push(&mut self, handle: &Self::Handle, element: Element) -> Result<Self::Handle, AdapterError> {
        let current = lookup(&self.versions, handle)?;
        let next = self.inner.push(current, element)?;
        Ok(self.store(next))
    }

    fn release(&mut self, handle: Self::Handle) -> Result<(), AdapterError> {
        if lookup(&self.versions, &handle).is_err() {
            return Err(ReleaseProtocolViolation::DoubleRelease { handle: handle.id }.into());
        }
        let entry = self.versions.remove(handle.key);
        self.inner.release(entry.version)
    }

    fn materialize(&self, handle: &Self::Handle) -> Result<Vec<Element>, AdapterError> {
        let version = lookup(&self.versions, handle)?;
        self.inner.materialize(version)
    }

    fn outstanding(&self) -> Option<usize> {
        Some(self.versions.len())
    }

    fn max_len(&self) -> Option<usize> {
        self.inner.max_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImVector, RpdsVector};
    use pvbench_core::AppendWorkload;

    fn forge(handle: &ReleasedHandle) -> ReleasedHandle {
        ReleasedHandle {
            key: handle.key,
            id: handle.id,
        }
    }

    #[test]
    fn test_name_and_kind() {
        let adapter = Released::new(RpdsVector);
        assert_eq!(adapter.name(), "rpds.Vector-Released");
        assert_eq!(adapter.kind(), AdapterKind::ManuallyReleased);
        assert_eq!(Released::new(ImVector).name(), "im.Vector-Released");
    }

    #[test]
    fn test_workload_leaves_store_empty() {
        let mut adapter = Released::new(ImVector);
        let contents = AppendWorkload::new(500).materialize(&mut adapter).unwrap();
        assert_eq!(contents, (0..500).collect::<Vec<_>>());
        assert_eq!(adapter.outstanding(), Some(0));
    }

    #[test]
    fn test_stale_handles_rejected() {
        let mut adapter = Released::new(RpdsVector);
        let empty = adapter.empty();
        let stale = forge(&empty);
        let one = adapter.push(&empty, 1).unwrap();
        adapter.release(empty).unwrap();

        assert_eq!(
            adapter.push(&stale, 2),
            Err(ReleaseProtocolViolation::UseAfterRelease { handle: 0 }.into())
        );
        assert_eq!(
            adapter.release(forge(&stale)),
            Err(ReleaseProtocolViolation::DoubleRelease { handle: 0 }.into())
        );

        // A reused slot does not revive the stale handle
        let reused = adapter.push(&one, 2).unwrap();
        assert_eq!(reused.key, stale.key);
        assert!(adapter.materialize(&stale).is_err());
        assert_eq!(adapter.materialize(&reused).unwrap(), vec![1, 2]);

        adapter.release(one).unwrap();
        adapter.release(reused).unwrap();
        assert_eq!(adapter.live(), 0);
    }
}
