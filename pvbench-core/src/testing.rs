//! Deterministic Test Doubles
//!
//! - [`TickClock`]: a manually advanced clock, so timing-dependent logic can
//!   be tested without wall-clock noise
//! - [`ConsListAdapter`]: a GC-managed persistent cons list that can charge a
//!   fixed number of ticks per push
//! - [`CountingAdapter`]: a manually-released adapter that tracks every
//!   handle and reports release protocol violations

use crate::adapter::{Adapter, AdapterError, AdapterKind, Element, ReleaseProtocolViolation};
use crate::measure::Clock;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    now: Rc<Cell<u64>>,
}

impl TickClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `nanos`
    pub fn advance(&self, nanos: u64) {
        self.now.set(self.now.get() + nanos);
    }
}

impl Clock for TickClock {
    fn now_nanos(&self) -> u64 {
        self.now.get()
    }
}

/// One cell of the persistent list used by the test adapters
#[derive(Debug)]
pub struct ConsNode {
    value: Element,
    prev: ConsList,
}

/// Newest-first persistent list; `None` is the empty list
pub type ConsList = Option<Rc<ConsNode>>;

// Unlinks uniquely owned tails in a loop so long lists do not drop
// recursively and overflow the stack.
impl Drop for ConsNode {
    fn drop(&mut self) {
        let mut next = self.prev.take();
        while let Some(node) = next {
            match Rc::try_unwrap(node) {
                Ok(mut node) => next = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

fn cons_to_vec(list: &ConsList) -> Vec<Element> {
    let mut out = Vec::new();
    let mut cursor = list.as_deref();
    while let Some(node) = cursor {
        out.push(node.value);
        cursor = node.prev.as_deref();
    }
    out.reverse();
    out
}

/// GC-managed adapter over a persistent singly linked list (newest first).
#[derive(Debug, Clone)]
pub struct ConsListAdapter {
    name: String,
    clock: Option<(TickClock, u64)>,
    max_len: Option<usize>,
}

impl ConsListAdapter {
    /// Adapter with the given display name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clock: None,
            max_len: None,
        }
    }

    /// Advance `clock` by `cost_per_push` nanoseconds on every push
    pub fn with_clock(mut self, clock: TickClock, cost_per_push: u64) -> Self {
        self.clock = Some((clock, cost_per_push));
        self
    }

    /// Declare a maximum supported length
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }
}

impl Adapter for ConsListAdapter {
    type Handle = ConsList;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::GcManaged
    }

    fn empty(&mut self) -> Self::Handle {
        None
    }

    fn push(&mut self, handle: &Self::Handle, element: Element) -> Result<Self::Handle, AdapterError> {
        if let Some((clock, cost)) = &self.clock {
            clock.advance(*cost);
        }
        Ok(Some(Rc::new(ConsNode {
            value: element,
            prev: handle.clone(),
        })))
    }

    fn materialize(&self, handle: &Self::Handle) -> Result<Vec<Element>, AdapterError> {
        Ok(cons_to_vec(handle))
    }

    fn max_len(&self) -> Option<usize> {
        self.max_len
    }
}

/// Handle issued by [`CountingAdapter`]. Not `Clone`: each one is released
/// at most once unless a test deliberately makes an alias.
#[derive(Debug)]
pub struct CountedHandle {
    id: u64,
    list: ConsList,
}

impl CountedHandle {
    /// Identity of this handle within its adapter
    pub fn id(&self) -> u64 {
        self.id
    }

    /// A second handle to the same version, for provoking violations
    pub fn alias(&self) -> CountedHandle {
        CountedHandle {
            id: self.id,
            list: self.list.clone(),
        }
    }
}

/// Manually-released adapter that counts outstanding handles and rejects
/// double releases and use after release.
#[derive(Debug, Default)]
pub struct CountingAdapter {
    name: String,
    next_id: u64,
    live: BTreeSet<u64>,
    release_counts: BTreeMap<u64, u32>,
    releases: u64,
    fail_push_at: Option<Element>,
    ignore_releases: bool,
}

impl CountingAdapter {
    /// Adapter with the given display name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fail the push of `element` with a backend error
    pub fn fail_push_at(mut self, element: Element) -> Self {
        self.fail_push_at = Some(element);
        self
    }

    /// Accept releases without retiring the handle, simulating a leak
    pub fn ignoring_releases(mut self) -> Self {
        self.ignore_releases = true;
        self
    }

    /// Total handles issued (empty + pushes)
    pub fn handles_created(&self) -> u64 {
        self.next_id
    }

    /// Successful release calls
    pub fn releases(&self) -> u64 {
        self.releases
    }

    /// How many times each handle id was released
    pub fn release_counts(&self) -> &BTreeMap<u64, u32> {
        &self.release_counts
    }

    fn issue(&mut self, list: ConsList) -> CountedHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        CountedHandle { id, list }
    }

    fn check_live(&self, handle: &CountedHandle) -> Result<(), ReleaseProtocolViolation> {
        if self.live.contains(&handle.id) {
            Ok(())
        } else {
            Err(ReleaseProtocolViolation::UseAfterRelease { handle: handle.id })
        }
    }
}

impl Adapter for CountingAdapter {
    type Handle = CountedHandle;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::ManuallyReleased
    }

    fn empty(&mut self) -> Self::Handle {
        self.issue(None)
    }

    fn push(&mut self, handle: &Self::Handle, element: Element) -> Result<Self::Handle, AdapterError> {
        self.check_live(handle)?;
        if self.fail_push_at == Some(element) {
            return Err(AdapterError::Backend(format!("injected failure at {element}")));
        }
        let list = Some(Rc::new(ConsNode {
            value: element,
            prev: handle.list.clone(),
        }));
        Ok(self.issue(list))
    }

    fn release(&mut self, handle: Self::Handle) -> Result<(), AdapterError> {
        if self.release_counts.contains_key(&handle.id) && !self.live.contains(&handle.id) {
            return Err(ReleaseProtocolViolation::DoubleRelease { handle: handle.id }.into());
        }
        self.check_live(&handle)?;
        *self.release_counts.entry(handle.id).or_default() += 1;
        self.releases += 1;
        if !self.ignore_releases {
            self.live.remove(&handle.id);
        }
        Ok(())
    }

    fn materialize(&self, handle: &Self::Handle) -> Result<Vec<Element>, AdapterError> {
        self.check_live(handle)?;
        Ok(cons_to_vec(&handle.list))
    }

    fn outstanding(&self) -> Option<usize> {
        Some(self.live.len())
    }
}
