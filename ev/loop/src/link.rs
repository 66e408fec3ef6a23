//! Readiness contract between primitives and the reactor
//!
//! A subscribable primitive embeds a [`Link`] and implements [`Readiness`].
//! After every operation that can flip a level it calls [`notify`], which
//! is safe from any thread: it only flips a flag, splices an index into the
//! waiting queue and sets a bit in the owner's notification word.

use core::cell::RefCell;
use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use ev_core::Direction;
use ev_port::{critical, CriticalSection, CsMutex};

use crate::shared::{Shared, FLAG_EVENT};

static NEXT_OBJECT_ID: AtomicU32 = AtomicU32::new(1);

/// Opaque identity of a subscribable object, issued when its link is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw identity value
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

pub(crate) struct Binding {
    pub(crate) shared: Arc<Shared>,
    pub(crate) subscription: usize,
}

/// Back reference embedded in every subscribable primitive.
///
/// Holds at most one subscription per direction. The slots belong to the
/// primitive; the reactor fills a slot on subscribe and clears it on
/// unsubscribe.
pub struct Link {
    id: ObjectId,
    slots: CsMutex<RefCell<[Option<Binding>; 2]>>,
}

impl Link {
    pub fn new() -> Self {
        Self {
            id: ObjectId::next(),
            slots: CsMutex::new(RefCell::new([None, None])),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Whether a subscription currently occupies the `direction` slot.
    pub fn is_bound(&self, direction: Direction) -> bool {
        critical(|cs| self.slots.borrow_ref(cs)[direction.index()].is_some())
    }

    /// Fill an empty slot. Hands the binding back if the slot is occupied.
    pub(crate) fn bind(
        &self,
        cs: CriticalSection<'_>,
        direction: Direction,
        binding: Binding,
    ) -> Result<(), Binding> {
        let mut slots = self.slots.borrow_ref_mut(cs);
        let slot = &mut slots[direction.index()];
        if slot.is_some() {
            return Err(binding);
        }
        *slot = Some(binding);
        Ok(())
    }

    /// Empty a slot. The binding is returned so it is dropped outside the
    /// critical section.
    pub(crate) fn unbind(&self, cs: CriticalSection<'_>, direction: Direction) -> Option<Binding> {
        self.slots.borrow_ref_mut(cs)[direction.index()].take()
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("id", &self.id)
            .field("in", &self.is_bound(Direction::In))
            .field("out", &self.is_bound(Direction::Out))
            .finish()
    }
}

/// Capability every subscribable primitive implements.
pub trait Readiness: Send + Sync + 'static {
    /// Back reference embedded in the object.
    fn link(&self) -> &Link;

    /// Current level of the object for `direction`.
    ///
    /// Called by the reactor before every callback invocation; must not
    /// block.
    fn level(&self, direction: Direction) -> bool;
}

/// Report that the `direction` level of the object owning `link` may have
/// changed.
///
/// Callable from any thread. Queues the bound subscription, if any, unless
/// it is already waiting, and wakes the owning reactor.
pub fn notify(link: &Link, direction: Direction) {
    critical(|cs| {
        let slots = link.slots.borrow_ref(cs);
        if let Some(binding) = &slots[direction.index()] {
            let queued = binding
                .shared
                .waiting
                .borrow_ref_mut(cs)
                .push_back(binding.subscription);
            if queued {
                binding.shared.channel.set_bits(FLAG_EVENT);
            }
        }
    });
}
