//! Bounded message queue

use core::cell::RefCell;
use core::fmt;

use heapless::Deque;

use ev_core::Direction;
use ev_loop::{notify, Link, Readiness};
use ev_port::{critical, CsMutex};

/// Fixed-capacity FIFO of `N` items.
///
/// `In` is set while an item can be taken, `Out` while an item can be put.
/// Producers on any thread call [`put`](Self::put); the consumer usually
/// subscribes to `In` and drains from its callback.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use ev_loop::{Direction, Reactor};
/// use ev_sync::MessageQueue;
///
/// let mut reactor = Reactor::new();
/// let queue: Arc<MessageQueue<u32, 4>> = Arc::new(MessageQueue::new());
///
/// let handle = reactor.handle();
/// reactor.subscribe(&queue, Direction::In, move |queue: &MessageQueue<u32, 4>| {
///     if let Some(item) = queue.get() {
///         assert_eq!(item, 7);
///     }
///     handle.stop();
///     true
/// });
///
/// queue.put(7).unwrap();
/// reactor.run();
/// reactor.unsubscribe(&*queue);
/// ```
pub struct MessageQueue<T, const N: usize> {
    link: Link,
    items: CsMutex<RefCell<Deque<T, N>>>,
}

impl<T: Send + 'static, const N: usize> MessageQueue<T, N> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            link: Link::new(),
            items: CsMutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Append `item`, handing it back if the queue is full.
    pub fn put(&self, item: T) -> Result<(), T> {
        critical(|cs| self.items.borrow_ref_mut(cs).push_back(item))?;
        notify(&self.link, Direction::In);
        Ok(())
    }

    /// Take the oldest item.
    pub fn get(&self) -> Option<T> {
        let item = critical(|cs| self.items.borrow_ref_mut(cs).pop_front())?;
        notify(&self.link, Direction::Out);
        Some(item)
    }

    /// Drop every queued item.
    pub fn reset(&self) {
        let drained = critical(|cs| {
            let mut items = self.items.borrow_ref_mut(cs);
            let drained = !items.is_empty();
            items.clear();
            drained
        });
        if drained {
            log::trace!("{}: queue reset", self.link.id());
            notify(&self.link, Direction::Out);
        }
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        critical(|cs| self.items.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        critical(|cs| self.items.borrow_ref(cs).is_full())
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T: Send + 'static, const N: usize> Default for MessageQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static, const N: usize> Readiness for MessageQueue<T, N> {
    fn link(&self) -> &Link {
        &self.link
    }

    fn level(&self, direction: Direction) -> bool {
        match direction {
            Direction::In => !self.is_empty(),
            Direction::Out => !self.is_full(),
        }
    }
}

impl<T: Send + 'static, const N: usize> fmt::Debug for MessageQueue<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("id", &self.link.id())
            .field("len", &self.len())
            .field("capacity", &N)
            .finish()
    }
}
