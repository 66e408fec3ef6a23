//! Counting semaphore

use core::cell::Cell;
use core::fmt;

use ev_core::Direction;
use ev_loop::{notify, Link, Readiness};
use ev_port::{critical, CsMutex};

use crate::error::{SyncError, SyncResult};

/// Counter bounded by `max`. `In` is set while a unit can be acquired,
/// `Out` while a unit can be released.
///
/// Neither operation blocks: a consumer subscribes to `In` and acquires
/// from its callback instead of waiting.
///
/// # Example
///
/// ```
/// use ev_sync::{Semaphore, SyncError};
///
/// let sem = Semaphore::new(0, 2);
/// assert_eq!(sem.acquire(), Err(SyncError::Unavailable));
///
/// sem.release().unwrap();
/// sem.release().unwrap();
/// assert_eq!(sem.release(), Err(SyncError::Overflow { max: 2 }));
///
/// sem.acquire().unwrap();
/// assert_eq!(sem.count(), 1);
/// ```
pub struct Semaphore {
    link: Link,
    count: CsMutex<Cell<u32>>,
    max: u32,
}

impl Semaphore {
    /// Create a semaphore holding `initial` units out of `max`.
    ///
    /// # Panics
    /// Panics if `max` is zero or `initial` exceeds it.
    pub fn new(initial: u32, max: u32) -> Self {
        assert!(max > 0, "semaphore maximum must be greater than 0");
        assert!(initial <= max, "initial count exceeds maximum");
        Self {
            link: Link::new(),
            count: CsMutex::new(Cell::new(initial)),
            max,
        }
    }

    /// Take one unit, or fail with [`SyncError::Unavailable`] when the count
    /// is zero. Wakes `Out` subscribers.
    pub fn acquire(&self) -> SyncResult<()> {
        critical(|cs| {
            let count = self.count.borrow(cs);
            if count.get() == 0 {
                return Err(SyncError::Unavailable);
            }
            count.set(count.get() - 1);
            Ok(())
        })?;
        notify(&self.link, Direction::Out);
        Ok(())
    }

    /// Return one unit, or fail with [`SyncError::Overflow`] at the maximum.
    /// Wakes `In` subscribers.
    pub fn release(&self) -> SyncResult<()> {
        critical(|cs| {
            let count = self.count.borrow(cs);
            if count.get() == self.max {
                return Err(SyncError::Overflow { max: self.max });
            }
            count.set(count.get() + 1);
            Ok(())
        })?;
        notify(&self.link, Direction::In);
        Ok(())
    }

    /// Units currently available.
    pub fn count(&self) -> u32 {
        critical(|cs| self.count.borrow(cs).get())
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

impl Readiness for Semaphore {
    fn link(&self) -> &Link {
        &self.link
    }

    fn level(&self, direction: Direction) -> bool {
        match direction {
            Direction::In => self.count() > 0,
            Direction::Out => self.count() < self.max,
        }
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("id", &self.link.id())
            .field("count", &self.count())
            .field("max", &self.max)
            .finish()
    }
}
