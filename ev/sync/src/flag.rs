//! Event flag word

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use ev_core::Direction;
use ev_loop::{notify, Link, Readiness};

/// 32 independent bits. `In` is set while any bit is set, `Out` while none
/// is.
///
/// # Example
///
/// ```
/// use ev_sync::EventFlag;
///
/// let flag = EventFlag::new();
/// flag.set(0b0110);
/// assert_eq!(flag.take(0b0010), 0b0010);
/// assert_eq!(flag.get(), 0b0100);
///
/// flag.clear(0b0100);
/// assert_eq!(flag.get(), 0);
/// ```
pub struct EventFlag {
    link: Link,
    bits: AtomicU32,
}

impl EventFlag {
    /// Create a flag word with every bit clear.
    pub fn new() -> Self {
        Self::with_bits(0)
    }

    /// Create a flag word starting at `bits`.
    pub fn with_bits(bits: u32) -> Self {
        Self {
            link: Link::new(),
            bits: AtomicU32::new(bits),
        }
    }

    /// OR `mask` into the word. Returns the previous value.
    pub fn set(&self, mask: u32) -> u32 {
        let previous = self.bits.fetch_or(mask, Ordering::AcqRel);
        if mask != 0 {
            notify(&self.link, Direction::In);
        }
        previous
    }

    /// Clear `mask` from the word. Returns the previous value.
    pub fn clear(&self, mask: u32) -> u32 {
        let previous = self.bits.fetch_and(!mask, Ordering::AcqRel);
        if previous != 0 && previous & !mask == 0 {
            notify(&self.link, Direction::Out);
        }
        previous
    }

    /// Clear and return the bits of `mask` that are set.
    pub fn take(&self, mask: u32) -> u32 {
        self.clear(mask) & mask
    }

    /// Current bits, left untouched.
    pub fn get(&self) -> u32 {
        self.bits.load(Ordering::Acquire)
    }
}

impl Default for EventFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness for EventFlag {
    fn link(&self) -> &Link {
        &self.link
    }

    fn level(&self, direction: Direction) -> bool {
        match direction {
            Direction::In => self.get() != 0,
            Direction::Out => self.get() == 0,
        }
    }
}

impl fmt::Debug for EventFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFlag")
            .field("id", &self.link.id())
            .field("bits", &format_args!("{:#010x}", self.get()))
            .finish()
    }
}
