//! Notification word
//!
//! Each reactor owns one word of OR-able bits. Any thread may set bits; the
//! owner thread blocks until one of the bits it waits for is set or the
//! timeout expires. Setting bits never blocks beyond the short lock that
//! guards the word, so it is usable from the notify critical section.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::clock::Clock;

/// Per-thread notification word with a blocking wait.
pub struct NotificationChannel {
    bits: Mutex<u32>,
    cond: Condvar,
    clock: Arc<dyn Clock>,
}

impl NotificationChannel {
    /// Create an empty notification word timed by `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            bits: Mutex::new(0),
            cond: Condvar::new(),
            clock,
        }
    }

    /// Clock that times out waits on this channel.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// OR `mask` into the word and wake the waiter.
    pub fn set_bits(&self, mask: u32) {
        let mut bits = self.bits.lock();
        *bits |= mask;
        self.cond.notify_all();
    }

    /// Clear `mask` from the word without waiting.
    pub fn clear_bits(&self, mask: u32) {
        *self.bits.lock() &= !mask;
    }

    /// Bits currently set.
    pub fn pending(&self) -> u32 {
        *self.bits.lock()
    }

    /// Wait until any bit of `mask` is set or `timeout` ticks pass.
    ///
    /// Returns the bits of `mask` that were set, or zero on timeout. With
    /// `clear_on_exit` the returned bits are cleared from the word. A
    /// `timeout` of `None` waits forever.
    pub fn wait(&self, mask: u32, clear_on_exit: bool, timeout: Option<u32>) -> u32 {
        let mut bits = self.bits.lock();

        let deadline = match timeout {
            None => None,
            Some(ticks) => match self.clock.wait_duration(ticks) {
                Some(budget) => Some(Instant::now() + budget),
                None => {
                    // Virtual clock: nothing pending means the wait runs out.
                    if *bits & mask == 0 {
                        drop(bits);
                        log::trace!("virtual wait skips {ticks} ticks");
                        self.clock.skip(ticks);
                        return 0;
                    }
                    None
                }
            },
        };

        loop {
            let ready = *bits & mask;
            if ready != 0 {
                if clear_on_exit {
                    *bits &= !ready;
                }
                return ready;
            }

            match deadline {
                None => self.cond.wait(&mut bits),
                Some(deadline) => {
                    if self.cond.wait_until(&mut bits, deadline).timed_out() {
                        let ready = *bits & mask;
                        if ready != 0 && clear_on_exit {
                            *bits &= !ready;
                        }
                        return ready;
                    }
                }
            }
        }
    }
}
