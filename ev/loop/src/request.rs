//! Deferred control requests
//!
//! Timer control, tick configuration and pending callbacks never touch the
//! loop's structures directly. They are queued as [`Request`] values and
//! applied in FIFO order when the loop drains its request queue, which keeps
//! them safe to issue from inside any callback.

use core::fmt;

/// Callback of a one-shot deferred call.
pub type PendingCallback = Box<dyn FnOnce() + Send + 'static>;

/// Idle callback configured with `tick_set`.
pub type TickCallback = Box<dyn FnMut() + Send + 'static>;

pub(crate) enum Request {
    Start { timer: usize, interval: u32 },
    Stop { timer: usize },
    Free { timer: usize },
    SetTick { interval: u32, callback: Option<TickCallback> },
    Pending { callback: PendingCallback },
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start { timer, interval } => f
                .debug_struct("Start")
                .field("timer", timer)
                .field("interval", interval)
                .finish(),
            Self::Stop { timer } => f.debug_struct("Stop").field("timer", timer).finish(),
            Self::Free { timer } => f.debug_struct("Free").field("timer", timer).finish(),
            Self::SetTick { interval, callback } => f
                .debug_struct("SetTick")
                .field("interval", interval)
                .field("enabled", &callback.is_some())
                .finish(),
            Self::Pending { .. } => f.write_str("Pending"),
        }
    }
}
