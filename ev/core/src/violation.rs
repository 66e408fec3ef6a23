//! Contract violations
//!
//! Misuse of the reactor is a logic error in the firmware build, not a
//! runtime condition. Every violation is logged and then halts the calling
//! thread with the diagnostic; there is no recoverable error path.

use thiserror::Error;

use crate::Direction;

/// A broken usage contract of the reactor or one of its primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    /// The (object, direction) pair already has a subscription
    #[error("object {object} is already subscribed for {direction}")]
    DuplicateSubscription { object: u32, direction: Direction },
    /// The object's back reference slot is held by another subscription
    #[error("back reference slot {direction} of object {object} is occupied")]
    SlotOccupied { object: u32, direction: Direction },
    /// Unsubscribe of an object that has no subscription
    #[error("object {object} has no subscription")]
    UnknownObject { object: u32 },
    /// Owner-only operation called from a foreign thread
    #[error("{operation} called outside the owner thread")]
    NotOwner { operation: &'static str },
    /// Operation that is only legal while the reactor is stopped
    #[error("{operation} called while the reactor is running")]
    Running { operation: &'static str },
    /// Reactor dropped with subscriptions still registered
    #[error("reactor dropped with {count} live subscriptions")]
    LiveSubscriptions { count: usize },
    /// Periodic timer started with a zero interval
    #[error("periodic timer started with zero interval")]
    ZeroIntervalPeriodic,
    /// Tick callback and interval disagree on whether the tick is enabled
    #[error("invalid tick configuration: interval {interval}, callback set: {has_callback}")]
    InvalidTick { interval: u32, has_callback: bool },
}

/// Halt on a contract violation.
///
/// The diagnostic goes to the log first so it survives even when the panic
/// strategy is `abort`.
#[cold]
#[track_caller]
pub fn fatal(violation: Violation) -> ! {
    log::error!("contract violation: {violation}");
    panic!("contract violation: {violation}");
}

/// Halt with `violation` unless `condition` holds.
#[inline]
#[track_caller]
pub fn ensure(condition: bool, violation: impl FnOnce() -> Violation) {
    if !condition {
        fatal(violation());
    }
}
