#![forbid(unsafe_code)]

//! # ev host port
//!
//! The RTOS collaborator the reactor is layered on, implemented on top of
//! the host operating system:
//!
//! - [`clock`]    – monotonic tick counters, real and virtual.
//! - [`channel`]  – per-thread notification word with wait-with-timeout.
//! - [`critical`] – nestable critical section.
//! - [`thread`]   – thread identity.

pub mod channel;
pub mod clock;
pub mod critical;
pub mod thread;

pub use channel::NotificationChannel;
pub use clock::{Clock, ManualClock, SystemClock};
pub use critical::{critical, CriticalSection, CsMutex};
pub use thread::{current_thread_id, ThreadId};
