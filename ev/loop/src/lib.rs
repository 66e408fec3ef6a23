#![forbid(unsafe_code)]

//! # ev loop
//!
//! Cooperative, single-thread reactor that multiplexes readiness of
//! in-process primitives, software timers and deferred callbacks onto one
//! owner thread.
//!
//! ## Module Overview
//! - [`link`]    – readiness contract, back references and `notify`.
//! - [`reactor`] – the loop, its handle and subscription management.
//! - [`timer`]   – earliest-deadline-first software timers.
//! - [`request`] – deferred control requests and callback types.
//!
//! Ownership: one thread creates and runs a reactor. Other threads and
//! interrupt handlers only call [`notify`], [`ReactorHandle::stop`] and
//! [`ReactorHandle::pend_callback`]; everything else is checked to come from
//! the owner and halts otherwise.

pub mod link;
pub mod reactor;
pub mod request;
pub mod timer;

mod registry;
mod shared;
mod slab;
mod waiting;

pub use ev_core::{Direction, Progress, ReactorConfig, Tick, TimerKind, Violation};
pub use link::{notify, Link, ObjectId, Readiness};
pub use reactor::{Reactor, ReactorHandle};
pub use request::{PendingCallback, TickCallback};
pub use timer::Timer;
