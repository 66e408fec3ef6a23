#![forbid(unsafe_code)]

//! # ev sync
//!
//! In-process primitives that a reactor can subscribe to. Each embeds a
//! [`Link`](ev_loop::Link), reports its levels through
//! [`Readiness`](ev_loop::Readiness) and calls [`notify`](ev_loop::notify)
//! after every operation that may flip a level. All operations are
//! non-blocking and callable from any thread.
//!
//! | Primitive        | `In` level         | `Out` level          |
//! |------------------|--------------------|----------------------|
//! | [`MessageQueue`] | an item is queued  | a slot is free       |
//! | [`EventFlag`]    | some bit is set    | no bit is set        |
//! | [`Semaphore`]    | a unit is available| a release would fit  |

pub mod error;
pub mod flag;
pub mod queue;
pub mod semaphore;

pub use error::{SyncError, SyncResult};
pub use flag::EventFlag;
pub use queue::MessageQueue;
pub use semaphore::Semaphore;
