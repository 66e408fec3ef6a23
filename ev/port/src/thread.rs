//! Thread identity

pub use std::thread::ThreadId;

/// Identity of the calling thread.
#[inline]
pub fn current_thread_id() -> ThreadId {
    std::thread::current().id()
}
