//! Critical section
//!
//! Stands in for the RTOS interrupt mask. The host implementation comes from
//! the `critical-section` crate's `std` backend: one global lock, re-entrant
//! on the thread that holds it, so sections nest the way masked interrupts do.

pub use critical_section::{CriticalSection, Mutex as CsMutex};

/// Run `f` inside a critical section.
///
/// Nothing executed inside may block or allocate on the notify path.
#[inline]
pub fn critical<R>(f: impl FnOnce(CriticalSection<'_>) -> R) -> R {
    critical_section::with(f)
}
