//! Monotonic tick types

use core::fmt;

/// Instant on the monotonic tick counter.
///
/// The counter is 32 bits wide and rolls over; all arithmetic on it wraps so
/// that elapsed time stays correct across a roll-over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tick(u32);

impl Tick {
    /// Tick zero
    pub const ZERO: Self = Self(0);

    /// Create a tick from a raw counter value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw counter value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Ticks elapsed since `earlier`, computed modulo 2^32
    pub const fn elapsed_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Tick `ticks` after this one
    pub const fn after(self, ticks: u32) -> Tick {
        Tick(self.0.wrapping_add(ticks))
    }

    /// Tick `ticks` before this one
    pub const fn before(self, ticks: u32) -> Tick {
        Tick(self.0.wrapping_sub(ticks))
    }
}

impl From<u32> for Tick {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick:{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Tick {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "tick:{}", self.0);
    }
}

/// Remaining ticks of an `interval` that started `elapsed` ticks ago.
///
/// Saturates at zero once the interval has run out.
#[inline]
pub const fn remaining(interval: u32, elapsed: u32) -> u32 {
    interval.saturating_sub(elapsed)
}

/// Whether a software timer fires once or re-arms itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Fires once, then stays unscheduled until started again
    OneShot,
    /// Re-arms itself with the same interval every time it fires
    Periodic,
}

impl TimerKind {
    /// Check if this is a periodic timer
    pub const fn is_periodic(self) -> bool {
        matches!(self, Self::Periodic)
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneShot => write!(f, "one-shot"),
            Self::Periodic => write!(f, "periodic"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerKind {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::OneShot => defmt::write!(fmt, "OneShot"),
            Self::Periodic => defmt::write!(fmt, "Periodic"),
        }
    }
}
