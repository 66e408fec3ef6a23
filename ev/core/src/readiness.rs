//! Readiness directions and callback progress

use core::fmt;

/// Readiness direction of a subscribable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    /// Data arrived: the object can be read
    In,
    /// Space freed: the object can be written
    Out,
}

impl Direction {
    /// Slot index of this direction inside a back reference
    pub const fn index(self) -> usize {
        match self {
            Self::In => 0,
            Self::Out => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Direction {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::In => defmt::write!(fmt, "In"),
            Self::Out => defmt::write!(fmt, "Out"),
        }
    }
}

/// Value returned by a subscription callback.
///
/// `Made` ("re-check me now") keeps the reactor on the same object for as
/// long as its level stays true. `Blocked` ("requeue me, try others") sends
/// the object to the back of the waiting queue. Converting from `bool` maps
/// `true` to `Made` and `false` to `Blocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Progress {
    /// The callback did work; re-check the level and call again if still set
    Made,
    /// The callback could not proceed; yield to other ready objects
    Blocked,
}

impl Progress {
    /// Raw boolean form of this value
    pub const fn as_bool(self) -> bool {
        matches!(self, Self::Made)
    }
}

impl From<bool> for Progress {
    #[inline]
    fn from(value: bool) -> Self {
        if value {
            Self::Made
        } else {
            Self::Blocked
        }
    }
}

impl From<Progress> for bool {
    #[inline]
    fn from(value: Progress) -> Self {
        value.as_bool()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Progress {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Made => defmt::write!(fmt, "Made"),
            Self::Blocked => defmt::write!(fmt, "Blocked"),
        }
    }
}
