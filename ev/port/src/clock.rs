//! Monotonic tick sources
//!
//! [`SystemClock`] counts real time at a fixed tick rate. [`ManualClock`] is
//! a virtual counter: a timed wait that expires advances it instead of
//! sleeping, which lets timer behaviour be simulated tick by tick.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use ev_core::Tick;

/// Nanoseconds per second
const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Monotonic tick counter consumed by the reactor and its notification
/// channel.
pub trait Clock: Send + Sync + 'static {
    /// Current tick count.
    fn now(&self) -> Tick;

    /// Real time a wait of `ticks` should block for.
    ///
    /// `None` marks a virtual clock: instead of blocking, an expired wait
    /// calls [`Clock::skip`] with the full timeout.
    fn wait_duration(&self, ticks: u32) -> Option<Duration>;

    /// Moves a virtual clock forward by `ticks`. No-op for real clocks.
    fn skip(&self, _ticks: u32) {}
}

/// Real-time tick counter derived from the host monotonic clock.
pub struct SystemClock {
    origin: Instant,
    rate_hz: u32,
}

impl SystemClock {
    /// Create a clock ticking `rate_hz` times per second, starting at zero.
    ///
    /// # Panics
    /// Panics if `rate_hz` is zero.
    pub fn new(rate_hz: u32) -> Self {
        assert!(rate_hz > 0, "tick rate must be greater than 0");
        log::debug!("system clock at {rate_hz} Hz");
        Self {
            origin: Instant::now(),
            rate_hz,
        }
    }

    /// Duration of `ticks` ticks, rounded up to whole nanoseconds
    pub fn ticks_to_duration(&self, ticks: u32) -> Duration {
        let nanos = (ticks as u64 * NSEC_PER_SEC).div_ceil(self.rate_hz as u64);
        Duration::from_nanos(nanos)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Tick {
        let nanos = self.origin.elapsed().as_nanos();
        let ticks = nanos * self.rate_hz as u128 / NSEC_PER_SEC as u128;
        // The counter is 32 bits wide and wraps like the hardware one.
        Tick::new(ticks as u32)
    }

    fn wait_duration(&self, ticks: u32) -> Option<Duration> {
        Some(self.ticks_to_duration(ticks))
    }
}

/// Virtual tick counter advanced explicitly or by expiring waits.
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU32,
}

impl ManualClock {
    /// Create a virtual clock at tick `start`
    pub fn new(start: u32) -> Self {
        Self {
            ticks: AtomicU32::new(start),
        }
    }

    /// Advance the clock by `ticks`
    pub fn advance(&self, ticks: u32) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }

    /// Jump to an absolute tick value
    pub fn set(&self, tick: Tick) {
        self.ticks.store(tick.raw(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        Tick::new(self.ticks.load(Ordering::SeqCst))
    }

    fn wait_duration(&self, _ticks: u32) -> Option<Duration> {
        None
    }

    fn skip(&self, ticks: u32) {
        self.advance(ticks);
    }
}
