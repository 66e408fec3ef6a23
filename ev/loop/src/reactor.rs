//! Reactor: the cooperative single-thread event loop
//!
//! One owner thread drives a [`Reactor`] through [`Reactor::run`]. Each wake
//! cycle services at most one ready object, then drains queued control
//! requests and fires at most one due timer, before re-observing the
//! notification word. A persistently ready object therefore cannot starve
//! timers, requests or other objects.

use core::fmt;
use std::mem;
use std::sync::Arc;

use log::{debug, trace};

use ev_core::{ensure, fatal, remaining, Direction, Progress, ReactorConfig, Tick, Violation};
use ev_port::{critical, Clock, SystemClock, ThreadId};

use crate::link::{Binding, Readiness};
use crate::registry::{Callback, Registry};
use crate::request::{PendingCallback, Request, TickCallback};
use crate::shared::{Shared, FLAG_ALL, FLAG_EVENT, FLAG_REQUEST, FLAG_STOP};

/// Result of servicing one popped subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Level dropped; the subscription leaves the queue.
    Complete,
    /// The callback could not proceed; back to the tail of the queue.
    Again,
    /// A stop arrived while the level is still set; keep the head position
    /// for the next run.
    Interrupted,
}

#[derive(Default)]
struct TickState {
    interval: u32,
    last: Tick,
    callback: Option<TickCallback>,
}

/// Cloneable handle to a reactor.
///
/// Carries the operations that are legal from inside callbacks and, for
/// [`stop`](Self::stop) and [`pend_callback`](Self::pend_callback), from any
/// thread.
#[derive(Clone)]
pub struct ReactorHandle {
    shared: Arc<Shared>,
}

impl ReactorHandle {
    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// Ask the loop to return. Observed at the top of the next wake cycle;
    /// a callback already running completes first.
    pub fn stop(&self) {
        debug!("{}: stop requested", self.shared.name);
        self.shared.channel.set_bits(FLAG_STOP);
    }

    /// Queue `callback` to run once on the owner thread, after every request
    /// queued before it.
    pub fn pend_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let callback: PendingCallback = Box::new(callback);
        self.shared.post(Request::Pending { callback });
    }

    /// Configure the idle tick callback.
    ///
    /// `interval == 0` with `None` disables the tick; `interval > 0` with a
    /// callback enables it. Any other combination is a contract violation.
    /// Takes effect on the next request drain.
    pub fn tick_set(&self, interval: u32, callback: Option<TickCallback>) {
        self.shared.ensure_owner("tick_set");
        ensure((interval == 0) == callback.is_none(), || {
            Violation::InvalidTick {
                interval,
                has_callback: callback.is_some(),
            }
        });
        self.shared.post(Request::SetTick { interval, callback });
    }

    pub fn is_owner_thread(&self) -> bool {
        self.shared.is_owner_thread()
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Current tick of the reactor's clock.
    pub fn now(&self) -> Tick {
        self.shared.now()
    }
}

impl AsRef<ReactorHandle> for ReactorHandle {
    fn as_ref(&self) -> &ReactorHandle {
        self
    }
}

impl fmt::Debug for ReactorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorHandle")
            .field("name", &self.shared.name)
            .field("running", &self.shared.is_running())
            .finish()
    }
}

/// Cooperative event loop multiplexing readiness, timers and deferred calls
/// onto its owner thread.
pub struct Reactor {
    config: ReactorConfig,
    handle: ReactorHandle,
    registry: Registry,
    tick: TickState,
}

impl Reactor {
    /// Create a reactor with the default configuration, owned by the calling
    /// thread.
    pub fn new() -> Self {
        Self::with_config(ReactorConfig::default())
    }

    /// Create a reactor timed by a [`SystemClock`] at the configured rate.
    pub fn with_config(config: ReactorConfig) -> Self {
        let clock = Arc::new(SystemClock::new(config.tick_rate_hz));
        Self::with_clock(config, clock)
    }

    /// Create a reactor timed by `clock`.
    pub fn with_clock(config: ReactorConfig, clock: Arc<dyn Clock>) -> Self {
        let shared = Arc::new(Shared::new(config.name, clock));
        let tick = TickState {
            last: shared.now(),
            ..TickState::default()
        };
        debug!("{}: created", config.name);
        Self {
            config,
            handle: ReactorHandle { shared },
            registry: Registry::default(),
            tick,
        }
    }

    pub fn handle(&self) -> ReactorHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn owner(&self) -> ThreadId {
        self.handle.shared.owner
    }

    pub fn is_running(&self) -> bool {
        self.handle.shared.is_running()
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    /// Current tick of the reactor's clock.
    pub fn now(&self) -> Tick {
        self.handle.now()
    }

    /// Timers allocated on this reactor and not yet freed.
    pub fn timer_count(&self) -> usize {
        self.handle.shared.timers.lock().len()
    }

    /// Subscriptions currently waiting to be serviced.
    pub fn ready_count(&self) -> usize {
        let shared = &self.handle.shared;
        critical(|cs| shared.waiting.borrow_ref(cs).len())
    }

    /// Whether `object` has a subscription for `direction` on this reactor.
    pub fn is_subscribed<O>(&self, object: &O, direction: Direction) -> bool
    where
        O: Readiness + ?Sized,
    {
        self.registry.contains(object.link().id(), direction)
    }

    /// Whether the (object, direction) subscription sits in the waiting queue.
    pub fn is_ready<O>(&self, object: &O, direction: Direction) -> bool
    where
        O: Readiness + ?Sized,
    {
        let Some(index) = self.registry.index(object.link().id(), direction) else {
            return false;
        };
        let shared = &self.handle.shared;
        critical(|cs| shared.waiting.borrow_ref(cs).is_queued(index))
    }

    /// See [`ReactorHandle::stop`].
    pub fn stop(&self) {
        self.handle.stop();
    }

    /// See [`ReactorHandle::pend_callback`].
    pub fn pend_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.pend_callback(callback);
    }

    /// See [`ReactorHandle::tick_set`].
    pub fn tick_set(&self, interval: u32, callback: Option<TickCallback>) {
        self.handle.tick_set(interval, callback);
    }

    /// Subscribe `callback` to the `direction` level of `object`.
    ///
    /// Only legal on the owner thread while the loop is stopped, and only
    /// once per (object, direction). If the level is already set the
    /// subscription is queued right away so no earlier readiness is missed.
    ///
    /// The callback's return value follows [`Progress`]: `true`/`Made`
    /// means "re-check me now", `false`/`Blocked` means "requeue me".
    pub fn subscribe<O, F, R>(&mut self, object: &Arc<O>, direction: Direction, mut callback: F)
    where
        O: Readiness,
        F: FnMut(&O) -> R + Send + 'static,
        R: Into<Progress>,
    {
        let shared = Arc::clone(&self.handle.shared);
        shared.ensure_owner("subscribe");
        ensure(!shared.is_running(), || Violation::Running {
            operation: "subscribe",
        });

        let target = Arc::clone(object);
        let callback: Callback = Box::new(move || callback(&*target).into());
        let index = match self.registry.insert(object.clone(), direction, callback) {
            Ok(index) => index,
            Err(violation) => fatal(violation),
        };

        let link = object.link();
        let bound = critical(|cs| {
            shared.waiting.borrow_ref_mut(cs).reserve(index);
            link.bind(
                cs,
                direction,
                Binding {
                    shared: Arc::clone(&shared),
                    subscription: index,
                },
            )
        });
        if bound.is_err() {
            self.registry.remove(index);
            fatal(Violation::SlotOccupied {
                object: link.id().raw(),
                direction,
            });
        }

        debug!("{}: subscribed {} {}", shared.name, link.id(), direction);

        if object.level(direction) {
            let queued = critical(|cs| shared.waiting.borrow_ref_mut(cs).push_back(index));
            if queued {
                shared.channel.set_bits(FLAG_EVENT);
            }
        }
    }

    /// Remove every subscription of `object`.
    ///
    /// Only legal on the owner thread while the loop is stopped; fatal if
    /// the object has no subscription on this reactor.
    pub fn unsubscribe<O>(&mut self, object: &O)
    where
        O: Readiness + ?Sized,
    {
        let shared = Arc::clone(&self.handle.shared);
        shared.ensure_owner("unsubscribe");
        ensure(!shared.is_running(), || Violation::Running {
            operation: "unsubscribe",
        });

        let link = object.link();
        let removed = self
            .registry
            .remove_object(link.id())
            .unwrap_or_else(|| fatal(Violation::UnknownObject { object: link.id().raw() }));

        for (index, subscription) in removed {
            let binding = critical(|cs| {
                shared.waiting.borrow_ref_mut(cs).remove(index);
                link.unbind(cs, subscription.direction)
            });
            debug!(
                "{}: unsubscribed {} {}",
                shared.name,
                link.id(),
                subscription.direction
            );
            drop(binding);
        }
    }

    /// Run the loop on the owner thread until [`stop`](Self::stop).
    ///
    /// May be called again after it returns.
    pub fn run(&mut self) {
        let shared = Arc::clone(&self.handle.shared);
        shared.ensure_owner("run");
        ensure(!shared.is_running(), || Violation::Running { operation: "run" });

        shared.set_running(true);
        debug!("{}: running", shared.name);

        loop {
            let timeout = self.config.clamp_wait(self.wait_timeout());
            let flags = shared.channel.wait(FLAG_ALL, true, timeout);

            if flags & FLAG_STOP != 0 {
                // Leave whatever else arrived for the next run.
                let rest = flags & !FLAG_STOP;
                if rest != 0 {
                    shared.channel.set_bits(rest);
                }
                break;
            }

            if flags == 0 {
                if !self.process_expired_timer() {
                    self.process_tick();
                }
                continue;
            }

            if flags & FLAG_EVENT != 0 {
                self.process_waiting();
            }
            if flags & FLAG_REQUEST != 0 {
                if shared.stop_requested() {
                    shared.channel.set_bits(FLAG_REQUEST);
                } else {
                    self.process_requests();
                }
            }
            if !shared.stop_requested() {
                self.process_expired_timer();
            }
        }

        shared.set_running(false);
        debug!("{}: stopped", shared.name);
    }

    /// Ticks until the earliest timer or the tick callback is due.
    fn wait_timeout(&self) -> Option<u32> {
        let now = self.handle.shared.now();
        let timer = self.handle.shared.timers.lock().front_remaining(now);
        let tick = (self.tick.interval > 0)
            .then(|| remaining(self.tick.interval, now.elapsed_since(self.tick.last)));

        match (timer, tick) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Pop one ready subscription and service it.
    fn process_waiting(&mut self) {
        let shared = Arc::clone(&self.handle.shared);
        let popped = critical(|cs| shared.waiting.borrow_ref_mut(cs).pop_front());

        if let Some(index) = popped {
            match self.service(index) {
                Outcome::Complete => {}
                Outcome::Again => {
                    critical(|cs| shared.waiting.borrow_ref_mut(cs).push_back(index));
                }
                Outcome::Interrupted => {
                    critical(|cs| shared.waiting.borrow_ref_mut(cs).push_front(index));
                }
            }
        }

        let more = critical(|cs| !shared.waiting.borrow_ref(cs).is_empty());
        if more {
            shared.channel.set_bits(FLAG_EVENT);
        }
    }

    /// Level-triggered dispatch of one subscription: keep calling while the
    /// callback makes progress and the level stays set. A pending stop ends
    /// the loop after the current call and puts the subscription back at the
    /// head, so the next run resumes with it.
    fn service(&mut self, index: usize) -> Outcome {
        let Some(subscription) = self.registry.get_mut(index) else {
            return Outcome::Complete;
        };
        let object = Arc::clone(&subscription.object);
        let direction = subscription.direction;
        let Some(mut callback) = subscription.callback.take() else {
            return Outcome::Complete;
        };

        let shared = &self.handle.shared;
        let outcome = loop {
            if !object.level(direction) {
                break Outcome::Complete;
            }
            match callback() {
                Progress::Made => {
                    if shared.stop_requested() {
                        break Outcome::Interrupted;
                    }
                }
                Progress::Blocked => break Outcome::Again,
            }
        };

        if let Some(subscription) = self.registry.get_mut(index) {
            subscription.callback = Some(callback);
        }
        outcome
    }

    /// Apply queued requests in FIFO order.
    fn process_requests(&mut self) {
        let shared = Arc::clone(&self.handle.shared);
        let mut batch = mem::take(&mut *shared.requests.lock());
        trace!("{}: draining {} requests", shared.name, batch.len());

        while let Some(request) = batch.pop_front() {
            self.apply(request);

            if shared.stop_requested() && !batch.is_empty() {
                let mut queue = shared.requests.lock();
                while let Some(rest) = batch.pop_back() {
                    queue.push_front(rest);
                }
                drop(queue);
                shared.channel.set_bits(FLAG_REQUEST);
                return;
            }
        }
    }

    fn apply(&mut self, request: Request) {
        let shared = &self.handle.shared;
        let now = shared.now();
        trace!("{}: {:?}", shared.name, request);

        match request {
            Request::Start { timer, interval } => shared.timers.lock().start(timer, interval, now),
            Request::Stop { timer } => shared.timers.lock().stop(timer, now),
            Request::Free { timer } => {
                let callback = shared.timers.lock().free(timer);
                drop(callback);
            }
            Request::SetTick { interval, callback } => {
                self.tick = TickState {
                    interval,
                    last: now,
                    callback,
                };
            }
            Request::Pending { callback } => callback(),
        }
    }

    /// Fire the earliest timer if it is due.
    fn process_expired_timer(&mut self) -> bool {
        let shared = &self.handle.shared;
        let now = shared.now();

        let fired = {
            let mut timers = shared.timers.lock();
            timers
                .pop_expired(now)
                .map(|index| (index, timers.take_callback(index)))
        };
        let Some((index, callback)) = fired else {
            return false;
        };

        trace!("{}: timer {} fired at {}", shared.name, index, now);
        if let Some(mut callback) = callback {
            callback();
            shared.timers.lock().restore_callback(index, callback);
        }
        true
    }

    /// Fire the idle tick if its interval has elapsed.
    fn process_tick(&mut self) {
        if self.tick.interval == 0 {
            return;
        }
        let now = self.handle.shared.now();
        if now.elapsed_since(self.tick.last) < self.tick.interval {
            return;
        }

        self.tick.last = now;
        if let Some(callback) = self.tick.callback.as_mut() {
            callback();
        }
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<ReactorHandle> for Reactor {
    fn as_ref(&self) -> &ReactorHandle {
        &self.handle
    }
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor")
            .field("name", &self.config.name)
            .field("running", &self.is_running())
            .field("subscriptions", &self.registry.len())
            .finish()
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }

        let shared = Arc::clone(&self.handle.shared);
        shared.ensure_owner("drop");
        ensure(!shared.is_running(), || Violation::Running { operation: "drop" });
        ensure(self.registry.is_empty(), || Violation::LiveSubscriptions {
            count: self.registry.len(),
        });

        // Deferred work may hold handles back to this reactor; release it so
        // the shared state is freed with the last outside handle.
        let timers = mem::take(&mut *shared.timers.lock());
        let requests = mem::take(&mut *shared.requests.lock());
        let tick = self.tick.callback.take();
        drop(timers);
        drop(requests);
        drop(tick);

        debug!("{}: dropped", shared.name);
    }
}
