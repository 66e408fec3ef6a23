//! Software timers
//!
//! Active timers sit in a list ordered by ascending remaining time, so the
//! front is always the next to fire. Ties keep the order in which the start
//! requests were applied. Insertion scans from the tail: O(n) insert, O(1)
//! peek, which suits the handful of timers a firmware subsystem keeps.
//!
//! [`Timer`] handles never reorder the list themselves. Start, stop and free
//! are queued as requests and applied by the owner thread between
//! callbacks, so a timer may restart or free itself from its own callback.

use core::fmt;
use std::sync::Arc;

use ev_core::{ensure, remaining, Tick, TimerKind, Violation};

use crate::reactor::ReactorHandle;
use crate::request::Request;
use crate::shared::Shared;
use crate::slab::Slab;

pub(crate) type TimerCallback = Box<dyn FnMut() + Send + 'static>;

struct TimerNode {
    kind: TimerKind,
    interval: u32,
    start: Tick,
    order: u64,
    active: bool,
    prev: Option<usize>,
    next: Option<usize>,
    callback: Option<TimerCallback>,
}

impl TimerNode {
    fn elapsed(&self, now: Tick) -> u32 {
        now.elapsed_since(self.start)
    }

    fn remaining(&self, now: Tick) -> u32 {
        remaining(self.interval, self.elapsed(now))
    }

    fn is_expired(&self, now: Tick) -> bool {
        self.elapsed(now) >= self.interval
    }
}

#[derive(Default)]
pub(crate) struct TimerSet {
    nodes: Slab<TimerNode>,
    head: Option<usize>,
    tail: Option<usize>,
    next_order: u64,
}

impl TimerSet {
    pub(crate) fn alloc(&mut self, kind: TimerKind, callback: TimerCallback) -> usize {
        self.nodes.insert(TimerNode {
            kind,
            interval: 0,
            start: Tick::ZERO,
            order: 0,
            active: false,
            prev: None,
            next: None,
            callback: Some(callback),
        })
    }

    /// Apply a start request: (re)arm with `interval` counted from `now`.
    pub(crate) fn start(&mut self, index: usize, interval: u32, now: Tick) {
        if self.nodes.get(index).is_none() {
            return;
        }
        self.unlink(index);

        let order = self.next_order;
        self.next_order += 1;

        let node = &mut self.nodes[index];
        node.interval = interval;
        node.start = now;
        node.order = order;
        self.insert_sorted(index, now);
    }

    /// Apply a stop request: unschedule and mark expired.
    pub(crate) fn stop(&mut self, index: usize, now: Tick) {
        if self.nodes.get(index).is_none() {
            return;
        }
        self.unlink(index);

        let node = &mut self.nodes[index];
        node.start = now.before(node.interval);
    }

    /// Apply a free request. The callback is handed back so the caller can
    /// drop it outside the timer lock.
    pub(crate) fn free(&mut self, index: usize) -> Option<TimerCallback> {
        if self.nodes.get(index).is_none() {
            return None;
        }
        self.unlink(index);
        self.nodes.remove(index).and_then(|node| node.callback)
    }

    /// Remaining time of the next timer to fire.
    pub(crate) fn front_remaining(&self, now: Tick) -> Option<u32> {
        self.head.map(|head| self.nodes[head].remaining(now))
    }

    /// Detach the front timer if it is due. A periodic timer is re-armed
    /// from `now` and reinserted at its new position.
    pub(crate) fn pop_expired(&mut self, now: Tick) -> Option<usize> {
        let head = self.head?;
        if !self.nodes[head].is_expired(now) {
            return None;
        }

        self.unlink(head);
        if self.nodes[head].kind.is_periodic() {
            self.nodes[head].start = now;
            self.insert_sorted(head, now);
        }
        Some(head)
    }

    pub(crate) fn take_callback(&mut self, index: usize) -> Option<TimerCallback> {
        self.nodes.get_mut(index)?.callback.take()
    }

    pub(crate) fn restore_callback(&mut self, index: usize, callback: TimerCallback) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.callback = Some(callback);
        }
    }

    pub(crate) fn remaining(&self, index: usize, now: Tick) -> u32 {
        self.nodes.get(index).map_or(0, |node| node.remaining(now))
    }

    pub(crate) fn interval(&self, index: usize) -> u32 {
        self.nodes.get(index).map_or(0, |node| node.interval)
    }

    pub(crate) fn is_running(&self, index: usize, now: Tick) -> bool {
        self.nodes
            .get(index)
            .is_some_and(|node| node.elapsed(now) < node.interval)
    }

    pub(crate) fn is_active(&self, index: usize) -> bool {
        self.nodes.get(index).is_some_and(|node| node.active)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Active timers front to back.
    #[cfg(test)]
    pub(crate) fn active(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let mut cursor = self.head;
        while let Some(index) = cursor {
            order.push(index);
            cursor = self.nodes[index].next;
        }
        order
    }

    fn insert_sorted(&mut self, index: usize, now: Tick) {
        let key = (self.nodes[index].remaining(now), self.nodes[index].order);

        let mut cursor = self.tail;
        while let Some(c) = cursor {
            let node = &self.nodes[c];
            if (node.remaining(now), node.order) < key {
                break;
            }
            cursor = node.prev;
        }

        let next = match cursor {
            Some(c) => self.nodes[c].next,
            None => self.head,
        };

        let node = &mut self.nodes[index];
        node.prev = cursor;
        node.next = next;
        node.active = true;

        match cursor {
            Some(c) => self.nodes[c].next = Some(index),
            None => self.head = Some(index),
        }
        match next {
            Some(n) => self.nodes[n].prev = Some(index),
            None => self.tail = Some(index),
        }
    }

    fn unlink(&mut self, index: usize) {
        let node = &mut self.nodes[index];
        if !node.active {
            return;
        }
        let (prev, next) = (node.prev, node.next);
        node.prev = None;
        node.next = None;
        node.active = false;

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
    }
}

/// Software timer driven by a reactor.
///
/// Created unscheduled. Control calls are deferred requests applied by the
/// owning reactor, so they take effect on its next request drain. Dropping
/// the handle frees the timer.
pub struct Timer {
    shared: Arc<Shared>,
    index: usize,
    kind: TimerKind,
}

impl Timer {
    /// Allocate an unscheduled timer on `reactor`.
    ///
    /// Must be called from the reactor's owner thread.
    pub fn new<R, F>(reactor: &R, kind: TimerKind, callback: F) -> Self
    where
        R: AsRef<ReactorHandle> + ?Sized,
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::clone(reactor.as_ref().shared());
        shared.ensure_owner("timer alloc");
        let index = shared.timers.lock().alloc(kind, Box::new(callback));
        Self {
            shared,
            index,
            kind,
        }
    }

    /// Arm the timer to fire `interval` ticks after the request is applied.
    ///
    /// Restarts a timer that is already running. A periodic timer with a
    /// zero interval is a contract violation.
    pub fn start(&self, interval: u32) {
        self.shared.ensure_owner("timer start");
        if self.kind.is_periodic() {
            ensure(interval > 0, || Violation::ZeroIntervalPeriodic);
        }
        self.shared.post(Request::Start {
            timer: self.index,
            interval,
        });
    }

    /// Start again with the current interval.
    pub fn restart(&self) {
        self.start(self.interval());
    }

    /// Unschedule the timer.
    pub fn stop(&self) {
        self.shared.ensure_owner("timer stop");
        self.shared.post(Request::Stop { timer: self.index });
    }

    /// Release the timer; its callback is dropped on the next request drain.
    pub fn free(self) {
        drop(self);
    }

    /// Ticks left until the timer fires, zero if it is not running.
    pub fn remaining_time(&self) -> u32 {
        let now = self.shared.now();
        self.shared.timers.lock().remaining(self.index, now)
    }

    /// Interval of the last applied start request.
    pub fn interval(&self) -> u32 {
        self.shared.timers.lock().interval(self.index)
    }

    /// Whether less than one interval has elapsed since the timer started.
    pub fn is_running(&self) -> bool {
        let now = self.shared.now();
        self.shared.timers.lock().is_running(self.index, now)
    }

    /// Whether the timer currently sits in the active list.
    pub fn is_scheduled(&self) -> bool {
        self.shared.timers.lock().is_active(self.index)
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.shared.post(Request::Free { timer: self.index });
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("index", &self.index)
            .field("kind", &self.kind)
            .finish()
    }
}
