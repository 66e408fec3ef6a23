//! State reachable from outside the owner thread

use core::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use ev_core::{ensure, Tick, Violation};
use ev_port::{current_thread_id, Clock, CsMutex, NotificationChannel, ThreadId};

use crate::request::Request;
use crate::timer::TimerSet;
use crate::waiting::WaitList;

/// A subscription became ready.
pub(crate) const FLAG_EVENT: u32 = 1 << 0;
/// Control requests or pending callbacks were queued.
pub(crate) const FLAG_REQUEST: u32 = 1 << 1;
/// The loop was asked to stop.
pub(crate) const FLAG_STOP: u32 = 1 << 2;
pub(crate) const FLAG_ALL: u32 = FLAG_EVENT | FLAG_REQUEST | FLAG_STOP;

pub(crate) struct Shared {
    pub(crate) name: &'static str,
    pub(crate) owner: ThreadId,
    pub(crate) channel: NotificationChannel,
    pub(crate) waiting: CsMutex<RefCell<WaitList>>,
    pub(crate) requests: Mutex<VecDeque<Request>>,
    pub(crate) timers: Mutex<TimerSet>,
    pub(crate) running: AtomicBool,
}

impl Shared {
    pub(crate) fn new(name: &'static str, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            owner: current_thread_id(),
            channel: NotificationChannel::new(clock),
            waiting: CsMutex::new(RefCell::new(WaitList::default())),
            requests: Mutex::new(VecDeque::new()),
            timers: Mutex::new(TimerSet::default()),
            running: AtomicBool::new(false),
        }
    }

    pub(crate) fn now(&self) -> Tick {
        self.channel.clock().now()
    }

    pub(crate) fn is_owner_thread(&self) -> bool {
        current_thread_id() == self.owner
    }

    #[track_caller]
    pub(crate) fn ensure_owner(&self, operation: &'static str) {
        ensure(self.is_owner_thread(), || Violation::NotOwner { operation });
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.channel.pending() & FLAG_STOP != 0
    }

    /// Queue a control request for the next drain.
    pub(crate) fn post(&self, request: Request) {
        self.requests.lock().push_back(request);
        self.channel.set_bits(FLAG_REQUEST);
    }
}
