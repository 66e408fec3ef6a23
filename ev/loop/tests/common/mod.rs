//! Test primitive with directly settable levels.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ev_loop::{notify, Direction, Link, Readiness, Reactor, ReactorConfig};
use ev_port::ManualClock;

pub struct Gate {
    link: Link,
    levels: [AtomicBool; 2],
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            link: Link::new(),
            levels: [AtomicBool::new(false), AtomicBool::new(false)],
        })
    }

    /// Set the level and notify without taking any reactor lock.
    pub fn set(&self, direction: Direction, level: bool) {
        self.levels[direction.index()].store(level, Ordering::SeqCst);
        notify(&self.link, direction);
    }

    /// Change the level without notifying.
    pub fn force(&self, direction: Direction, level: bool) {
        self.levels[direction.index()].store(level, Ordering::SeqCst);
    }
}

impl Readiness for Gate {
    fn link(&self) -> &Link {
        &self.link
    }

    fn level(&self, direction: Direction) -> bool {
        self.levels[direction.index()].load(Ordering::SeqCst)
    }
}

/// Reactor driven by a manual clock starting at zero.
pub fn virtual_reactor() -> (Reactor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let config = ReactorConfig::builder().name("test").build();
    (Reactor::with_clock(config, clock.clone()), clock)
}

pub type Log<T> = Arc<Mutex<Vec<T>>>;

pub fn log<T>() -> Log<T> {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries<T: Clone>(log: &Log<T>) -> Vec<T> {
    log.lock().unwrap().clone()
}
