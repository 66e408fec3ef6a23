//! Reactor dispatch, request and stop behaviour.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{entries, log, virtual_reactor, Gate};
use ev_loop::{Direction, Progress, Reactor, Readiness, Timer, TimerKind};
use ev_port::Clock;

#[test]
fn subscribe_queues_object_that_is_already_ready() {
    let (mut reactor, _clock) = virtual_reactor();
    let gate = Gate::new();
    gate.force(Direction::In, true);

    reactor.subscribe(&gate, Direction::In, |_: &Gate| true);

    assert!(reactor.is_subscribed(&*gate, Direction::In));
    assert!(reactor.is_ready(&*gate, Direction::In));
    assert_eq!(reactor.ready_count(), 1);

    reactor.unsubscribe(&*gate);
}

#[test]
fn repeated_notify_queues_once() {
    let (mut reactor, _clock) = virtual_reactor();
    let gate = Gate::new();
    reactor.subscribe(&gate, Direction::In, |_: &Gate| true);
    assert_eq!(reactor.ready_count(), 0);

    gate.set(Direction::In, true);
    gate.set(Direction::In, true);
    gate.set(Direction::In, true);

    assert_eq!(reactor.ready_count(), 1);
    reactor.unsubscribe(&*gate);
}

#[test]
fn notify_on_unsubscribed_direction_is_ignored() {
    let (mut reactor, _clock) = virtual_reactor();
    let gate = Gate::new();
    reactor.subscribe(&gate, Direction::In, |_: &Gate| true);

    gate.set(Direction::Out, true);

    assert_eq!(reactor.ready_count(), 0);
    assert!(!reactor.is_ready(&*gate, Direction::Out));
    reactor.unsubscribe(&*gate);
}

#[test]
fn callback_is_repeated_while_progress_is_made() {
    let (mut reactor, _clock) = virtual_reactor();
    let handle = reactor.handle();
    let gate = Gate::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    reactor.subscribe(&gate, Direction::In, move |gate: &Gate| {
        if counter.fetch_add(1, Ordering::SeqCst) == 2 {
            gate.force(Direction::In, false);
            handle.stop();
        }
        Progress::Made
    });

    gate.set(Direction::In, true);
    reactor.run();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    reactor.unsubscribe(&*gate);
}

#[test]
fn blocked_callback_goes_behind_other_ready_objects() {
    let (mut reactor, _clock) = virtual_reactor();
    let handle = reactor.handle();
    let order = log();
    let a = Gate::new();
    let b = Gate::new();

    let record = order.clone();
    let first = Arc::new(AtomicUsize::new(0));
    reactor.subscribe(&a, Direction::In, move |gate: &Gate| {
        record.lock().unwrap().push("A");
        if first.fetch_add(1, Ordering::SeqCst) == 0 {
            return false;
        }
        gate.force(Direction::In, false);
        handle.stop();
        true
    });

    let record = order.clone();
    reactor.subscribe(&b, Direction::In, move |gate: &Gate| {
        record.lock().unwrap().push("B");
        gate.force(Direction::In, false);
        true
    });

    a.set(Direction::In, true);
    b.set(Direction::In, true);
    reactor.run();

    assert_eq!(entries(&order), vec!["A", "B", "A"]);
    reactor.unsubscribe(&*a);
    reactor.unsubscribe(&*b);
}

#[test]
fn level_dropped_before_service_skips_callback() {
    let (mut reactor, _clock) = virtual_reactor();
    let gate = Gate::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    reactor.subscribe(&gate, Direction::Out, move |_: &Gate| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    });

    gate.set(Direction::Out, true);
    gate.force(Direction::Out, false);

    let handle = reactor.handle();
    reactor.pend_callback(move || handle.stop());
    reactor.run();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(reactor.ready_count(), 0);
    reactor.unsubscribe(&*gate);
}

#[test]
fn stop_inside_callback_defers_remaining_work() {
    let (mut reactor, _clock) = virtual_reactor();
    let order = log();
    let a = Gate::new();
    let b = Gate::new();

    let record = order.clone();
    let handle = reactor.handle();
    reactor.subscribe(&a, Direction::In, move |gate: &Gate| {
        record.lock().unwrap().push("A");
        gate.force(Direction::In, false);
        handle.stop();
        true
    });

    let record = order.clone();
    let handle = reactor.handle();
    reactor.subscribe(&b, Direction::In, move |gate: &Gate| {
        record.lock().unwrap().push("B");
        gate.force(Direction::In, false);
        handle.stop();
        true
    });

    a.set(Direction::In, true);
    b.set(Direction::In, true);

    reactor.run();
    assert_eq!(entries(&order), vec!["A"]);
    assert!(!reactor.is_running());
    assert!(reactor.is_ready(&*b, Direction::In));

    reactor.run();
    assert_eq!(entries(&order), vec!["A", "B"]);

    reactor.unsubscribe(&*a);
    reactor.unsubscribe(&*b);
}

#[test]
fn stop_keeps_interrupted_subscription_at_head() {
    let (mut reactor, _clock) = virtual_reactor();
    let order = log();
    let a = Gate::new();
    let b = Gate::new();

    let record = order.clone();
    let handle = reactor.handle();
    let first = Arc::new(AtomicUsize::new(0));
    reactor.subscribe(&a, Direction::In, move |gate: &Gate| {
        record.lock().unwrap().push("A");
        if first.fetch_add(1, Ordering::SeqCst) == 0 {
            handle.stop();
        } else {
            gate.force(Direction::In, false);
        }
        true
    });

    let record = order.clone();
    let handle = reactor.handle();
    reactor.subscribe(&b, Direction::In, move |gate: &Gate| {
        record.lock().unwrap().push("B");
        gate.force(Direction::In, false);
        handle.stop();
        true
    });

    a.set(Direction::In, true);
    b.set(Direction::In, true);

    reactor.run();
    assert_eq!(entries(&order), vec!["A"]);
    assert!(reactor.is_ready(&*a, Direction::In));

    reactor.run();
    assert_eq!(entries(&order), vec!["A", "A", "B"]);

    reactor.unsubscribe(&*a);
    reactor.unsubscribe(&*b);
}

#[test]
fn pending_callbacks_run_in_posting_order() {
    let (mut reactor, _clock) = virtual_reactor();
    let order = log();

    let record = order.clone();
    reactor.pend_callback(move || record.lock().unwrap().push("A"));
    let record = order.clone();
    reactor.pend_callback(move || record.lock().unwrap().push("B"));
    let handle = reactor.handle();
    reactor.pend_callback(move || handle.stop());

    reactor.run();

    assert_eq!(entries(&order), vec!["A", "B"]);
}

#[test]
fn stop_mid_drain_keeps_later_requests() {
    let (mut reactor, _clock) = virtual_reactor();
    let order = log();

    let record = order.clone();
    let handle = reactor.handle();
    reactor.pend_callback(move || {
        record.lock().unwrap().push("A");
        handle.stop();
    });
    let record = order.clone();
    let handle = reactor.handle();
    reactor.pend_callback(move || {
        record.lock().unwrap().push("B");
        handle.stop();
    });

    reactor.run();
    assert_eq!(entries(&order), vec!["A"]);

    reactor.run();
    assert_eq!(entries(&order), vec!["A", "B"]);
}

#[test]
fn stop_before_run_leaves_requests_for_next_run() {
    let (mut reactor, _clock) = virtual_reactor();
    let ran = Arc::new(AtomicUsize::new(0));

    let counter = ran.clone();
    let handle = reactor.handle();
    reactor.pend_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        handle.stop();
    });
    reactor.stop();

    reactor.run();
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    reactor.run();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn tick_fires_on_interval_while_idle() {
    let (mut reactor, clock) = virtual_reactor();
    let fired = log();

    let record = fired.clone();
    let handle = reactor.handle();
    let source = clock.clone();
    reactor.tick_set(
        5,
        Some(Box::new(move || {
            let mut fired = record.lock().unwrap();
            fired.push(source.now().raw());
            if fired.len() == 3 {
                handle.stop();
            }
        })),
    );

    reactor.run();

    assert_eq!(entries(&fired), vec![5, 10, 15]);
    assert_eq!(reactor.now().raw(), 15);
}

#[test]
fn tick_can_be_disabled() {
    let (mut reactor, clock) = virtual_reactor();
    let fired = Arc::new(AtomicUsize::new(0));

    let counter = fired.clone();
    reactor.tick_set(
        5,
        Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    );
    reactor.tick_set(0, None);
    let handle = reactor.handle();
    reactor.pend_callback(move || handle.stop());

    reactor.run();

    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(clock.now().raw(), 0);
}

#[test]
fn max_wait_bounds_idle_sleep() {
    let clock = Arc::new(ev_port::ManualClock::new(0));
    let config = ev_loop::ReactorConfig::builder().max_wait(4).build();
    let mut reactor = Reactor::with_clock(config, clock.clone());
    let fired = log();

    let record = fired.clone();
    let handle = reactor.handle();
    let source = clock.clone();
    reactor.tick_set(
        10,
        Some(Box::new(move || {
            record.lock().unwrap().push(source.now().raw());
            handle.stop();
        })),
    );

    reactor.run();

    // Sleeps of 4, 4, 2 ticks.
    assert_eq!(entries(&fired), vec![10]);
}

#[test]
fn tick_skipped_while_busy() {
    let (mut reactor, clock) = virtual_reactor();
    let gate = Gate::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let ticks = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let source = clock.clone();
    reactor.subscribe(&gate, Direction::In, move |_: &Gate| {
        counter.fetch_add(1, Ordering::SeqCst);
        source.advance(1);
        false
    });
    gate.set(Direction::In, true);

    let counter = ticks.clone();
    reactor.tick_set(
        3,
        Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    );

    let handle = reactor.handle();
    let deadline = Timer::new(&reactor, TimerKind::OneShot, move || handle.stop());
    deadline.start(20);

    reactor.run();

    assert_eq!(ticks.load(Ordering::SeqCst), 0);
    assert!(calls.load(Ordering::SeqCst) >= 20);
    assert!(clock.now().raw() >= 20);
    reactor.unsubscribe(&*gate);
}

#[test]
fn notify_from_another_thread_wakes_reactor() {
    let mut reactor = Reactor::new();
    let gate = Gate::new();
    let handle = reactor.handle();
    let seen = Arc::new(AtomicUsize::new(0));

    let counter = seen.clone();
    reactor.subscribe(&gate, Direction::In, move |gate: &Gate| {
        counter.fetch_add(1, Ordering::SeqCst);
        gate.force(Direction::In, false);
        handle.stop();
        true
    });

    let remote = gate.clone();
    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        remote.set(Direction::In, true);
    });

    reactor.run();
    producer.join().unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    reactor.unsubscribe(&*gate);
}

#[test]
fn pend_and_stop_from_another_thread() {
    let mut reactor = Reactor::new();
    let handle = reactor.handle();
    let owner = reactor.owner();
    let ran_on = log();

    let record = ran_on.clone();
    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(5));
        assert!(!handle.is_owner_thread());
        let stopper = handle.clone();
        handle.pend_callback(move || {
            record.lock().unwrap().push(thread::current().id());
            stopper.stop();
        });
    });

    reactor.run();
    worker.join().unwrap();

    assert_eq!(entries(&ran_on), vec![owner]);
}

#[test]
fn concurrent_notify_keeps_single_membership() {
    let mut reactor = Reactor::new();
    let gate = Gate::new();
    let handle = reactor.handle();
    let calls = Arc::new(AtomicUsize::new(0));
    let low = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let misfires = low.clone();
    reactor.subscribe(&gate, Direction::In, move |gate: &Gate| {
        counter.fetch_add(1, Ordering::SeqCst);
        if !gate.level(Direction::In) {
            misfires.fetch_add(1, Ordering::SeqCst);
        }
        gate.force(Direction::In, false);
        true
    });

    let shared = gate.clone();
    let stopper = thread::spawn(move || {
        let producers: Vec<_> = (0..4)
            .map(|_| {
                let gate = shared.clone();
                thread::spawn(move || {
                    for _ in 0..2000 {
                        gate.set(Direction::In, true);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        handle.stop();
    });

    reactor.run();
    stopper.join().unwrap();

    assert!(reactor.ready_count() <= reactor.subscription_count());
    assert_eq!(low.load(Ordering::SeqCst), 0);
    // No wakeup lost: a set level is always queued.
    assert!(!gate.level(Direction::In) || reactor.is_ready(&*gate, Direction::In));
    reactor.unsubscribe(&*gate);
}

#[test]
fn is_running_reported_inside_callbacks() {
    let (mut reactor, _clock) = virtual_reactor();
    let handle = reactor.handle();
    let observed = log();

    let record = observed.clone();
    reactor.pend_callback(move || {
        record
            .lock()
            .unwrap()
            .push((handle.is_running(), handle.is_owner_thread()));
        handle.stop();
    });

    assert!(!reactor.is_running());
    reactor.run();
    assert!(!reactor.is_running());
    assert_eq!(entries(&observed), vec![(true, true)]);
}

#[test]
fn unsubscribe_removes_both_directions() {
    let (mut reactor, _clock) = virtual_reactor();
    let gate = Gate::new();
    reactor.subscribe(&gate, Direction::In, |_: &Gate| true);
    reactor.subscribe(&gate, Direction::Out, |_: &Gate| true);
    gate.set(Direction::In, true);
    gate.set(Direction::Out, true);
    assert_eq!(reactor.subscription_count(), 2);
    assert_eq!(reactor.ready_count(), 2);

    reactor.unsubscribe(&*gate);

    assert_eq!(reactor.subscription_count(), 0);
    assert_eq!(reactor.ready_count(), 0);
    assert!(!gate.link().is_bound(Direction::In));
    assert!(!gate.link().is_bound(Direction::Out));

    // A later notify reaches nobody.
    gate.set(Direction::In, true);
    assert_eq!(reactor.ready_count(), 0);
}

#[test]
fn object_can_move_between_reactors() {
    let (mut first, _a) = virtual_reactor();
    let (mut second, _b) = virtual_reactor();
    let gate = Gate::new();

    first.subscribe(&gate, Direction::In, |_: &Gate| true);
    first.unsubscribe(&*gate);
    second.subscribe(&gate, Direction::In, |_: &Gate| true);

    gate.set(Direction::In, true);
    assert_eq!(first.ready_count(), 0);
    assert_eq!(second.ready_count(), 1);
    second.unsubscribe(&*gate);
}

#[test]
#[should_panic(expected = "contract violation")]
fn duplicate_subscription_is_fatal() {
    let (mut reactor, _clock) = virtual_reactor();
    let gate = Gate::new();
    reactor.subscribe(&gate, Direction::In, |_: &Gate| true);
    reactor.subscribe(&gate, Direction::In, |_: &Gate| true);
}

#[test]
#[should_panic(expected = "contract violation")]
fn second_reactor_on_same_slot_is_fatal() {
    let (mut first, _a) = virtual_reactor();
    let (mut second, _b) = virtual_reactor();
    let gate = Gate::new();
    first.subscribe(&gate, Direction::Out, |_: &Gate| true);
    second.subscribe(&gate, Direction::Out, |_: &Gate| true);
}

#[test]
#[should_panic(expected = "contract violation")]
fn unsubscribe_unknown_object_is_fatal() {
    let (mut reactor, _clock) = virtual_reactor();
    let gate = Gate::new();
    reactor.unsubscribe(&*gate);
}

#[test]
#[should_panic(expected = "contract violation")]
fn tick_interval_without_callback_is_fatal() {
    let (reactor, _clock) = virtual_reactor();
    reactor.tick_set(5, None);
}

#[test]
#[should_panic(expected = "contract violation")]
fn tick_callback_without_interval_is_fatal() {
    let (reactor, _clock) = virtual_reactor();
    reactor.tick_set(0, Some(Box::new(|| {})));
}

#[test]
#[should_panic(expected = "contract violation")]
fn drop_with_live_subscription_is_fatal() {
    let (mut reactor, _clock) = virtual_reactor();
    let gate = Gate::new();
    reactor.subscribe(&gate, Direction::In, |_: &Gate| true);
    drop(reactor);
}

#[test]
fn subscribe_from_foreign_thread_is_fatal() {
    let (mut reactor, _clock) = virtual_reactor();
    let gate = Gate::new();

    let result = thread::spawn(move || {
        reactor.subscribe(&gate, Direction::In, |_: &Gate| true);
    })
    .join();

    assert!(result.is_err());
}

#[test]
fn run_from_foreign_thread_is_fatal() {
    let (mut reactor, _clock) = virtual_reactor();
    let result = thread::spawn(move || reactor.run()).join();
    assert!(result.is_err());
}
