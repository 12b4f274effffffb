// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end scheduling scenarios, driven through the public API with real
//! time. Margins are deliberately generous: the contract under test is
//! "never early, at most once, keeps repeating", not tight latency.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use kairos_core::task::AsyncTask;
use kairos_core::time::Timestamp;
use kairos_loop::{EventLoop, EventLoopConfig};

fn test_config() -> EventLoopConfig {
    EventLoopConfig {
        capacity: 16,
        poll_interval: Duration::from_millis(10),
    }
}

fn counting_callback(hits: &Arc<AtomicUsize>) -> impl FnMut() -> bool + Send + 'static {
    let hits = Arc::clone(hits);
    move || {
        hits.fetch_add(1, Ordering::SeqCst);
        true
    }
}

#[test]
fn timeout_fires_once_and_never_early() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut lp = EventLoop::new(test_config());
    lp.start();

    lp.set_timeout(counting_callback(&hits), Duration::from_millis(300))
        .expect("dispatch should succeed");

    // Well inside the delay: nothing may have fired yet.
    thread::sleep(Duration::from_millis(100));
    assert_eq!(
        hits.load(Ordering::SeqCst),
        0,
        "Task ran before its execution time"
    );

    // Well past the delay plus poll latency: exactly one firing.
    thread::sleep(Duration::from_millis(400));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // And it stays at one; a one-shot task runs at most once.
    thread::sleep(Duration::from_millis(200));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    lp.stop();
}

#[test]
fn interval_fires_repeatedly_with_increasing_spacing() {
    let fire_times: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&fire_times);

    let mut lp = EventLoop::new(test_config());
    lp.start();

    lp.set_interval(
        move || {
            recorder.lock().unwrap().push(Instant::now());
            true
        },
        Duration::from_millis(50),
    )
    .expect("dispatch should succeed");

    thread::sleep(Duration::from_millis(500));
    lp.stop();

    let fire_times = fire_times.lock().unwrap();
    assert!(
        fire_times.len() >= 3,
        "Expected several firings in 500ms at a 50ms interval, got {}",
        fire_times.len()
    );
    for pair in fire_times.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= Duration::from_millis(40),
            "Firings spaced {gap:?} apart; the interval is 50ms"
        );
    }
}

#[test]
fn failing_interval_task_keeps_repeating() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let mut lp = EventLoop::new(test_config());
    lp.start();

    // Through a handle, the way a game system would dispatch.
    lp.handle()
        .set_interval(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            },
            Duration::from_millis(30),
        )
        .expect("dispatch should succeed");

    thread::sleep(Duration::from_millis(300));
    lp.stop();

    assert!(
        hits.load(Ordering::SeqCst) >= 2,
        "A failing repeating task must still fire on later intervals"
    );
}

#[test]
fn expired_task_is_dropped_unexecuted() {
    let hits = Arc::new(AtomicUsize::new(0));

    // Build the loop but let the task's whole window elapse before polling
    // begins: both boundaries have passed, and expiration must win.
    let mut lp = EventLoop::new(test_config());
    lp.dispatch(AsyncTask::with_window(
        counting_callback(&hits),
        Timestamp::now(),
        Timestamp::after_millis(50),
    ))
    .expect("dispatch should succeed");

    thread::sleep(Duration::from_millis(150));
    lp.start();
    thread::sleep(Duration::from_millis(100));
    lp.stop();

    assert_eq!(
        hits.load(Ordering::SeqCst),
        0,
        "An expired task must never execute"
    );
}

#[test]
fn far_future_task_dies_with_the_loop() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut lp = EventLoop::new(test_config());
    lp.start();

    lp.set_timeout(counting_callback(&hits), Duration::from_secs(10))
        .expect("dispatch should succeed");

    thread::sleep(Duration::from_millis(100));
    lp.stop();

    assert_eq!(
        hits.load(Ordering::SeqCst),
        0,
        "A task whose execution time never arrived must not fire"
    );
}

#[test]
fn producer_threads_dispatch_through_a_handle() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut lp = EventLoop::new(test_config());
    lp.start();

    let handle = lp.handle();
    let producers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            let callback = counting_callback(&hits);
            thread::spawn(move || {
                handle
                    .set_timeout(callback, Duration::from_millis(20))
                    .expect("dispatch should succeed");
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    thread::sleep(Duration::from_millis(300));
    lp.stop();

    assert_eq!(
        hits.load(Ordering::SeqCst),
        4,
        "Every producer's task should have fired exactly once"
    );
}

#[test]
fn loop_runs_on_a_caller_owned_thread() {
    let hits = Arc::new(AtomicUsize::new(0));
    let lp = EventLoop::new(test_config());
    let handle = lp.handle();

    handle
        .set_timeout(counting_callback(&hits), Duration::from_millis(30))
        .expect("dispatch should succeed");

    // The caller owns the thread and blocks it in `run`; the handle is the
    // only way back in.
    let loop_thread = thread::spawn(move || lp.run());
    thread::sleep(Duration::from_millis(300));
    handle.stop();
    loop_thread.join().expect("loop thread panicked");

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn tasks_fire_in_execution_time_order() {
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let mut lp = EventLoop::new(test_config());

    // Dispatched far-first, but the near task must still fire first.
    for (name, delay_ms) in [("far", 150u64), ("near", 40u64)] {
        let order = Arc::clone(&order);
        lp.set_timeout(
            move || {
                order.lock().unwrap().push(name);
                true
            },
            Duration::from_millis(delay_ms),
        )
        .expect("dispatch should succeed");
    }

    lp.start();
    thread::sleep(Duration::from_millis(400));
    lp.stop();

    assert_eq!(*order.lock().unwrap(), vec!["near", "far"]);
}
