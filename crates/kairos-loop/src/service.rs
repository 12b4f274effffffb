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

//! The event loop service.

use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use kairos_core::task::{AsyncTask, TaskOutcome, TaskStatus, DEFAULT_EXPIRY_GRACE};
use kairos_core::time::Timestamp;

use crate::error::DispatchError;

/// Configuration for the event loop.
#[derive(Debug, Clone)]
pub struct EventLoopConfig {
    /// Maximum number of live tasks the loop will hold at once.
    /// Dispatching into a full loop fails immediately.
    pub capacity: usize,
    /// Fixed sleep between polls of the queue. Task latency is bounded
    /// below by this interval, not by execution-time precision.
    pub poll_interval: Duration,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            poll_interval: Duration::from_millis(25),
        }
    }
}

/// State shared between the dispatching side and the loop thread.
struct Shared {
    intake_tx: Sender<AsyncTask>,
    /// Live tasks anywhere in the scheduler: intake channel, due-queue, or
    /// mid-execution. The admission gate that makes `capacity` mean
    /// "outstanding tasks" rather than "channel occupancy".
    pending: AtomicUsize,
    capacity: usize,
    running: AtomicBool,
}

impl Shared {
    fn set_timeout(
        &self,
        callback: impl FnMut() -> bool + Send + 'static,
        delay: Duration,
    ) -> Result<(), DispatchError> {
        let execute_at = Timestamp::after(delay);
        self.admit(AsyncTask::with_window(
            callback,
            execute_at,
            execute_at + DEFAULT_EXPIRY_GRACE,
        ))
    }

    fn set_interval(
        &self,
        callback: impl FnMut() -> bool + Send + 'static,
        every: Duration,
    ) -> Result<(), DispatchError> {
        let execute_at = Timestamp::after(every);
        self.admit(
            AsyncTask::with_window(callback, execute_at, execute_at + DEFAULT_EXPIRY_GRACE)
                .repeating(every),
        )
    }

    /// Single admission path for every scheduling method. Reserves a
    /// capacity slot, then hands the task to the intake channel.
    fn admit(&self, task: AsyncTask) -> Result<(), DispatchError> {
        let mut pending = self.pending.load(Ordering::SeqCst);
        loop {
            if pending >= self.capacity {
                log::error!(
                    "Event loop is full ({} tasks); rejecting task '{}'.",
                    self.capacity,
                    task.label()
                );
                return Err(DispatchError::QueueFull {
                    capacity: self.capacity,
                });
            }
            match self.pending.compare_exchange(
                pending,
                pending + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => pending = actual,
            }
        }

        match self.intake_tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(task)) => {
                self.release_slot();
                log::error!(
                    "Event loop intake is full ({} tasks); rejecting task '{}'.",
                    self.capacity,
                    task.label()
                );
                Err(DispatchError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Disconnected(task)) => {
                self.release_slot();
                log::error!(
                    "Event loop has shut down; rejecting task '{}'.",
                    task.label()
                );
                Err(DispatchError::Stopped)
            }
        }
    }

    fn release_slot(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An entry in the loop-local due-queue, min-ordered by execution time with
/// a FIFO sequence number breaking ties.
struct QueuedTask {
    due: Timestamp,
    seq: u64,
    task: AsyncTask,
}

impl QueuedTask {
    fn key(&self) -> (Timestamp, u64) {
        (self.due, self.seq)
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.key().cmp(&other.key())
    }
}

/// The asynchronous task scheduler.
///
/// Owns a fixed-capacity queue of [`AsyncTask`]s and a polling loop that
/// services them, meant to run on a dedicated background thread so deferred
/// work stays off the render loop. Producers on any thread dispatch through
/// the loop itself or through a cloned [`LoopHandle`]; exactly one thread
/// consumes.
///
/// Tasks are serviced in execution-time order: the loop drains the intake
/// channel into a due-queue keyed by `execute_at`, so a far-future task
/// never delays a near-term one regardless of dispatch order.
pub struct EventLoop {
    config: EventLoopConfig,
    shared: Arc<Shared>,
    intake_rx: Receiver<AsyncTask>,
    handle: Option<thread::JoinHandle<()>>,
}

impl EventLoop {
    /// Creates an event loop with the given configuration. The loop does
    /// not poll until [`run`](Self::run) or [`start`](Self::start) is
    /// called, but the queue accepts tasks immediately.
    pub fn new(config: EventLoopConfig) -> Self {
        let (intake_tx, intake_rx) = crossbeam_channel::bounded(config.capacity);
        let shared = Arc::new(Shared {
            intake_tx,
            pending: AtomicUsize::new(0),
            capacity: config.capacity,
            running: AtomicBool::new(false),
        });
        Self {
            config,
            shared,
            intake_rx,
            handle: None,
        }
    }

    /// Returns a cheap, cloneable handle for dispatching from other threads.
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Schedules a one-shot task to run `delay` from now, with the default
    /// expiration grace window after that.
    pub fn set_timeout(
        &self,
        callback: impl FnMut() -> bool + Send + 'static,
        delay: Duration,
    ) -> Result<(), DispatchError> {
        self.shared.set_timeout(callback, delay)
    }

    /// Schedules a repeating task firing every `every`, starting one
    /// interval from now. A failed run does not cancel the repetition.
    pub fn set_interval(
        &self,
        callback: impl FnMut() -> bool + Send + 'static,
        every: Duration,
    ) -> Result<(), DispatchError> {
        self.shared.set_interval(callback, every)
    }

    /// Admits an explicitly built task, for callers needing finer control
    /// over the execution window than [`set_timeout`](Self::set_timeout)
    /// offers.
    pub fn dispatch(&self, task: AsyncTask) -> Result<(), DispatchError> {
        self.shared.admit(task)
    }

    /// Runs the polling loop on the calling thread until a stop is
    /// requested. Intended for a dedicated background thread, never the
    /// render thread; [`start`](Self::start) manages that thread for you.
    pub fn run(&self) {
        if self.shared.running.load(Ordering::SeqCst) {
            log::warn!("Event loop is already running.");
            return;
        }
        self.shared.running.store(true, Ordering::SeqCst);
        Self::poll_loop(&self.shared, &self.intake_rx, self.config.poll_interval);
    }

    /// Starts the polling loop on a background thread.
    pub fn start(&mut self) {
        if self.shared.running.load(Ordering::SeqCst) {
            log::warn!("Event loop is already running.");
            return;
        }
        self.shared.running.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let intake_rx = self.intake_rx.clone();
        let poll_interval = self.config.poll_interval;
        self.handle = Some(thread::spawn(move || {
            Self::poll_loop(&shared, &intake_rx, poll_interval);
        }));
    }

    /// Stops the polling loop and joins its thread. Tasks still pending are
    /// discarded; tasks still in the intake channel survive a later
    /// [`start`](Self::start).
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn poll_loop(shared: &Shared, intake_rx: &Receiver<AsyncTask>, poll_interval: Duration) {
        let mut due_queue: BinaryHeap<Reverse<QueuedTask>> = BinaryHeap::new();
        let mut next_seq: u64 = 0;

        log::info!(
            "Event loop started (capacity {}, polling every {:?}).",
            shared.capacity,
            poll_interval
        );

        while shared.running.load(Ordering::Relaxed) {
            let tick_start = Instant::now();

            // 1. Drain freshly dispatched tasks into the due-queue.
            while let Ok(task) = intake_rx.try_recv() {
                due_queue.push(Reverse(QueuedTask {
                    due: task.execute_at(),
                    seq: next_seq,
                    task,
                }));
                next_seq += 1;
            }

            // 2. Service every task whose execution time has passed.
            while due_queue
                .peek()
                .is_some_and(|Reverse(next)| next.due.has_passed())
            {
                let Some(Reverse(mut entry)) = due_queue.pop() else {
                    break;
                };
                match entry.task.status() {
                    TaskStatus::Expired => {
                        log::trace!(
                            "Task '{}' expired before it could run; dropping it.",
                            entry.task.label()
                        );
                        shared.release_slot();
                    }
                    TaskStatus::Ready => {
                        match entry.task.execute() {
                            TaskOutcome::Success => {
                                log::trace!("Task '{}' completed.", entry.task.label());
                            }
                            TaskOutcome::Failure => {
                                log::error!("Task '{}' reported failure.", entry.task.label());
                            }
                        }
                        if let Some(every) = entry.task.interval() {
                            // Failure does not cancel repetition; the task
                            // keeps its capacity slot and a fresh window.
                            let next_at = Timestamp::now() + every;
                            entry.task.reschedule(next_at, next_at + DEFAULT_EXPIRY_GRACE);
                            entry.due = next_at;
                            entry.seq = next_seq;
                            next_seq += 1;
                            due_queue.push(Reverse(entry));
                        } else {
                            shared.release_slot();
                        }
                    }
                    TaskStatus::Deferred => {
                        // A due entry is at least ready; the clock cannot
                        // move backwards. Put it back and end the sweep.
                        due_queue.push(Reverse(entry));
                        break;
                    }
                }
            }

            // 3. Sleep out the remainder of the poll interval.
            let elapsed = tick_start.elapsed();
            if elapsed < poll_interval {
                thread::sleep(poll_interval - elapsed);
            }
        }

        if !due_queue.is_empty() {
            log::info!(
                "Event loop stopped; discarding {} pending task(s).",
                due_queue.len()
            );
            for _ in due_queue.drain() {
                shared.release_slot();
            }
        } else {
            log::info!("Event loop stopped.");
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new(EventLoopConfig::default())
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A cheap, cloneable dispatch handle to a running [`EventLoop`].
///
/// Producer threads keep one of these instead of a reference to the loop
/// itself. The handle can also request a stop, which the loop thread
/// notices on its next tick; it never joins.
#[derive(Clone)]
pub struct LoopHandle {
    shared: Arc<Shared>,
}

impl LoopHandle {
    /// See [`EventLoop::set_timeout`].
    pub fn set_timeout(
        &self,
        callback: impl FnMut() -> bool + Send + 'static,
        delay: Duration,
    ) -> Result<(), DispatchError> {
        self.shared.set_timeout(callback, delay)
    }

    /// See [`EventLoop::set_interval`].
    pub fn set_interval(
        &self,
        callback: impl FnMut() -> bool + Send + 'static,
        every: Duration,
    ) -> Result<(), DispatchError> {
        self.shared.set_interval(callback, every)
    }

    /// See [`EventLoop::dispatch`].
    pub fn dispatch(&self, task: AsyncTask) -> Result<(), DispatchError> {
        self.shared.admit(task)
    }

    /// Requests the loop to stop without joining its thread.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }
}
