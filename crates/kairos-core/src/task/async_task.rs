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

use std::fmt;
use std::time::Duration;

use crate::task::{TaskOutcome, TaskStatus};
use crate::time::Timestamp;

/// The callback signature carried by an [`AsyncTask`].
///
/// The `Send + 'static` bounds require captured state to be owned by the
/// closure: a task crosses from the dispatching thread to the loop thread,
/// so borrowing the caller's stack is a compile error rather than a hazard.
pub type TaskCallback = Box<dyn FnMut() -> bool + Send + 'static>;

/// Grace window appended after the execution time whenever an expiration
/// time is derived rather than supplied by the caller.
pub const DEFAULT_EXPIRY_GRACE: Duration = Duration::from_secs(5);

/// A deferred unit of work with an execution window.
///
/// A task may run once its `execute_at` has passed, and must be discarded
/// unexecuted once its `expires_at` has passed. A repeating task carries the
/// interval with which the event loop reopens its window after each run.
pub struct AsyncTask {
    callback: TaskCallback,
    scheduled_at: Timestamp,
    execute_at: Timestamp,
    expires_at: Timestamp,
    repeat_every: Option<Duration>,
    name: Option<String>,
}

impl AsyncTask {
    /// Creates a task that may run immediately and expires after the
    /// default grace window.
    pub fn new(callback: impl FnMut() -> bool + Send + 'static) -> Self {
        let now = Timestamp::now();
        Self::with_window(callback, now, now + DEFAULT_EXPIRY_GRACE)
    }

    /// Creates a task with an explicit execution window.
    ///
    /// The expiration time must fall after the execution time; a window that
    /// ends before it opens is corrected to `execute_at` plus
    /// [`DEFAULT_EXPIRY_GRACE`], with a warning.
    pub fn with_window(
        callback: impl FnMut() -> bool + Send + 'static,
        execute_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        let expires_at = if expires_at <= execute_at {
            log::warn!(
                "Task expiration window ends before it opens; extending it to {:?} past the execution time.",
                DEFAULT_EXPIRY_GRACE
            );
            execute_at + DEFAULT_EXPIRY_GRACE
        } else {
            expires_at
        };
        Self {
            callback: Box::new(callback),
            scheduled_at: Timestamp::now(),
            execute_at,
            expires_at,
            repeat_every: None,
            name: None,
        }
    }

    /// Attaches a diagnostic name, used only in log output.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the task as repeating with the given interval.
    pub fn repeating(mut self, every: Duration) -> Self {
        self.repeat_every = Some(every);
        self
    }

    /// Computes the task's status against the clock right now.
    pub fn status(&self) -> TaskStatus {
        self.status_at(Timestamp::now())
    }

    /// Computes the task's status as observed at `now`.
    ///
    /// Expiration is evaluated strictly before readiness, and a tie at the
    /// expiration time counts as expired.
    pub fn status_at(&self, now: Timestamp) -> TaskStatus {
        if now >= self.expires_at {
            TaskStatus::Expired
        } else if now >= self.execute_at {
            TaskStatus::Ready
        } else {
            TaskStatus::Deferred
        }
    }

    /// Runs the callback once and reports its verdict.
    ///
    /// A callback that panics is outside the contract; nothing here
    /// contains it.
    pub fn execute(&mut self) -> TaskOutcome {
        if (self.callback)() {
            TaskOutcome::Success
        } else {
            TaskOutcome::Failure
        }
    }

    /// Moves the execution window. Used by the event loop to open the next
    /// firing window of a repeating task.
    pub fn reschedule(&mut self, execute_at: Timestamp, expires_at: Timestamp) {
        self.execute_at = execute_at;
        self.expires_at = expires_at;
    }

    /// The time the task was created.
    pub fn scheduled_at(&self) -> Timestamp {
        self.scheduled_at
    }

    /// The earliest time the task may run.
    pub fn execute_at(&self) -> Timestamp {
        self.execute_at
    }

    /// The time after which the task must be discarded unexecuted.
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Whether the task reschedules itself after executing.
    pub fn should_repeat(&self) -> bool {
        self.repeat_every.is_some()
    }

    /// The repeat interval, if the task is repeating.
    pub fn interval(&self) -> Option<Duration> {
        self.repeat_every
    }

    /// The diagnostic name, or `"unnamed"`.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

impl fmt::Debug for AsyncTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTask")
            .field("name", &self.label())
            .field("scheduled_at", &self.scheduled_at)
            .field("execute_at", &self.execute_at)
            .field("expires_at", &self.expires_at)
            .field("repeat_every", &self.repeat_every)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn noop() -> impl FnMut() -> bool + Send + 'static {
        || true
    }

    #[test]
    fn status_grid_around_the_window() {
        let t = Timestamp::after_secs(1);
        let task = AsyncTask::with_window(noop(), t, t + DEFAULT_EXPIRY_GRACE);

        assert_eq!(
            task.status_at(t - Duration::from_millis(1)),
            TaskStatus::Deferred
        );
        assert_eq!(
            task.status_at(t + Duration::from_millis(10)),
            TaskStatus::Ready
        );
        assert_eq!(
            task.status_at(t + Duration::from_millis(5001)),
            TaskStatus::Expired
        );
    }

    #[test]
    fn expiration_wins_ties() {
        let t = Timestamp::after_secs(1);
        let task = AsyncTask::with_window(noop(), t, t + DEFAULT_EXPIRY_GRACE);

        // Both boundaries count as passed the instant they are reached, and
        // the expiration check runs first.
        assert_eq!(task.status_at(t), TaskStatus::Ready);
        assert_eq!(
            task.status_at(t + DEFAULT_EXPIRY_GRACE),
            TaskStatus::Expired
        );
    }

    #[test]
    fn expired_even_when_also_ready() {
        let t = Timestamp::after_secs(1);
        let task = AsyncTask::with_window(noop(), t, t + Duration::from_millis(100));

        // Well past both boundaries: readiness alone would say Ready, but
        // the task must report Expired.
        assert_eq!(
            task.status_at(t + Duration::from_secs(30)),
            TaskStatus::Expired
        );
    }

    #[test]
    fn inverted_window_is_corrected() {
        let t = Timestamp::after_secs(2);
        let task = AsyncTask::with_window(noop(), t, t - Duration::from_secs(1));

        assert_eq!(task.expires_at(), t + DEFAULT_EXPIRY_GRACE);
    }

    #[test]
    fn execute_reports_the_callback_verdict() {
        let mut ok = AsyncTask::new(|| true);
        let mut failing = AsyncTask::new(|| false);

        assert_eq!(ok.execute(), TaskOutcome::Success);
        assert_eq!(failing.execute(), TaskOutcome::Failure);
    }

    #[test]
    fn execute_runs_the_owned_closure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut task = AsyncTask::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        task.execute();
        task.execute();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reschedule_moves_the_window() {
        let t = Timestamp::after_secs(1);
        let mut task = AsyncTask::with_window(noop(), t, t + DEFAULT_EXPIRY_GRACE);

        let scheduled_at = task.scheduled_at();
        let next = t + Duration::from_secs(10);
        task.reschedule(next, next + DEFAULT_EXPIRY_GRACE);

        assert_eq!(task.execute_at(), next);
        assert_eq!(task.expires_at(), next + DEFAULT_EXPIRY_GRACE);
        assert_eq!(task.status_at(t), TaskStatus::Deferred);
        // Rescheduling moves the window, not the creation time.
        assert_eq!(task.scheduled_at(), scheduled_at);
    }

    #[test]
    fn builder_metadata() {
        let task = AsyncTask::new(noop())
            .named("heartbeat")
            .repeating(Duration::from_millis(200));

        assert_eq!(task.label(), "heartbeat");
        assert!(task.should_repeat());
        assert_eq!(task.interval(), Some(Duration::from_millis(200)));

        let plain = AsyncTask::new(noop());
        assert_eq!(plain.label(), "unnamed");
        assert!(!plain.should_repeat());
        assert_eq!(plain.interval(), None);
    }
}
