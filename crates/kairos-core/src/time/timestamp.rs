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

use std::ops::{Add, Sub};
use std::time::{Duration, Instant};

/// A point on the process-wide monotonic clock.
///
/// `Timestamp` wraps [`Instant`] and adds the small vocabulary the scheduler
/// needs: "some offset from now" constructors and a [`has_passed`] check.
/// It is `Copy` and totally ordered, so it can key ordered collections.
///
/// [`has_passed`]: Timestamp::has_passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Instant);

impl Timestamp {
    /// Returns the current point on the monotonic clock.
    pub fn now() -> Self {
        Self(Instant::now())
    }

    /// Returns the timestamp `offset` from now.
    pub fn after(offset: Duration) -> Self {
        Self(Instant::now() + offset)
    }

    /// Returns the timestamp `millis` milliseconds from now.
    pub fn after_millis(millis: u64) -> Self {
        Self::after(Duration::from_millis(millis))
    }

    /// Returns the timestamp `secs` seconds from now.
    pub fn after_secs(secs: u64) -> Self {
        Self::after(Duration::from_secs(secs))
    }

    /// Returns `true` once the clock has reached this timestamp.
    ///
    /// A timestamp equal to "now" counts as passed.
    pub fn has_passed(&self) -> bool {
        self.0 <= Instant::now()
    }

    /// Returns the duration from `earlier` to `self`, or zero if `earlier`
    /// is actually the later of the two.
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0 + rhs)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    /// Panics on underflow, exactly as `Instant - Duration` does.
    fn sub(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0 - rhs)
    }
}
