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

//! Monotonic time primitives.
//!
//! The scheduler's entire notion of "when" is the [`Timestamp`]: an opaque
//! point on the process-wide monotonic clock. Tasks carry timestamps for
//! their execution and expiration windows, and the event loop compares them
//! against the clock, never against wall-clock dates.

mod timestamp;

pub use self::timestamp::Timestamp;
