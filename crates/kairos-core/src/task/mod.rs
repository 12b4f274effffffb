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

//! The unit of deferred work serviced by the event loop.
//!
//! An [`AsyncTask`] owns a zero-argument callback together with its
//! scheduling window. It is a plain value: moved into the loop's queue on
//! dispatch, moved out to execute, and dropped (or pushed back with a fresh
//! window, for repeating tasks) afterwards. It is never shared between
//! threads, which is what makes the callback side of the design safe without
//! any locking on task internals.

mod async_task;
mod status;

pub use self::async_task::{AsyncTask, TaskCallback, DEFAULT_EXPIRY_GRACE};
pub use self::status::{TaskOutcome, TaskStatus};
