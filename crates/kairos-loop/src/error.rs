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

//! Error types for the scheduling API.

use thiserror::Error;

/// Why a task was not accepted by the event loop.
///
/// Dispatching never blocks: either the task is admitted immediately or one
/// of these comes back and the task is lost.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The scheduler already holds its full complement of live tasks.
    #[error("event loop is at capacity ({capacity} tasks); task rejected")]
    QueueFull {
        /// The capacity the loop was built with.
        capacity: usize,
    },
    /// The event loop has been torn down and no longer accepts work.
    #[error("event loop has shut down; task rejected")]
    Stopped,
}
