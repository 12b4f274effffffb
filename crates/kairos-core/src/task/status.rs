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

/// Where a task stands relative to its scheduling window.
///
/// Expiration takes priority over readiness: a task whose whole window has
/// passed is [`Expired`](TaskStatus::Expired), never
/// [`Ready`](TaskStatus::Ready), and must not execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The execution time has not arrived yet.
    Deferred,
    /// The execution time has passed and the expiration time has not.
    Ready,
    /// The expiration time has passed; the task must be discarded unexecuted.
    Expired,
}

/// The callback's own verdict on a single execution.
///
/// The boolean the callback returns is all the insight the scheduler gets;
/// a failure carries no reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The callback returned `true`.
    Success,
    /// The callback returned `false`.
    Failure,
}
