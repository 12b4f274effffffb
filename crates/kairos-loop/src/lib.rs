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

//! # Kairos Loop
//!
//! The event loop service. Producers on any thread hand [`AsyncTask`]s to
//! the loop through [`EventLoop::dispatch`], [`EventLoop::set_timeout`] and
//! [`EventLoop::set_interval`] (or through a cloned [`LoopHandle`]); a
//! single background thread polls the queue at a fixed interval and runs
//! each task inside its execution window.
//!
//! [`AsyncTask`]: kairos_core::task::AsyncTask

pub mod error;
pub mod service;

pub use error::DispatchError;
pub use service::{EventLoop, EventLoopConfig, LoopHandle};
