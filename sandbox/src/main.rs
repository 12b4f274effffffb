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

// Kairos Sandbox
// Main binary for exercising the scheduler end to end.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use kairos_core::task::AsyncTask;
use kairos_core::time::Timestamp;
use kairos_loop::{EventLoop, EventLoopConfig};

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("trace")).init();

    let mut event_loop = EventLoop::new(EventLoopConfig::default());
    event_loop.start();

    // One-shot greeting half a second out.
    event_loop.set_timeout(
        || {
            log::info!("Hello from a deferred task!");
            true
        },
        Duration::from_millis(500),
    )?;

    // Repeating heartbeat. It holds its queue slot until the loop stops.
    event_loop.set_interval(
        || {
            log::info!("heartbeat");
            true
        },
        Duration::from_millis(750),
    )?;

    // Explicit window: may run from one second out, expires two seconds later.
    let execute_at = Timestamp::after_secs(1);
    event_loop.dispatch(
        AsyncTask::with_window(
            || {
                log::info!("Windowed task ran inside its window.");
                true
            },
            execute_at,
            execute_at + Duration::from_secs(2),
        )
        .named("windowed"),
    )?;

    // A task that reports failure, to show up in the error log.
    event_loop.set_timeout(|| false, Duration::from_millis(1200))?;

    // Producer thread dispatching through a handle, the way game systems
    // would from outside the loop.
    let handle = event_loop.handle();
    let producer = thread::spawn(move || {
        handle
            .set_timeout(
                || {
                    log::info!("Dispatched from a producer thread.");
                    true
                },
                Duration::from_millis(300),
            )
            .expect("dispatch from producer thread");
    });
    producer.join().expect("producer thread panicked");

    thread::sleep(Duration::from_secs(4));

    event_loop.stop();
    log::info!("Sandbox done.");
    Ok(())
}
