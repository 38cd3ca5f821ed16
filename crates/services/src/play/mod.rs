//! Async drivers that own a game session on a dedicated tokio task.
//!
//! The session is never shared: hosts talk to the task through a command
//! channel, timers live inside the task, and dropping the handle aborts it.

mod memory_driver;
mod quiz_driver;

use std::time::Duration;

use thiserror::Error;

pub use memory_driver::MemoryDriver;
pub use quiz_driver::QuizDriver;

/// Period of the quiz countdown and the memory stopwatch.
pub const TICK: Duration = Duration::from_secs(1);

const COMMAND_BUFFER: usize = 16;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DriverError {
    #[error("game driver has stopped")]
    Closed,
}

fn ticker() -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + TICK, TICK);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval
}
