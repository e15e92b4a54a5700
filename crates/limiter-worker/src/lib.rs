//! Limiter Worker - Bounded task execution
//!
//! This crate runs command lines with a fixed concurrency ceiling:
//! - Synchronous dispatch from the task source to idle workers
//! - Per-task tokenize, run and log steps
//! - Drain-then-exit shutdown once input is exhausted

pub mod dispatch;
pub mod executor;
pub mod pool;

pub use dispatch::{DispatchError, DispatchReceiver, DispatchSender};
pub use executor::{CommandRunner, ProcessRunner, RunError, TaskExecutor, TaskOutcome};
pub use pool::{RunPhase, RunReport, WorkerPool};
