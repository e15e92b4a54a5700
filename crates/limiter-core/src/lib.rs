//! Limiter Core - Core types and traits for the limiter command runner
//!
//! This crate provides the fundamental building blocks for limiter:
//! - Task definitions and the line-oriented task source
//! - Shell-style command line tokenization
//! - The logger capability used by workers
//! - Concurrency limit parsing
//! - Configuration structures
//! - Error types

pub mod config;
pub mod error;
pub mod limit;
pub mod log;
pub mod task;
pub mod tokenize;

pub use config::{LimiterConfig, LoggingConfig, OutputMode, RunnerConfig};
pub use error::{Error, Result};
pub use limit::parse_limit;
pub use log::{Field, FieldValue, Logger, NullLogger};
pub use task::{Task, TaskSource};
pub use tokenize::{CommandTokenizer, ShellTokenizer, TokenizeError};
