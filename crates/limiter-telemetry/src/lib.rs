//! Limiter Telemetry - Logging layer
//!
//! This crate wires limiter's logger capability to `tracing`:
//! - Subscriber setup with level filtering and pretty/compact/JSON output
//! - [`TracingLogger`], the production implementation of
//!   [`limiter_core::Logger`]

pub mod logger;
pub mod logging;

pub use logger::TracingLogger;
pub use logging::{init_logging, LogFormat, LoggingConfig};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
