//! Error types for limiter

use thiserror::Error;

/// Result type alias using limiter's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for a wrong number of positional arguments
pub const EXIT_USAGE: u8 = 1;

/// Exit code for a concurrency limit that is not an integer
pub const EXIT_INVALID_LIMIT: u8 = 2;

/// Exit code for a concurrency limit that is zero or negative
pub const EXIT_NON_POSITIVE_LIMIT: u8 = 3;

/// Exit code for configuration or logging setup failures
pub const EXIT_SETUP: u8 = 4;

/// Main error type for limiter operations
#[derive(Error, Debug)]
pub enum Error {
    /// Concurrency limit could not be parsed
    #[error("unable to parse first argument: {0}")]
    InvalidLimit(#[from] std::num::ParseIntError),

    /// Concurrency limit parsed but is not positive
    #[error("max-concurrency must be an integer greater than zero, given {0}")]
    NonPositiveLimit(i64),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Process exit code for this error when it ends the run
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidLimit(_) => EXIT_INVALID_LIMIT,
            Error::NonPositiveLimit(_) => EXIT_NON_POSITIVE_LIMIT,
            Error::Configuration(_) => EXIT_SETUP,
        }
    }
}
