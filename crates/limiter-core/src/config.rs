//! Configuration structures for limiter

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a TOML config file
pub const ENV_CONFIG: &str = "LIMITER_CONFIG";
pub const ENV_LOG_LEVEL: &str = "LIMITER_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LIMITER_LOG_FORMAT";
pub const ENV_CHILD_STDOUT: &str = "LIMITER_CHILD_STDOUT";

/// Main configuration for limiter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Child process configuration
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl LimiterConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::Error::Configuration(format!("Failed to read config file: {}", e))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Takes the lookup as a closure so callers and tests can supply values
    /// without touching the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = format;
        }
        if let Some(mode) = lookup(ENV_CHILD_STDOUT) {
            self.runner.stdout = mode.parse().map_err(crate::Error::Configuration)?;
        }
        Ok(())
    }

    /// Merge configuration from file and environment; env vars take precedence
    pub fn load(path: Option<impl AsRef<Path>>) -> crate::Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }
}

/// Where a child's output stream goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Share the stream with limiter itself
    Inherit,
    /// Discard
    Null,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inherit" => Ok(OutputMode::Inherit),
            "null" | "none" => Ok(OutputMode::Null),
            _ => Err(format!("Unknown output mode: {}", s)),
        }
    }
}

/// Child process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Child standard output
    #[serde(default = "default_stdout")]
    pub stdout: OutputMode,

    /// Child standard error
    #[serde(default = "default_stderr")]
    pub stderr: OutputMode,
}

fn default_stdout() -> OutputMode {
    OutputMode::Null
}

fn default_stderr() -> OutputMode {
    OutputMode::Inherit
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            stdout: default_stdout(),
            stderr: default_stderr(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, compact or json)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Include timestamps
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            timestamps: default_true(),
        }
    }
}
