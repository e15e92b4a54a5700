//! Structured logging for limiter
//!
//! Provides console logging with:
//! - Configurable log levels
//! - Environment-based filtering
//! - Pretty, compact or JSON output

use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::{TelemetryError, TelemetryResult};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (json, pretty, compact)
    pub format: LogFormat,

    /// Prefix events with an RFC 3339 UTC timestamp
    pub include_timestamps: bool,

    /// Include file/line information
    pub include_location: bool,

    /// Include target (module path)
    pub include_target: bool,

    /// Include thread IDs
    pub include_thread_ids: bool,

    /// Include thread names
    pub include_thread_names: bool,

    /// Colored output
    pub ansi: bool,

    /// Environment filter string (e.g., "limiter=debug")
    pub env_filter: Option<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (machine-readable)
    Json,
    /// Pretty format (human-readable, colored)
    #[default]
    Pretty,
    /// Compact format (single line)
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(TelemetryError::Config(format!("Unknown log format: {}", s))),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_timestamps: true,
            include_location: false,
            include_target: false,
            include_thread_ids: false,
            include_thread_names: false,
            ansi: std::io::stdout().is_terminal(),
            env_filter: None,
        }
    }
}

impl TryFrom<&limiter_core::LoggingConfig> for LoggingConfig {
    type Error = TelemetryError;

    fn try_from(config: &limiter_core::LoggingConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            level: config.level.clone(),
            format: config.format.parse()?,
            include_timestamps: config.timestamps,
            ..Self::default()
        })
    }
}

impl LoggingConfig {
    /// Build the event filter; `env_filter` wins over `level`
    pub fn filter(&self) -> TelemetryResult<EnvFilter> {
        let directive = self.env_filter.as_deref().unwrap_or(&self.level);
        EnvFilter::try_new(directive).map_err(|e| TelemetryError::Logging(e.to_string()))
    }
}

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Apply the shared formatting options and erase the layer type
macro_rules! finish_layer {
    ($layer:expr, $config:expr) => {{
        let layer = $layer
            .with_ansi($config.ansi)
            .with_file($config.include_location)
            .with_line_number($config.include_location)
            .with_target($config.include_target)
            .with_thread_ids($config.include_thread_ids)
            .with_thread_names($config.include_thread_names);
        if $config.include_timestamps {
            Box::new(layer.with_timer(UtcTime::rfc_3339())) as BoxedLayer
        } else {
            Box::new(layer.without_time()) as BoxedLayer
        }
    }};
}

/// Initialize logging with configuration
pub fn init_logging(config: LoggingConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = config.filter()?;

    let layer = match config.format {
        LogFormat::Json => finish_layer!(fmt::layer().json(), config),
        LogFormat::Pretty => finish_layer!(fmt::layer().pretty(), config),
        LogFormat::Compact => finish_layer!(fmt::layer().compact(), config),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::Logging(e.to_string()))?;

    tracing::debug!(
        "Logging initialized with level: {}, format: {:?}",
        config.level,
        config.format
    );

    Ok(())
}
