//! limiter - Main entry point

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use limiter_core::error::EXIT_USAGE;
use limiter_core::{parse_limit, LimiterConfig, Logger, TaskSource};
use limiter_telemetry::{init_logging, LoggingConfig, TracingLogger};
use limiter_worker::{ProcessRunner, WorkerPool};

/// Execute tasks concurrently until <max-concurrency> tasks are running.
/// If there are additional tasks, run them as soon as earlier tasks complete.
///
/// Tasks are passed, one to a line, via stdin. Blank lines and lines
/// starting with `#` are ignored.
#[derive(Parser, Debug)]
#[command(name = "limiter", version, about, long_about)]
struct Args {
    /// Maximum number of tasks running at the same time
    #[arg(value_name = "max-concurrency", allow_negative_numbers = true)]
    max_concurrency: String,

    /// Configuration file path
    #[arg(short, long, env = "LIMITER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => return usage_error(e),
    };

    let limit = match parse_limit(&args.max_concurrency) {
        Ok(limit) => limit,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    let config = match setup(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::from(limiter_core::error::EXIT_SETUP);
        }
    };

    run(limit, config).await;

    // Individual task failures and input read errors are reported in the log
    // only; the exit status does not reflect them.
    ExitCode::SUCCESS
}

fn usage_error(e: clap::Error) -> ExitCode {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => {
            eprintln!("limiter v{}\n", env!("CARGO_PKG_VERSION"));
            let _ = e.print();
            eprintln!("\n{}", Args::command().render_long_help());
            ExitCode::from(EXIT_USAGE)
        }
    }
}

/// Load configuration and install the log subscriber
fn setup(args: &Args) -> anyhow::Result<LimiterConfig> {
    let mut config = LimiterConfig::load(args.config.as_ref())
        .context("failed to load configuration")?;

    // CLI flags override file and environment
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.logging.format = format.clone();
    }

    let logging = LoggingConfig::try_from(&config.logging)?;
    init_logging(logging).context("failed to initialize logging")?;

    Ok(config)
}

async fn run(limit: NonZeroUsize, config: LimiterConfig) {
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
    let runner = Arc::new(ProcessRunner::new(&config.runner));

    let pool = WorkerPool::new(limit, runner, logger);
    pool.run(TaskSource::stdin()).await;
}
