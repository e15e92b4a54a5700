//! Common test utilities and fixtures

use async_trait::async_trait;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use limiter_core::log::{Field, Logger};
use limiter_worker::{CommandRunner, RunError};

static INIT: Once = Once::new();

/// Initialize test environment (logging, etc.)
pub fn init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("limiter=debug")
            .try_init();
    });
}

pub fn limit(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).expect("limit must be positive")
}

/// Build `count` command lines `<program> <index>`
pub fn commands(program: &str, count: usize) -> String {
    (0..count).map(|i| format!("{} {}\n", program, i)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Error,
}

/// One captured log call
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Logger that keeps every call in memory
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        let record = LogRecord {
            level,
            message: message.to_string(),
            fields: fields
                .iter()
                .map(|f| (f.key.to_string(), f.value.to_string()))
                .collect(),
        };
        self.records.lock().unwrap().push(record);
    }

    /// Everything logged so far, in call order (debug events excluded)
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.level != Level::Debug)
            .cloned()
            .collect()
    }

    pub fn with_message(&self, message: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.message == message)
            .collect()
    }

    pub fn count(&self, message: &str) -> usize {
        self.with_message(message).len()
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        self.push(Level::Info, message, fields);
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        self.push(Level::Error, message, fields);
    }

    fn debug(&self, message: &str, fields: &[Field<'_>]) {
        self.push(Level::Debug, message, fields);
    }
}

/// Runner stub that measures concurrency instead of spawning processes.
///
/// Each run sleeps for the default delay, or for `N` milliseconds when the
/// command is `sleep N`. Programs listed in `failing` return exit status 1.
#[derive(Debug, Default)]
pub struct MeasuringRunner {
    delay: Duration,
    failing: HashSet<String>,
    running: AtomicUsize,
    high_water: AtomicUsize,
    started: AtomicUsize,
    finished: AtomicUsize,
    started_order: Mutex<Vec<Vec<String>>>,
}

impl MeasuringRunner {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn failing(mut self, program: &str) -> Self {
        self.failing.insert(program.to_string());
        self
    }

    /// Most runs observed in flight at once
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Argument vectors in the order runs began
    pub fn started_order(&self) -> Vec<Vec<String>> {
        self.started_order.lock().unwrap().clone()
    }

    fn delay_for(&self, argv: &[String]) -> Duration {
        match argv {
            [program, ms] if program == "sleep" => ms
                .parse()
                .map(Duration::from_millis)
                .unwrap_or(self.delay),
            _ => self.delay,
        }
    }
}

#[async_trait]
impl CommandRunner for MeasuringRunner {
    async fn run(&self, argv: &[String]) -> Result<(), RunError> {
        self.started_order.lock().unwrap().push(argv.to_vec());
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay_for(argv)).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&argv[0]) {
            return Err(RunError::ExitCode(1));
        }
        Ok(())
    }
}
