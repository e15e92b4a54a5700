//! Task executor implementation

use async_trait::async_trait;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;

use limiter_core::log::{Field, Logger};
use limiter_core::{CommandTokenizer, OutputMode, RunnerConfig, ShellTokenizer, Task, TokenizeError};

/// Failure to run one command
#[derive(Error, Debug)]
pub enum RunError {
    #[error("empty argument vector")]
    EmptyCommand,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("exit status {0}")]
    ExitCode(i32),

    #[error("terminated abnormally: {0}")]
    Terminated(String),
}

impl RunError {
    /// Build the error for an unsuccessful exit status
    pub fn from_status(status: ExitStatus) -> Option<Self> {
        if status.success() {
            return None;
        }
        Some(match status.code() {
            Some(code) => RunError::ExitCode(code),
            None => RunError::Terminated(status.to_string()),
        })
    }
}

/// Runs a tokenized command to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv[0]` with the remaining arguments and wait for it to exit
    async fn run(&self, argv: &[String]) -> Result<(), RunError>;
}

/// Runs commands as child processes
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    stdout: OutputMode,
    stderr: OutputMode,
}

impl ProcessRunner {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            stdout: config.stdout,
            stderr: config.stderr,
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(&RunnerConfig::default())
    }
}

fn stdio(mode: OutputMode) -> Stdio {
    match mode {
        OutputMode::Inherit => Stdio::inherit(),
        OutputMode::Null => Stdio::null(),
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String]) -> Result<(), RunError> {
        let (program, args) = argv.split_first().ok_or(RunError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdio(self.stdout))
            .stderr(stdio(self.stderr))
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: program.clone(),
                source,
            })?;

        let status = child.wait().await.map_err(|source| RunError::Wait {
            program: program.clone(),
            source,
        })?;

        match RunError::from_status(status) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// How a single task ended
#[derive(Debug)]
pub enum TaskOutcome {
    Completed,
    InvalidCommand(TokenizeError),
    Failed(RunError),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }
}

/// Task executor - tokenizes, runs and logs one task at a time
pub struct TaskExecutor {
    tokenizer: Arc<dyn CommandTokenizer>,
    runner: Arc<dyn CommandRunner>,
    logger: Arc<dyn Logger>,
}

impl TaskExecutor {
    /// Create an executor using shell-style tokenization
    pub fn new(runner: Arc<dyn CommandRunner>, logger: Arc<dyn Logger>) -> Self {
        Self {
            tokenizer: Arc::new(ShellTokenizer),
            runner,
            logger,
        }
    }

    /// Replace the tokenizer
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn CommandTokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Execute `task` on behalf of worker `worker_id`.
    ///
    /// Every failure is logged here and reported only through the returned
    /// outcome; nothing propagates to other tasks.
    pub async fn execute(&self, worker_id: usize, task: &Task) -> TaskOutcome {
        let thread = Field::int("thread", worker_id);
        let line = Field::int("line", task.line_number);
        let cmd = Field::str("cmd", &task.command);

        self.logger.debug("Running", &[thread, line, cmd]);

        let argv = match self.tokenizer.parse(&task.command) {
            Ok(argv) => argv,
            Err(e) => {
                self.logger.error(
                    "failed to parse task as commandline",
                    &[thread, line, cmd, Field::err(&e)],
                );
                return TaskOutcome::InvalidCommand(e);
            }
        };

        if let Err(e) = self.runner.run(&argv).await {
            self.logger
                .error("command failed", &[thread, line, cmd, Field::err(&e)]);
            return TaskOutcome::Failed(e);
        }

        self.logger.info("Completed", &[thread, line, cmd]);
        TaskOutcome::Completed
    }
}
