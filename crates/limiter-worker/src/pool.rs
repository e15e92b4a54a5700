//! Worker pool management

use std::io;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::io::AsyncBufRead;
use tokio::sync::watch;
use tokio::task::JoinSet;

use limiter_core::log::{Field, Logger};
use limiter_core::{CommandTokenizer, ShellTokenizer, TaskSource};

use crate::dispatch::{self, DispatchReceiver};
use crate::executor::{CommandRunner, TaskExecutor};

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Workers started, nothing produced yet
    Idle,
    /// Handing tasks to workers
    Dispatching,
    /// Input exhausted and channel closed; in-flight tasks finishing
    Draining,
    /// Every worker has stopped
    Done,
}

/// What the coordinator saw during a run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Tasks accepted by a worker
    pub dispatched: usize,

    /// Input lines consumed, including skipped ones
    pub lines_read: usize,

    /// Read error that ended production early, if any
    pub read_error: Option<io::Error>,

    /// Workers that ended by panicking
    pub aborted_workers: usize,
}

/// Worker pool - runs tasks with at most `limit` in flight.
///
/// A pool runs once: [`run`](Self::run) consumes it.
pub struct WorkerPool {
    /// Number of workers
    limit: NonZeroUsize,

    runner: Arc<dyn CommandRunner>,

    tokenizer: Arc<dyn CommandTokenizer>,

    logger: Arc<dyn Logger>,

    phase: watch::Sender<RunPhase>,
}

impl WorkerPool {
    /// Create a new worker pool
    pub fn new(
        limit: NonZeroUsize,
        runner: Arc<dyn CommandRunner>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let (phase, _) = watch::channel(RunPhase::Idle);
        Self {
            limit,
            runner,
            tokenizer: Arc::new(ShellTokenizer),
            logger,
            phase,
        }
    }

    /// Replace the command tokenizer
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn CommandTokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Get the concurrency limit
    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Current phase
    pub fn phase(&self) -> RunPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions; the receiver outlives the pool
    pub fn subscribe(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, phase: RunPhase) {
        self.phase.send_replace(phase);
    }

    /// Run every task from `source`, returning once all of them have finished
    pub async fn run<R>(self, mut source: TaskSource<R>) -> RunReport
    where
        R: AsyncBufRead + Unpin,
    {
        self.logger
            .info("Starting", &[Field::int("limit", self.limit())]);

        let executor = Arc::new(
            TaskExecutor::new(Arc::clone(&self.runner), Arc::clone(&self.logger))
                .with_tokenizer(Arc::clone(&self.tokenizer)),
        );

        let (sender, receiver) = dispatch::channel();
        let mut shutdown = Shutdown::new(Arc::clone(&self.logger));
        for worker_id in 0..self.limit() {
            shutdown.spawn(worker(
                worker_id,
                receiver.clone(),
                Arc::clone(&executor),
            ));
        }
        drop(receiver);

        let mut report = RunReport::default();
        loop {
            let task = match source.next_task().await {
                Ok(Some(task)) => task,
                Ok(None) => break,
                Err(e) => {
                    self.logger.error("Error reading input", &[Field::err(&e)]);
                    report.read_error = Some(e);
                    break;
                }
            };

            if report.dispatched == 0 {
                self.set_phase(RunPhase::Dispatching);
            }

            let line = task.line_number;
            if let Err(e) = sender.dispatch(task).await {
                self.logger
                    .error("Dispatch failed", &[Field::int("line", line), Field::err(&e)]);
                break;
            }
            report.dispatched += 1;
        }
        report.lines_read = source.lines_read();

        // signal workers to stop after their current task completes
        sender.close();
        self.set_phase(RunPhase::Draining);

        // wait for running tasks to complete
        report.aborted_workers = shutdown.wait().await;
        self.set_phase(RunPhase::Done);

        self.logger.info(
            "Done",
            &[
                Field::int("tasks", report.dispatched),
                Field::int("lines", report.lines_read),
            ],
        );

        report
    }
}

/// One execution slot: pull, execute, repeat until the channel is drained
async fn worker(worker_id: usize, tasks: DispatchReceiver, executor: Arc<TaskExecutor>) {
    while let Some(task) = tasks.recv().await {
        executor.execute(worker_id, &task).await;
    }
}

/// Joins the workers once the dispatch channel is closed
struct Shutdown {
    workers: JoinSet<()>,
    logger: Arc<dyn Logger>,
}

impl Shutdown {
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            workers: JoinSet::new(),
            logger,
        }
    }

    fn spawn<F>(&mut self, worker: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.workers.spawn(worker);
    }

    /// Wait for every worker; returns how many panicked
    async fn wait(mut self) -> usize {
        let mut aborted = 0;
        while let Some(result) = self.workers.join_next().await {
            if let Err(e) = result {
                aborted += 1;
                let reason = e.to_string();
                self.logger
                    .error("Worker aborted", &[Field::str("err", &reason)]);
            }
        }
        aborted
    }
}
