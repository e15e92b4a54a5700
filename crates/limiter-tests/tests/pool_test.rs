//! Worker pool behaviour with stubbed process execution

use std::io;
use std::sync::Arc;
use std::time::Duration;

use limiter_core::TaskSource;
use limiter_telemetry::TracingLogger;
use limiter_tests::common::{self, limit, Level, MeasuringRunner, RecordingLogger};
use limiter_worker::{RunPhase, WorkerPool};
use tokio::io::BufReader;

async fn run_with(
    n: usize,
    input: &str,
    runner: MeasuringRunner,
) -> (limiter_worker::RunReport, Arc<MeasuringRunner>, Arc<RecordingLogger>) {
    let runner = Arc::new(runner);
    let logger = RecordingLogger::new();

    let report = WorkerPool::new(limit(n), runner.clone(), logger.clone())
        .run(TaskSource::new(input.as_bytes()))
        .await;

    (report, runner, logger)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_blank_and_comment_lines_are_skipped() {
    let (report, runner, logger) = run_with(
        2,
        "echo a\n# comment\n\necho b\n",
        MeasuringRunner::new(Duration::from_millis(10)),
    )
    .await;

    assert_eq!(report.dispatched, 2);
    assert_eq!(runner.started(), 2);
    assert!(runner.high_water() <= 2);

    let completed = logger.with_message("Completed");
    assert_eq!(completed.len(), 2);
    let mut lines: Vec<_> = completed.iter().map(|r| r.field("line").unwrap()).collect();
    lines.sort();
    assert_eq!(lines, vec!["1", "4"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_task_reported_once_for_any_limit() {
    let input = common::commands("task", 12);

    for n in [1, 2, 3, 5, 16] {
        let (report, runner, logger) =
            run_with(n, &input, MeasuringRunner::new(Duration::from_millis(2))).await;

        assert_eq!(report.dispatched, 12, "limit {}", n);
        assert_eq!(runner.finished(), 12, "limit {}", n);
        assert_eq!(logger.count("Completed"), 12, "limit {}", n);
        assert!(runner.high_water() <= n, "limit {} exceeded", n);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_reaches_but_never_exceeds_limit() {
    let input = common::commands("task", 12);

    let (_, runner, _) = run_with(4, &input, MeasuringRunner::new(Duration::from_millis(60))).await;

    assert_eq!(runner.high_water(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_limit_one_runs_strictly_sequentially() {
    let input = common::commands("task", 5);

    let (report, runner, logger) =
        run_with(1, &input, MeasuringRunner::new(Duration::from_millis(10))).await;

    assert_eq!(report.dispatched, 5);
    assert_eq!(runner.high_water(), 1);
    assert_eq!(logger.count("Completed"), 5);

    // a single worker also preserves input order
    let order: Vec<_> = runner.started_order().iter().map(|a| a[1].clone()).collect();
    assert_eq!(order, vec!["0", "1", "2", "3", "4"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unbalanced_quotes_fail_only_that_task() {
    let input = "echo one\necho 'broken\necho three\n";

    let (report, runner, logger) =
        run_with(2, input, MeasuringRunner::new(Duration::from_millis(5))).await;

    assert_eq!(report.dispatched, 3);
    assert_eq!(runner.started(), 2);
    assert_eq!(logger.count("Completed"), 2);

    let errors = logger.with_message("failed to parse task as commandline");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].level, Level::Error);
    assert_eq!(errors[0].field("line"), Some("2"));
    assert_eq!(errors[0].field("cmd"), Some("echo 'broken"));
    assert!(errors[0].field("thread").is_some());
    assert!(errors[0].field("err").is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_command_failures_do_not_stop_the_batch() {
    let input = "ok 1\nbad 2\nok 3\nbad 4\nok 5\n";

    let (report, runner, logger) = run_with(
        2,
        input,
        MeasuringRunner::new(Duration::from_millis(5)).failing("bad"),
    )
    .await;

    assert_eq!(report.dispatched, 5);
    assert_eq!(runner.finished(), 5);
    assert_eq!(logger.count("Completed"), 3);
    assert_eq!(logger.count("command failed"), 2);
    assert_eq!(report.aborted_workers, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_returns_only_after_slow_tasks_finish() {
    let input = "sleep 150\nsleep 20\nsleep 100\n";

    let (report, runner, logger) = run_with(3, input, MeasuringRunner::default()).await;

    assert_eq!(report.dispatched, 3);
    assert_eq!(runner.finished(), 3);

    let records = logger.records();
    let done = records.iter().position(|r| r.message == "Done").unwrap();
    assert_eq!(done, records.len() - 1);
    assert_eq!(
        records[..done].iter().filter(|r| r.message == "Completed").count(),
        3
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_completion_order_is_unconstrained() {
    let input = "sleep 150\nsleep 5\n";

    let (_, _, logger) = run_with(2, input, MeasuringRunner::default()).await;

    let completed = logger.with_message("Completed");
    assert_eq!(completed.len(), 2);
    assert_eq!(completed[0].field("line"), Some("2"));
    assert_eq!(completed[1].field("line"), Some("1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_read_error_stops_production_but_drains() {
    let reader = tokio_test::io::Builder::new()
        .read(b"sleep 30\nsleep 30\n")
        .read_error(io::Error::new(io::ErrorKind::Other, "stdin went away"))
        .build();
    let runner = Arc::new(MeasuringRunner::default());
    let logger = RecordingLogger::new();

    let report = WorkerPool::new(limit(2), runner.clone(), logger.clone())
        .run(TaskSource::new(BufReader::new(reader)))
        .await;

    assert_eq!(report.dispatched, 2);
    assert_eq!(runner.finished(), 2);
    assert_eq!(logger.count("Completed"), 2);
    assert_eq!(
        report.read_error.map(|e| e.to_string()),
        Some("stdin went away".to_string())
    );

    let read_errors = logger.with_message("Error reading input");
    assert_eq!(read_errors.len(), 1);
    assert_eq!(read_errors[0].level, Level::Error);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_badly_encoded_line_does_not_stop_the_batch() {
    let input: &[u8] = b"echo a\necho \xff\necho c\necho d\n";
    let runner = Arc::new(MeasuringRunner::default());
    let logger = RecordingLogger::new();

    let report = WorkerPool::new(limit(2), runner.clone(), logger.clone())
        .run(TaskSource::new(input))
        .await;

    assert!(report.read_error.is_none());
    assert_eq!(report.dispatched, 4);
    assert_eq!(report.lines_read, 4);
    assert_eq!(runner.started(), 4);
    assert_eq!(logger.count("Completed"), 4);
    assert_eq!(logger.count("Error reading input"), 0);

    let done = logger.with_message("Done");
    assert_eq!(done[0].field("tasks"), Some("4"));
    assert_eq!(done[0].field("lines"), Some("4"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_phases_end_in_done() {
    let runner = Arc::new(MeasuringRunner::new(Duration::from_millis(20)));
    let pool = WorkerPool::new(limit(2), runner, RecordingLogger::new());
    let mut phases = pool.subscribe();
    let initial = *phases.borrow_and_update();

    let observer = tokio::spawn(async move {
        let mut seen = vec![initial];
        while phases.changed().await.is_ok() {
            seen.push(*phases.borrow_and_update());
        }
        seen
    });

    pool.run(TaskSource::new(&b"a\nb\nc\n"[..])).await;

    let seen = observer.await.unwrap();
    assert_eq!(seen.first(), Some(&RunPhase::Idle));
    assert_eq!(seen.last(), Some(&RunPhase::Done));
    // phases only move forward
    let rank = |p: &RunPhase| *p as u8;
    assert!(seen.windows(2).all(|w| rank(&w[0]) < rank(&w[1])));
}

#[tokio::test]
async fn test_tracing_logger_smoke() {
    common::init();

    let report = WorkerPool::new(
        limit(2),
        Arc::new(MeasuringRunner::new(Duration::from_millis(1)).failing("bad")),
        Arc::new(TracingLogger),
    )
    .run(TaskSource::new(&b"good\nbad\n'unterminated\n"[..]))
    .await;

    assert_eq!(report.dispatched, 3);
}
