//! `tracing`-backed implementation of the logger capability

use limiter_core::log::{Field, FieldValue, Fields, Logger};
use tracing::Level;

/// Target used for every event emitted by [`TracingLogger`]
pub const TARGET: &str = "limiter";

/// Forwards log events to the installed `tracing` subscriber.
///
/// Keys limiter emits are recorded as named fields. Anything else is
/// rendered into a single `tags` value as `key=value` pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

/// Field values split into named `tracing` fields and leftovers
#[derive(Debug, Default)]
struct EventFields<'a> {
    thread: Option<u64>,
    line: Option<u64>,
    limit: Option<u64>,
    tasks: Option<u64>,
    lines: Option<u64>,
    cmd: Option<&'a str>,
    err: Option<String>,
    tags: Option<String>,
}

impl<'a> EventFields<'a> {
    fn split(fields: &'a [Field<'a>]) -> Self {
        let mut event = Self::default();
        let mut rest = Vec::new();

        for field in fields {
            match (field.key, field.value) {
                ("thread", FieldValue::Int(v)) => event.thread = Some(v),
                ("line", FieldValue::Int(v)) => event.line = Some(v),
                ("limit", FieldValue::Int(v)) => event.limit = Some(v),
                ("tasks", FieldValue::Int(v)) => event.tasks = Some(v),
                ("lines", FieldValue::Int(v)) => event.lines = Some(v),
                ("cmd", FieldValue::Str(s)) => event.cmd = Some(s),
                ("err", value) => event.err = Some(value.to_string()),
                _ => rest.push(*field),
            }
        }

        if !rest.is_empty() {
            event.tags = Some(Fields(&rest).to_string());
        }
        event
    }
}

// event! needs a constant level, so each level gets its own expansion
macro_rules! emit {
    ($level:expr, $message:expr, $fields:expr) => {{
        let f = EventFields::split($fields);
        tracing::event!(
            target: TARGET,
            $level,
            thread = f.thread,
            line = f.line,
            limit = f.limit,
            tasks = f.tasks,
            lines = f.lines,
            cmd = f.cmd,
            err = f.err.as_deref(),
            tags = f.tags.as_deref(),
            "{}",
            $message
        );
    }};
}

impl Logger for TracingLogger {
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        emit!(Level::INFO, message, fields);
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        emit!(Level::ERROR, message, fields);
    }

    fn debug(&self, message: &str, fields: &[Field<'_>]) {
        emit!(Level::DEBUG, message, fields);
    }
}
