//! Task definitions and the line-oriented task source

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// One command line to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Position among emitted tasks, starting at 0
    pub sequence_id: usize,

    /// 1-based line in the input, counting skipped lines
    pub line_number: usize,

    /// Trimmed command text
    pub command: String,
}

impl Task {
    pub fn new(sequence_id: usize, line_number: usize, command: impl Into<String>) -> Self {
        Self {
            sequence_id,
            line_number,
            command: command.into(),
        }
    }
}

/// Returns the trimmed line if it should become a task.
///
/// Blank lines and lines whose first non-whitespace character is `#` are
/// skipped.
pub fn task_text(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        None
    } else {
        Some(trimmed)
    }
}

/// Strips one trailing `\n` or `\r\n` and decodes the rest.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD so one badly
/// encoded line never ends the input.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Produces tasks from an input stream, one per qualifying line.
///
/// The source is single-use. Once the stream ends or a read fails it yields
/// nothing further.
pub struct TaskSource<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    next_sequence: usize,
    finished: bool,
}

impl TaskSource<BufReader<Stdin>> {
    /// Read tasks from standard input
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> TaskSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            next_sequence: 0,
            finished: false,
        }
    }

    /// Read up to the next qualifying line.
    ///
    /// Returns `Ok(None)` at end of input. A read error is returned once and
    /// ends the source. Invalid UTF-8 is not a read error.
    pub async fn next_task(&mut self) -> io::Result<Option<Task>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf).await {
                Ok(0) => {
                    self.finished = true;
                    return Ok(None);
                }
                Ok(_) => {}
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
            self.line_number += 1;
            let line = decode_line(&self.buf);

            if let Some(text) = task_text(&line) {
                let task = Task::new(self.next_sequence, self.line_number, text);
                self.next_sequence += 1;
                return Ok(Some(task));
            }
        }
    }

    /// Lines consumed so far, including skipped ones
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

}
