//! JSON-lines trace source
//!
//! Reads one event per line and yields it lazily, so a trace never has to be
//! held in memory. Line format:
//!
//! ```text
//! {"type":"transition","task":7,"ts":10,"from":"running","to":"blocked","reason":"chan receive"}
//! {"type":"transition","resource":{"processor":2},"ts":11,"from":"runnable","to":"running"}
//! {"type":"exit","task":7,"ts":90}
//! ```
//!
//! Timestamps are nanoseconds. Blank lines are skipped. The first bad line
//! yields an error and ends the iteration.

use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use crate::domain::{
    DecodeError, Resource, State, StateTransition, TaskExit, TaskId, Timestamp, TraceEvent,
};

/// On-disk shape of one line
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum RawEvent {
    Transition {
        task: Option<u64>,
        resource: Option<Resource>,
        ts: u64,
        from: State,
        to: State,
        #[serde(default)]
        reason: String,
    },
    Exit {
        task: u64,
        ts: u64,
    },
}

/// Lazy event iterator over a JSON-lines reader
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line: usize,
    finished: bool,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), line: 0, finished: false }
    }

    fn parse(&self, text: &str) -> Result<TraceEvent, DecodeError> {
        let line = self.line;
        let raw: RawEvent =
            serde_json::from_str(text).map_err(|source| DecodeError::Malformed { line, source })?;

        match raw {
            RawEvent::Transition { task, resource, ts, from, to, reason } => {
                let resource = match (task, resource) {
                    (Some(id), None) => Resource::Task(TaskId(id)),
                    (None, Some(resource)) => resource,
                    (Some(_), Some(_)) => {
                        return Err(DecodeError::InvalidEvent {
                            line,
                            message: "both \"task\" and \"resource\" given".to_string(),
                        })
                    }
                    (None, None) => {
                        return Err(DecodeError::InvalidEvent {
                            line,
                            message: "missing \"task\" or \"resource\"".to_string(),
                        })
                    }
                };
                Ok(TraceEvent::Transition(StateTransition {
                    resource,
                    timestamp: Timestamp(ts),
                    from,
                    to,
                    reason,
                }))
            }
            RawEvent::Exit { task, ts } => {
                Ok(TraceEvent::Exit(TaskExit { task: TaskId(task), timestamp: Timestamp(ts) }))
            }
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a JSON-lines trace file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = Result<TraceEvent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(source) => {
                    self.finished = true;
                    return Some(Err(DecodeError::Read { line: self.line + 1, source }));
                }
            };
            self.line += 1;

            if text.trim().is_empty() {
                continue;
            }

            let event = self.parse(&text);
            self.finished = event.is_err();
            return Some(event);
        }
    }
}
