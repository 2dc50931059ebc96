//! Newline-delimited JSON writer for the status channel.
//!
//! Each event becomes exactly one line on the underlying writer (stdout in
//! production) and is flushed immediately so the orchestrator sees it while
//! the job is still running.

use super::{StatusEvent, StatusSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Status sink writing one JSON object per line
pub struct JsonStatusWriter {
    output: Mutex<Box<dyn Write + Send>>,
}

impl JsonStatusWriter {
    /// Create a writer on stdout
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a writer on a custom output
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    fn write_line(&self, line: &str) {
        match self.output.lock() {
            Ok(mut output) => {
                if let Err(e) = writeln!(output, "{line}").and_then(|()| output.flush()) {
                    log::error!("Failed to write status line: {e}");
                }
            }
            Err(_) => log::error!("Status writer lock poisoned, dropping: {line}"),
        }
    }
}

impl StatusSink for JsonStatusWriter {
    fn emit(&self, event: &StatusEvent) {
        match serde_json::to_string(event) {
            Ok(line) => self.write_line(&line),
            Err(e) => log::error!("Failed to serialize status event {event:?}: {e}"),
        }
    }
}

impl Default for JsonStatusWriter {
    fn default() -> Self {
        Self::new()
    }
}
