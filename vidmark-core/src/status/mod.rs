//! Status channel: the structured messages a job reports to its orchestrator.
//!
//! Two record shapes exist on the wire, one JSON object per line:
//!
//! - `{"progress": <0-100>, "message": <string>}` for progress, warnings and
//!   fatal errors;
//! - `{"output_video": <path>}` as the terminal success marker.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod json_handler;

pub use json_handler::JsonStatusWriter;

/// A single status record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusEvent {
    /// Regular progress update.
    Progress { progress: u8, message: String },

    /// Per-frame problem the job recovered from. Same wire shape as `Progress`.
    Warning { progress: u8, message: String },

    /// Job-ending error, always at 100. Same wire shape as `Progress`.
    Fatal { progress: u8, message: String },

    /// Terminal success record carrying the written video's path.
    Completed { output_video: String },
}

impl StatusEvent {
    pub fn progress(progress: u8, message: impl Into<String>) -> Self {
        Self::Progress {
            progress: progress.min(100),
            message: message.into(),
        }
    }

    pub fn warning(progress: u8, message: impl Into<String>) -> Self {
        Self::Warning {
            progress: progress.min(100),
            message: message.into(),
        }
    }

    /// Fatal errors are always reported at 100 so the orchestrator stops waiting.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            progress: 100,
            message: message.into(),
        }
    }

    pub fn completed(output_video: impl Into<String>) -> Self {
        Self::Completed {
            output_video: output_video.into(),
        }
    }

    /// Progress value carried by the event, `None` for the terminal record.
    pub fn progress_value(&self) -> Option<u8> {
        match self {
            Self::Progress { progress, .. }
            | Self::Warning { progress, .. }
            | Self::Fatal { progress, .. } => Some(*progress),
            Self::Completed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Receiver of status events.
pub trait StatusSink: Send + Sync {
    fn emit(&self, event: &StatusEvent);
}

/// Fans one event out to several sinks, in registration order.
pub struct StatusDispatcher {
    sinks: Vec<Arc<dyn StatusSink>>,
}

impl StatusDispatcher {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Arc<dyn StatusSink>) {
        self.sinks.push(sink);
    }
}

impl Default for StatusDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for StatusDispatcher {
    fn emit(&self, event: &StatusEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

/// Mirrors status events into the log so file logs carry the job history.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn emit(&self, event: &StatusEvent) {
        match event {
            StatusEvent::Progress { progress, message } => {
                log::info!(target: "vidmark::status", "[{progress:>3}%] {message}");
            }
            StatusEvent::Warning { progress, message } => {
                log::warn!(target: "vidmark::status", "[{progress:>3}%] {message}");
            }
            StatusEvent::Fatal { message, .. } => {
                log::error!(target: "vidmark::status", "{message}");
            }
            StatusEvent::Completed { output_video } => {
                log::info!(target: "vidmark::status", "Output written to {output_video}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<StatusEvent>>);

    impl StatusSink for Recorder {
        fn emit(&self, event: &StatusEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn progress_serializes_without_tag() {
        let json = serde_json::to_string(&StatusEvent::progress(20, "Processing frame 2/10")).unwrap();
        assert_eq!(json, r#"{"progress":20,"message":"Processing frame 2/10"}"#);
    }

    #[test]
    fn completed_serializes_without_progress_field() {
        let json = serde_json::to_string(&StatusEvent::completed("videos/a-output.mp4")).unwrap();
        assert_eq!(json, r#"{"output_video":"videos/a-output.mp4"}"#);
    }

    #[test]
    fn wire_records_parse_back_into_events() {
        let event: StatusEvent = serde_json::from_str(r#"{"output_video":"x.mp4"}"#).unwrap();
        assert!(event.is_terminal());
        let event: StatusEvent = serde_json::from_str(r#"{"progress":100,"message":"boom"}"#).unwrap();
        assert_eq!(event.progress_value(), Some(100));
    }

    #[test]
    fn warnings_and_fatals_share_the_progress_shape() {
        let warning = serde_json::to_string(&StatusEvent::warning(30, "Error processing frame 3. Skipping.")).unwrap();
        assert_eq!(warning, r#"{"progress":30,"message":"Error processing frame 3. Skipping."}"#);
        let fatal = serde_json::to_string(&StatusEvent::fatal("Error initializing model: gone")).unwrap();
        assert_eq!(fatal, r#"{"progress":100,"message":"Error initializing model: gone"}"#);
        assert!(!StatusEvent::fatal("x").is_terminal());
    }

    #[test]
    fn log_sink_accepts_every_variant() {
        let sink = LogStatusSink;
        sink.emit(&StatusEvent::progress(10, "a"));
        sink.emit(&StatusEvent::warning(20, "b"));
        sink.emit(&StatusEvent::fatal("c"));
        sink.emit(&StatusEvent::completed("d.mp4"));
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(StatusEvent::progress(250, "x").progress_value(), Some(100));
        assert_eq!(StatusEvent::warning(180, "x").progress_value(), Some(100));
        assert_eq!(StatusEvent::fatal("x").progress_value(), Some(100));
    }

    #[test]
    fn dispatcher_reaches_every_sink() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let mut dispatcher = StatusDispatcher::new();
        dispatcher.add_sink(first.clone());
        dispatcher.add_sink(second.clone());
        dispatcher.add_sink(Arc::new(LogStatusSink));

        dispatcher.emit(&StatusEvent::progress(10, "a"));

        assert_eq!(first.0.lock().unwrap().len(), 1);
        assert_eq!(second.0.lock().unwrap().len(), 1);
    }
}
