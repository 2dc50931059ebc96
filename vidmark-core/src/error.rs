// ============================================================================
// vidmark-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the vidmark-core library
//
// Every fallible operation in the core returns `CoreResult<T>`. The job driver
// is the only place where a `CoreError` is turned into a status event; no raw
// error value ever reaches the status channel.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced by the vidmark core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to start '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed to wait for '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("'{cmd}' exited with {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("ffprobe output could not be parsed: {0}")]
    FfprobeParse(String),

    #[error("Video information error: {0}")]
    VideoInfoError(String),

    #[error("Invalid path: {0}")]
    PathError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Label configuration error: {0}")]
    LabelConfig(String),

    #[error("{0}")]
    AnnotatorInit(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Frame {index} has {actual} bytes, expected {expected}")]
    FrameSize {
        index: u64,
        expected: usize,
        actual: usize,
    },

    #[error("{0} is closed")]
    StreamClosed(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for vidmark-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_closed_names_the_handle() {
        let err = CoreError::StreamClosed("input stream".to_string());
        assert_eq!(err.to_string(), "input stream is closed");
    }

    #[test]
    fn io_errors_convert() {
        let err: CoreError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, CoreError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn command_start_error_keeps_command_name() {
        let err = command_start_error("ffmpeg (decode)", io::Error::other("boom"));
        assert!(err.to_string().starts_with("Failed to start 'ffmpeg (decode)'"));
    }
}
