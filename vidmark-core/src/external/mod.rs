// ============================================================================
// vidmark-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: ffmpeg and ffprobe integration
//
// This module holds everything that talks to the external multimedia tools:
// stream probing through the ffprobe crate, frame decoding and encoding through
// ffmpeg-sidecar, and the shared helpers for dependency checks and ffmpeg log
// forwarding. The rest of the crate only sees the traits in `crate::media`.

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- External crate imports ----
use ffmpeg_sidecar::event::LogLevel as FfmpegLogLevel;

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Frame decoding/encoding over ffmpeg child processes
pub mod ffmpeg_executor;

/// Stream metadata through ffprobe
pub mod ffprobe_executor;

pub use ffmpeg_executor::{SidecarBackend, SidecarFrameSink, SidecarFrameSource};
pub use ffprobe_executor::probe_stream;

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that an external command can be started by running `<cmd> -version`.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {cmd_name}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{cmd_name}' not found.");
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{cmd_name}': {e}");
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

// ============================================================================
// FFMPEG LOG FORWARDING
// ============================================================================

/// Maps an ffmpeg log level to a `log` level.
pub(crate) fn map_ffmpeg_log_level(level: &FfmpegLogLevel) -> log::Level {
    match level {
        FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => log::Level::Error,
        FfmpegLogLevel::Warning => log::Level::Warn,
        FfmpegLogLevel::Info => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

/// ffmpeg stderr messages that look like errors but do not affect the output.
pub(crate) fn is_non_critical_ffmpeg_error(error: &str) -> bool {
    error.contains("deprecated pixel format")
        || error.contains("No accelerated colorspace conversion")
        || error.contains("automatically inserted filter")
        || error.contains("Timestamps are unset")
        || error.contains("first frame is no keyframe")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_is_reported() {
        let result = check_dependency("vidmark-surely-not-installed-tool");
        assert!(matches!(result, Err(CoreError::DependencyNotFound(_))));
    }

    #[test]
    fn ffmpeg_levels_map_to_log_levels() {
        assert_eq!(map_ffmpeg_log_level(&FfmpegLogLevel::Fatal), log::Level::Error);
        assert_eq!(map_ffmpeg_log_level(&FfmpegLogLevel::Warning), log::Level::Warn);
        assert_eq!(map_ffmpeg_log_level(&FfmpegLogLevel::Info), log::Level::Debug);
    }

    #[test]
    fn benign_ffmpeg_errors_are_recognized() {
        assert!(is_non_critical_ffmpeg_error("deprecated pixel format used, make sure you did set range correctly"));
        assert!(!is_non_critical_ffmpeg_error("Invalid data found when processing input"));
    }
}
