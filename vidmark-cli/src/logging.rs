// ============================================================================
// vidmark-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: stderr logging with an optional log file
//
// stdout carries the JSON status protocol, so every log line goes to stderr.
// Without a log file, env_logger is installed and RUST_LOG overrides the
// verbosity flags. With `--log-file`, a fern dispatch writes the same lines to
// stderr and to the file, filtered by the same RUST_LOG directives.

use crate::cli_error;
use crate::error::{CliErrorContext, CliResult};
use log::{LevelFilter, Log};
use std::io::Write;
use std::path::Path;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Maps the `-v` count to a level: warn, info, then debug.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Installs the global logger. Must be called once, before any job runs.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>) -> CliResult<()> {
    let level = level_for_verbosity(verbosity);
    match log_file {
        None => init_stderr_logger(level),
        Some(path) => init_dispatch(level, std::env::var("RUST_LOG").ok().as_deref(), path),
    }
}

fn init_stderr_logger(level: LevelFilter) -> CliResult<()> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .try_init()
        .map_err(|e| cli_error!("Failed to initialize logger: {e}"))
}

/// Level filter for the file dispatch: the verbosity level, overridden by
/// env_logger-style directives when present.
fn directive_filter(level: LevelFilter, directives: Option<&str>) -> env_logger::Logger {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Some(directives) = directives {
        builder.parse_filters(directives);
    }
    builder.build()
}

fn init_dispatch(level: LevelFilter, directives: Option<&str>, path: &Path) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .cli_with_context(|| format!("Cannot create log directory {}", parent.display()))?;
    }
    let file = fern::log_file(path)
        .cli_with_context(|| format!("Cannot open log file {}", path.display()))?;
    let filter = directive_filter(level, directives);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(filter.filter())
        .filter(move |metadata| filter.enabled(metadata))
        .chain(std::io::stderr())
        .chain(file)
        .apply()
        .map_err(|e| cli_error!("Failed to initialize logger: {e}"))?;

    log::info!("Logging to {} (session {})", path.display(), get_timestamp());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(9), LevelFilter::Debug);
    }

    #[test]
    fn directives_override_verbosity_in_file_filter() {
        assert_eq!(directive_filter(LevelFilter::Warn, None).filter(), LevelFilter::Warn);
        assert_eq!(
            directive_filter(LevelFilter::Warn, Some("debug")).filter(),
            LevelFilter::Debug
        );

        let scoped = directive_filter(LevelFilter::Warn, Some("vidmark_core=debug"));
        let core = log::Metadata::builder()
            .level(log::Level::Debug)
            .target("vidmark_core::job")
            .build();
        let other = log::Metadata::builder()
            .level(log::Level::Debug)
            .target("ffmpeg_sidecar")
            .build();
        assert!(scoped.enabled(&core));
        assert!(!scoped.enabled(&other));
    }

    #[test]
    fn timestamp_format() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(ts.as_bytes()[8], b'_');
    }
}
