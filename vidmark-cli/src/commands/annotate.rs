// ============================================================================
// vidmark-cli/src/commands/annotate.rs
// ============================================================================
//
// ANNOTATE COMMAND: Builds the job configuration and runs one job
//
// Status events go to stdout as JSON lines and are mirrored into the log.
// The job outcome decides the process exit code.

use std::path::Path;
use std::sync::Arc;

use vidmark_core::annotate::DefaultAnnotatorProvider;
use vidmark_core::external::SidecarBackend;
use vidmark_core::status::{JsonStatusWriter, LogStatusSink, StatusDispatcher, StatusSink};
use vidmark_core::{JobConfig, JobConfigBuilder, JobOutcome, JobRunner};

use crate::cli::Cli;
use crate::error::{CliErrorContext, CliResult};

/// Translates parsed arguments into a validated [`JobConfig`].
pub fn build_config(args: &Cli) -> CliResult<JobConfig> {
    let config = JobConfigBuilder::new()
        .output_dir(args.output_dir.clone())
        .model_path(args.model.clone())
        .label_config_path(args.labels.clone())
        .output_codec(&args.codec)
        .progress_step(args.progress_step)
        .confidence_threshold(args.confidence)
        .nms_threshold(args.iou)
        .build();
    config.validate().cli_context("Rejected settings")?;
    log::debug!("Job configuration: {config:?}");
    Ok(config)
}

/// Runs the job for `input`, writing status events to stdout.
pub fn run_annotate(config: JobConfig, input: &Path) -> JobOutcome {
    let mut dispatcher = StatusDispatcher::new();
    dispatcher.add_sink(Arc::new(JsonStatusWriter::new()));
    dispatcher.add_sink(Arc::new(LogStatusSink));
    run_with_status(config, input, &dispatcher)
}

pub fn run_with_status(config: JobConfig, input: &Path, status: &dyn StatusSink) -> JobOutcome {
    let provider = DefaultAnnotatorProvider::from_config(&config);
    let runner = JobRunner::new(config, SidecarBackend, provider, status);
    let outcome = runner.run(input);
    log_summary(&outcome);
    outcome
}

fn log_summary(outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Completed(summary) => {
            let secs = summary.elapsed.as_secs_f64();
            let fps = if secs > 0.0 {
                summary.frames_written as f64 / secs
            } else {
                0.0
            };
            log::info!(
                "Annotated {} -> {} frames written, {} skipped of {} read in {:.1}s ({:.1} fps)",
                summary.output_path.display(),
                summary.frames_written,
                summary.frames_skipped,
                summary.frames_read,
                secs,
                fps
            );
            if summary.frames_skipped > 0 {
                log::warn!(
                    "{} frames were dropped; the output is shorter than the input",
                    summary.frames_skipped
                );
            }
        }
        JobOutcome::Failed { stage, error } => {
            // The fatal status event already logged the message.
            log::debug!("Job failed during {stage:?}: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_reach_the_config() {
        let cli = Cli::try_parse_from([
            "vidmark",
            "--output-dir",
            "out",
            "--codec",
            "libx264",
            "--progress-step",
            "5",
            "--confidence",
            "0.6",
            "clip.mp4",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.output_dir, std::path::PathBuf::from("out"));
        assert_eq!(config.output_codec, "libx264");
        assert_eq!(config.progress_step, 5);
        assert!((config.confidence_threshold - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let cli = Cli::try_parse_from(["vidmark", "--iou", "1.5", "clip.mp4"]).unwrap();
        let err = build_config(&cli).unwrap_err();
        assert!(err.to_string().contains("Rejected settings"));
    }
}
