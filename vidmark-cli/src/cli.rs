// vidmark-cli/src/cli.rs
//
// Defines the command-line argument structure using clap.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use vidmark_core::config::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_LABEL_CONFIG_PATH, DEFAULT_MODEL_PATH,
    DEFAULT_NMS_THRESHOLD, DEFAULT_OUTPUT_CODEC, DEFAULT_OUTPUT_DIR, DEFAULT_PROGRESS_STEP,
};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "vidmark: draws object detections onto videos",
    long_about = "Runs an object detection model over every frame of a video and writes an \
                  annotated copy. Progress is reported on stdout as one JSON object per line; \
                  logs go to stderr."
)]
pub struct Cli {
    /// Video file to annotate
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory receiving the annotated video (created if missing)
    #[arg(short = 'o', long, value_name = "DIR", env = "VIDMARK_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// ONNX detection model
    #[arg(long, value_name = "PATH", env = "VIDMARK_MODEL", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// YOLO data.yaml holding the class names
    #[arg(long, value_name = "PATH", env = "VIDMARK_LABELS", default_value = DEFAULT_LABEL_CONFIG_PATH)]
    pub labels: PathBuf,

    /// ffmpeg encoder for the output video
    #[arg(long, value_name = "CODEC", env = "VIDMARK_CODEC", default_value = DEFAULT_OUTPUT_CODEC)]
    pub codec: String,

    /// Minimum progress gain, in percentage points, between two progress reports
    #[arg(
        long,
        value_name = "PERCENT",
        env = "VIDMARK_PROGRESS_STEP",
        default_value_t = DEFAULT_PROGRESS_STEP,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub progress_step: u8,

    /// Minimum detection confidence (0.0-1.0)
    #[arg(long, value_name = "SCORE", env = "VIDMARK_CONFIDENCE", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence: f32,

    /// IoU threshold for non-maximum suppression (0.0-1.0)
    #[arg(long, value_name = "IOU", env = "VIDMARK_IOU", default_value_t = DEFAULT_NMS_THRESHOLD)]
    pub iou: f32,

    /// Increase log verbosity on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", env = "VIDMARK_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}
