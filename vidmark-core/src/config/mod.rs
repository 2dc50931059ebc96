//! Configuration structures and constants for the vidmark-core library.
//!
//! A [`JobConfig`] fixes everything a job needs besides the input path: where
//! output goes, which model and label files to load, how the output is encoded
//! and how often progress is reported.

mod builder;

use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};

pub use builder::JobConfigBuilder;

// Default constants

/// Directory (relative to the working directory) that receives annotated videos.
pub const DEFAULT_OUTPUT_DIR: &str = "videos";

/// Suffix inserted between the input file stem and its extension.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "-output";

/// ONNX model loaded by the default annotator provider.
pub const DEFAULT_MODEL_PATH: &str = "models/best.onnx";

/// YOLO dataset description holding the class names.
pub const DEFAULT_LABEL_CONFIG_PATH: &str = "models/data.yaml";

/// ffmpeg encoder for the output stream. `mpeg4` is ffmpeg's MP4V encoder.
pub const DEFAULT_OUTPUT_CODEC: &str = "mpeg4";

/// Minimum progress gain (in percentage points) between two progress events.
pub const DEFAULT_PROGRESS_STEP: u8 = 10;

/// Minimum detection confidence kept by the detector.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.4;

/// IoU above which overlapping detections of the same class are suppressed.
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.45;

/// Line width of drawn bounding boxes, in pixels.
pub const DEFAULT_BOX_THICKNESS: u32 = 2;

/// Configuration of a single annotation job.
///
/// All fields have defaults matching the fixed layout the pipeline was
/// designed around (`models/` next to the binary's working directory, output
/// under `videos/`). Use [`JobConfigBuilder`] to override individual values.
///
/// # Examples
///
/// ```rust
/// use vidmark_core::config::JobConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = JobConfigBuilder::new()
///     .output_dir(PathBuf::from("out"))
///     .progress_step(5)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Directory where annotated videos are written (created on demand)
    pub output_dir: PathBuf,

    /// Suffix inserted before the input's extension to name the output
    pub output_suffix: String,

    /// Detection model file handed to the annotator provider
    pub model_path: PathBuf,

    /// Label configuration handed to the annotator provider
    pub label_config_path: PathBuf,

    /// ffmpeg video encoder used for the output stream
    pub output_codec: String,

    /// Progress events are emitted every `progress_step` percentage points
    pub progress_step: u8,

    /// Minimum detection confidence
    pub confidence_threshold: f32,

    /// Non-maximum suppression IoU threshold
    pub nms_threshold: f32,

    /// Bounding box line width in pixels
    pub box_thickness: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            label_config_path: PathBuf::from(DEFAULT_LABEL_CONFIG_PATH),
            output_codec: DEFAULT_OUTPUT_CODEC.to_string(),
            progress_step: DEFAULT_PROGRESS_STEP,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            box_thickness: DEFAULT_BOX_THICKNESS,
        }
    }
}

impl JobConfig {
    /// Checks the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(CoreError::Config("output directory must not be empty".to_string()));
        }
        if self.output_suffix.is_empty() {
            return Err(CoreError::Config("output suffix must not be empty".to_string()));
        }
        if self.output_suffix.contains(['/', '\\']) {
            return Err(CoreError::Config(format!(
                "output suffix '{}' must not contain path separators",
                self.output_suffix
            )));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(CoreError::Config("model path must not be empty".to_string()));
        }
        if self.label_config_path.as_os_str().is_empty() {
            return Err(CoreError::Config("label config path must not be empty".to_string()));
        }
        if self.output_codec.trim().is_empty() {
            return Err(CoreError::Config("output codec must not be empty".to_string()));
        }
        if !(1..=100).contains(&self.progress_step) {
            return Err(CoreError::Config(format!(
                "progress step must be within 1-100, got {}",
                self.progress_step
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CoreError::Config(format!(
                "confidence threshold must be within 0.0-1.0, got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.nms_threshold) {
            return Err(CoreError::Config(format!(
                "NMS threshold must be within 0.0-1.0, got {}",
                self.nms_threshold
            )));
        }
        if self.box_thickness == 0 {
            return Err(CoreError::Config("box thickness must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_layout() {
        let config = JobConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("videos"));
        assert_eq!(config.output_suffix, "-output");
        assert_eq!(config.model_path, PathBuf::from("models/best.onnx"));
        assert_eq!(config.label_config_path, PathBuf::from("models/data.yaml"));
        assert_eq!(config.output_codec, "mpeg4");
        assert_eq!(config.progress_step, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_progress_step() {
        let mut config = JobConfig::default();
        config.progress_step = 0;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
        config.progress_step = 101;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn rejects_suffix_with_separator() {
        let mut config = JobConfig::default();
        config.output_suffix = "/escape".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_thresholds() {
        let mut config = JobConfig::default();
        config.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = JobConfig::default();
        config.nms_threshold = -0.1;
        assert!(config.validate().is_err());
    }
}
