// ============================================================================
// vidmark-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for JobConfig
//
// Fluent construction of JobConfig. Every field starts at its documented
// default; only the values a caller cares about need to be set.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::JobConfig;

/// Builder for creating [`JobConfig`] instances.
///
/// # Examples
///
/// ```rust
/// use vidmark_core::config::JobConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = JobConfigBuilder::new()
///     .output_dir(PathBuf::from("/tmp/annotated"))
///     .model_path(PathBuf::from("weights/yolo.onnx"))
///     .label_config_path(PathBuf::from("weights/data.yaml"))
///     .output_codec("libx264")
///     .build();
/// assert_eq!(config.output_codec, "libx264");
/// ```
#[derive(Debug, Clone, Default)]
pub struct JobConfigBuilder {
    config: JobConfig,
}

impl JobConfigBuilder {
    /// Creates a new builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory annotated videos are written to.
    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.config.output_dir = output_dir;
        self
    }

    /// Sets the suffix inserted before the output file's extension.
    pub fn output_suffix(mut self, suffix: &str) -> Self {
        self.config.output_suffix = suffix.to_string();
        self
    }

    /// Sets the detection model path.
    pub fn model_path(mut self, model_path: PathBuf) -> Self {
        self.config.model_path = model_path;
        self
    }

    /// Sets the label configuration path.
    pub fn label_config_path(mut self, label_config_path: PathBuf) -> Self {
        self.config.label_config_path = label_config_path;
        self
    }

    /// Sets the ffmpeg encoder used for the output stream.
    pub fn output_codec(mut self, codec: &str) -> Self {
        self.config.output_codec = codec.to_string();
        self
    }

    /// Sets the progress reporting step in percentage points.
    pub fn progress_step(mut self, step: u8) -> Self {
        self.config.progress_step = step;
        self
    }

    /// Sets the minimum detection confidence.
    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.config.confidence_threshold = threshold;
        self
    }

    /// Sets the NMS IoU threshold.
    pub fn nms_threshold(mut self, threshold: f32) -> Self {
        self.config.nms_threshold = threshold;
        self
    }

    /// Sets the bounding box line width.
    pub fn box_thickness(mut self, thickness: u32) -> Self {
        self.config.box_thickness = thickness;
        self
    }

    /// Builds the configuration. Call [`JobConfig::validate`] before use.
    pub fn build(self) -> JobConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_what_is_set() {
        let config = JobConfigBuilder::new()
            .output_dir(PathBuf::from("annotated"))
            .progress_step(25)
            .build();

        assert_eq!(config.output_dir, PathBuf::from("annotated"));
        assert_eq!(config.progress_step, 25);
        assert_eq!(config.output_suffix, super::super::DEFAULT_OUTPUT_SUFFIX);
        assert_eq!(config.output_codec, super::super::DEFAULT_OUTPUT_CODEC);
    }
}
