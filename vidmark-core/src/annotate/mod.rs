// ============================================================================
// vidmark-core/src/annotate/mod.rs
// ============================================================================
//
// ANNOTATION: Per-frame object detection and overlay drawing
//
// KEY COMPONENTS:
// - Annotator: transforms one frame into its annotated counterpart
// - AnnotatorProvider: builds an annotator from a model file and a label file
// - DefaultAnnotatorProvider: YOLO detector on ONNX Runtime (`onnx` feature)
// - labels / overlay / postprocess: label parsing, box drawing, output decoding
//
// An annotation failure concerns one frame only; the job driver skips that
// frame and continues. Initialization failures are fatal to the job.

pub mod detector;
pub mod labels;
pub mod overlay;
pub mod postprocess;
#[cfg(feature = "onnx")]
pub mod yolo;

use std::path::Path;

use thiserror::Error;

use crate::config::JobConfig;
use crate::error::{CoreError, CoreResult};
use crate::media::Frame;
use crate::resource::Release;

pub use detector::{DetectionAnnotator, Detector};
pub use labels::LabelSet;
pub use overlay::Detection;

/// Failure to annotate a single frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("frame {frame_index}: {reason}")]
pub struct AnnotationError {
    pub frame_index: u64,
    pub reason: String,
}

impl AnnotationError {
    pub fn new(frame_index: u64, reason: impl Into<String>) -> Self {
        Self {
            frame_index,
            reason: reason.into(),
        }
    }
}

/// Turns decoded frames into annotated frames of the same geometry.
pub trait Annotator: Send {
    fn annotate(&mut self, frame: Frame) -> Result<Frame, AnnotationError>;

    /// Frees model resources. Called once when the job ends.
    fn shutdown(&mut self) -> CoreResult<()> {
        Ok(())
    }
}

impl Release for dyn Annotator {
    fn release(&mut self) -> CoreResult<()> {
        self.shutdown()
    }
}

/// Creates annotators for jobs.
pub trait AnnotatorProvider {
    fn initialize(&self, model_path: &Path, label_config_path: &Path) -> CoreResult<Box<dyn Annotator>>;
}

/// Loads the YOLO ONNX model and its class labels.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultAnnotatorProvider {
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    pub box_thickness: u32,
}

impl DefaultAnnotatorProvider {
    pub fn from_config(config: &JobConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            nms_threshold: config.nms_threshold,
            box_thickness: config.box_thickness,
        }
    }
}

impl AnnotatorProvider for DefaultAnnotatorProvider {
    fn initialize(&self, model_path: &Path, label_config_path: &Path) -> CoreResult<Box<dyn Annotator>> {
        let labels = LabelSet::load(label_config_path)?;
        if !model_path.is_file() {
            return Err(CoreError::AnnotatorInit(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }
        self.build(model_path, labels)
    }
}

impl DefaultAnnotatorProvider {
    #[cfg(feature = "onnx")]
    fn build(&self, model_path: &Path, labels: LabelSet) -> CoreResult<Box<dyn Annotator>> {
        let settings = yolo::YoloSettings {
            confidence_threshold: self.confidence_threshold,
            nms_threshold: self.nms_threshold,
        };
        let detector = yolo::YoloDetector::load(model_path, labels.len(), settings)?;
        Ok(Box::new(DetectionAnnotator::new(
            detector,
            labels,
            self.box_thickness,
        )))
    }

    #[cfg(not(feature = "onnx"))]
    fn build(&self, model_path: &Path, _labels: LabelSet) -> CoreResult<Box<dyn Annotator>> {
        Err(CoreError::AnnotatorInit(format!(
            "cannot load {}: built without an inference backend (enable the `onnx` feature)",
            model_path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_labels_fail_initialization() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DefaultAnnotatorProvider::from_config(&JobConfig::default());
        let result = provider.initialize(&dir.path().join("best.onnx"), &dir.path().join("data.yaml"));
        assert!(matches!(result, Err(CoreError::LabelConfig(_))));
    }

    #[test]
    fn missing_model_fails_initialization() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("data.yaml");
        fs::write(&labels, "names: [plate]\n").unwrap();
        let provider = DefaultAnnotatorProvider::from_config(&JobConfig::default());
        match provider.initialize(&dir.path().join("best.onnx"), &labels) {
            Err(CoreError::AnnotatorInit(msg)) => assert!(msg.contains("best.onnx")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn without_backend_initialization_fails() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("data.yaml");
        let model = dir.path().join("best.onnx");
        fs::write(&labels, "names: [plate]\n").unwrap();
        fs::write(&model, b"not a model").unwrap();
        let provider = DefaultAnnotatorProvider::from_config(&JobConfig::default());
        assert!(matches!(
            provider.initialize(&model, &labels),
            Err(CoreError::AnnotatorInit(_))
        ));
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn corrupt_model_fails_in_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("data.yaml");
        let model = dir.path().join("best.onnx");
        fs::write(&labels, "names: [plate]\n").unwrap();
        fs::write(&model, b"not a model").unwrap();
        let provider = DefaultAnnotatorProvider::from_config(&JobConfig::default());
        match provider.initialize(&model, &labels) {
            Err(CoreError::AnnotatorInit(msg)) => {
                assert!(msg.contains("cannot load model"), "{msg}");
                assert!(!msg.contains("feature"), "{msg}");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn annotator_release_calls_shutdown() {
        struct Flagged(std::sync::Arc<std::sync::atomic::AtomicBool>);
        impl Annotator for Flagged {
            fn annotate(&mut self, frame: Frame) -> Result<Frame, AnnotationError> {
                Ok(frame)
            }
            fn shutdown(&mut self) -> CoreResult<()> {
                self.0.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }
        }
        let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let mut annotator: Box<dyn Annotator> = Box::new(Flagged(flag.clone()));
        annotator.release().unwrap();
        assert!(flag.load(std::sync::atomic::Ordering::SeqCst));
    }
}
