//! Detector-backed annotator.

use crate::annotate::labels::LabelSet;
use crate::annotate::overlay::{self, Detection};
use crate::annotate::{AnnotationError, Annotator};
use crate::error::CoreResult;
use crate::media::Frame;

/// Finds objects in a frame.
pub trait Detector: Send {
    fn detect(&mut self, frame: &Frame) -> CoreResult<Vec<Detection>>;
}

/// Annotates frames by drawing the boxes a [`Detector`] returns.
pub struct DetectionAnnotator<D: Detector> {
    detector: D,
    labels: LabelSet,
    thickness: u32,
    detections_total: u64,
}

impl<D: Detector> DetectionAnnotator<D> {
    pub fn new(detector: D, labels: LabelSet, thickness: u32) -> Self {
        Self {
            detector,
            labels,
            thickness,
            detections_total: 0,
        }
    }

    pub fn detections_total(&self) -> u64 {
        self.detections_total
    }
}

impl<D: Detector> Annotator for DetectionAnnotator<D> {
    fn annotate(&mut self, frame: Frame) -> Result<Frame, AnnotationError> {
        let index = frame.index();
        let detections = self
            .detector
            .detect(&frame)
            .map_err(|e| AnnotationError::new(index, e.to_string()))?;

        for detection in &detections {
            log::trace!(
                "Frame {index}: {} ({:.2}) at {:.0},{:.0} {:.0}x{:.0}",
                self.labels.name(detection.class_id),
                detection.confidence,
                detection.x,
                detection.y,
                detection.width,
                detection.height
            );
        }
        self.detections_total += detections.len() as u64;

        let (width, height) = (frame.width(), frame.height());
        let mut data = frame.into_data();
        overlay::draw_detections(&mut data, width, height, &detections, self.thickness);
        Frame::new(index, width, height, data).map_err(|e| AnnotationError::new(index, e.to_string()))
    }

    fn shutdown(&mut self) -> CoreResult<()> {
        log::debug!("Annotator drew {} detections", self.detections_total);
        Ok(())
    }
}
