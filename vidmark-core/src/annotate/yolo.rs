//! YOLO object detector on ONNX Runtime.
//!
//! The frame is padded to a square (image in the top-left corner, black
//! fill), resized to the model input with a triangle filter and fed as a
//! normalized CHW tensor. See [`crate::annotate::postprocess`] for the
//! output decoding.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::{Tensor, Value};

use crate::annotate::detector::Detector;
use crate::annotate::overlay::Detection;
use crate::annotate::postprocess::{DecodeParams, decode_output};
use crate::error::{CoreError, CoreResult};
use crate::media::Frame;

/// Square input edge the exported models expect.
pub const INPUT_SIZE: usize = 640;

const OUTPUT_NAMES: [&str; 2] = ["output0", "output"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloSettings {
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
}

pub struct YoloDetector {
    session: Session,
    num_classes: usize,
    settings: YoloSettings,
}

impl YoloDetector {
    pub fn load(model_path: &Path, num_classes: usize, settings: YoloSettings) -> CoreResult<Self> {
        let model_bytes = std::fs::read(model_path).map_err(|e| {
            CoreError::AnnotatorInit(format!("cannot read model {}: {e}", model_path.display()))
        })?;

        let session = Session::builder()
            .map_err(|e| CoreError::AnnotatorInit(format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| CoreError::AnnotatorInit(format!("optimization level: {e}")))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| {
                CoreError::AnnotatorInit(format!(
                    "cannot load model {}: {e}",
                    model_path.display()
                ))
            })?;

        log::info!(
            "Loaded detection model {} ({num_classes} classes)",
            model_path.display()
        );
        Ok(Self {
            session,
            num_classes,
            settings,
        })
    }

    fn preprocess(frame: &Frame) -> CoreResult<(Value, f32)> {
        let (chw, scale) = letterbox_chw(frame)?;
        let shape = vec![1usize, 3, INPUT_SIZE, INPUT_SIZE];
        let input = Tensor::from_array((shape, chw.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| CoreError::Inference(format!("failed to create tensor: {e}")))?;
        Ok((input, scale))
    }
}

/// Pads `frame` to a square, resizes it to [`INPUT_SIZE`] and returns the
/// normalized CHW planes with the model-to-frame scale.
fn letterbox_chw(frame: &Frame) -> CoreResult<(Vec<f32>, f32)> {
    let image = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or_else(|| CoreError::Inference("frame buffer does not match its size".to_string()))?;

    let side = frame.width().max(frame.height());
    let mut canvas = RgbImage::new(side, side);
    imageops::replace(&mut canvas, &image, 0, 0);
    let resized = imageops::resize(
        &canvas,
        INPUT_SIZE as u32,
        INPUT_SIZE as u32,
        FilterType::Triangle,
    );

    let plane = INPUT_SIZE * INPUT_SIZE;
    let mut chw = vec![0f32; 3 * plane];
    for (i, pixel) in resized.pixels().enumerate() {
        for (c, value) in pixel.0.iter().enumerate() {
            chw[c * plane + i] = f32::from(*value) / 255.0;
        }
    }
    Ok((chw, side as f32 / INPUT_SIZE as f32))
}

impl Detector for YoloDetector {
    fn detect(&mut self, frame: &Frame) -> CoreResult<Vec<Detection>> {
        let (input, scale) = Self::preprocess(frame)?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| CoreError::Inference(format!("inference failed: {e}")))?;

        let output = OUTPUT_NAMES
            .iter()
            .find_map(|name| outputs.get(*name))
            .ok_or_else(|| CoreError::Inference("model has no output0 tensor".to_string()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| CoreError::Inference(format!("failed to extract tensor: {e}")))?;
        let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();

        decode_output(
            &shape,
            data,
            &DecodeParams {
                num_classes: self.num_classes,
                confidence_threshold: self.settings.confidence_threshold,
                nms_threshold: self.settings.nms_threshold,
                scale,
                frame_width: frame.width(),
                frame_height: frame.height(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_frame_is_padded_below_and_filtered() {
        // 64x32 frame: left half red, right half blue.
        let (width, height) = (64u32, 32u32);
        let mut data = Vec::with_capacity(Frame::byte_len(width, height));
        for _ in 0..height {
            for x in 0..width {
                data.extend_from_slice(if x < width / 2 { &[255, 0, 0] } else { &[0, 0, 255] });
            }
        }
        let frame = Frame::new(0, width, height, data).unwrap();

        let (chw, scale) = letterbox_chw(&frame).unwrap();

        let plane = INPUT_SIZE * INPUT_SIZE;
        assert_eq!(chw.len(), 3 * plane);
        assert_eq!(scale, 64.0 / INPUT_SIZE as f32);

        let at = |c: usize, x: usize, y: usize| chw[c * plane + y * INPUT_SIZE + x];
        // Inside the image, away from the colour edge.
        assert!((at(0, 10, 10) - 1.0).abs() < 1e-6);
        assert!((at(2, 600, 10) - 1.0).abs() < 1e-6);
        // Bottom half is black padding.
        assert_eq!(at(0, 10, 600), 0.0);
        assert_eq!(at(2, 600, 600), 0.0);
        // The red/blue edge is blended rather than sampled.
        let edge = at(0, INPUT_SIZE / 2, 10);
        assert!(edge > 0.0 && edge < 1.0, "edge red = {edge}");
    }
}
