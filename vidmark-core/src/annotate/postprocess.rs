//! Decoding of raw YOLO output tensors into detections.
//!
//! Two tensor layouts are understood:
//! - `[1, N, 5 + nc]`: one row per candidate (`cx, cy, w, h, objectness, class scores...`)
//! - `[1, 4 + nc, N]`: one column per candidate (`cx, cy, w, h, class scores...`)
//!
//! Box coordinates are in model input space and are scaled back to the frame
//! with a single factor, since the frame is padded to a square before resizing.

use crate::annotate::overlay::Detection;
use crate::error::{CoreError, CoreResult};

/// Minimum best-class score for a candidate with objectness to be kept.
pub const CLASS_SCORE_THRESHOLD: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeParams {
    pub num_classes: usize,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    /// Frame pixels per model input pixel
    pub scale: f32,
    pub frame_width: u32,
    pub frame_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `[N, 5 + nc]` with objectness
    Rows { candidates: usize, stride: usize },
    /// `[4 + nc, N]` without objectness
    Columns { candidates: usize },
}

fn detect_layout(shape: &[usize], num_classes: usize) -> CoreResult<Layout> {
    let dims: Vec<usize> = match shape {
        [1, a, b] => vec![*a, *b],
        [a, b] => vec![*a, *b],
        _ => {
            return Err(CoreError::Inference(format!(
                "unexpected output tensor shape {shape:?}"
            )));
        }
    };
    let (a, b) = (dims[0], dims[1]);
    if b == num_classes + 5 {
        Ok(Layout::Rows {
            candidates: a,
            stride: b,
        })
    } else if a == num_classes + 4 {
        Ok(Layout::Columns { candidates: b })
    } else {
        Err(CoreError::Inference(format!(
            "output tensor shape {shape:?} does not match {num_classes} classes"
        )))
    }
}

/// Turns a raw output tensor into frame-space detections after NMS.
pub fn decode_output(shape: &[usize], data: &[f32], params: &DecodeParams) -> CoreResult<Vec<Detection>> {
    let layout = detect_layout(shape, params.num_classes)?;
    let expected: usize = shape.iter().product();
    if data.len() < expected {
        return Err(CoreError::Inference(format!(
            "output tensor holds {} values, shape {shape:?} needs {expected}",
            data.len()
        )));
    }

    let mut candidates = Vec::new();
    match layout {
        Layout::Rows { candidates: n, stride } => {
            for row in data.chunks_exact(stride).take(n) {
                let objectness = row[4];
                if objectness < params.confidence_threshold {
                    continue;
                }
                let Some((class_id, class_score)) = best_class(&row[5..]) else {
                    continue;
                };
                if class_score < CLASS_SCORE_THRESHOLD {
                    continue;
                }
                candidates.push(to_frame_box(
                    [row[0], row[1], row[2], row[3]],
                    class_id,
                    objectness,
                    params,
                ));
            }
        }
        Layout::Columns { candidates: n } => {
            let at = |attr: usize, i: usize| data[attr * n + i];
            for i in 0..n {
                let scores: Vec<f32> = (0..params.num_classes).map(|c| at(4 + c, i)).collect();
                let Some((class_id, score)) = best_class(&scores) else {
                    continue;
                };
                if score < params.confidence_threshold {
                    continue;
                }
                candidates.push(to_frame_box(
                    [at(0, i), at(1, i), at(2, i), at(3, i)],
                    class_id,
                    score,
                    params,
                ));
            }
        }
    }

    Ok(non_maximum_suppression(candidates, params.nms_threshold))
}

fn best_class(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

fn to_frame_box(cxcywh: [f32; 4], class_id: usize, confidence: f32, params: &DecodeParams) -> Detection {
    let [cx, cy, w, h] = cxcywh.map(|v| v * params.scale);
    let frame_w = params.frame_width as f32;
    let frame_h = params.frame_height as f32;
    let x1 = (cx - w / 2.0).clamp(0.0, frame_w);
    let y1 = (cy - h / 2.0).clamp(0.0, frame_h);
    let x2 = (cx + w / 2.0).clamp(0.0, frame_w);
    let y2 = (cy + h / 2.0).clamp(0.0, frame_h);
    Detection {
        x: x1,
        y: y1,
        width: x2 - x1,
        height: y2 - y1,
        class_id,
        confidence,
    }
}

/// Greedy per-class NMS, highest confidence first.
pub fn non_maximum_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(num_classes: usize) -> DecodeParams {
        DecodeParams {
            num_classes,
            confidence_threshold: 0.4,
            nms_threshold: 0.45,
            scale: 2.0,
            frame_width: 1280,
            frame_height: 720,
        }
    }

    #[test]
    fn decodes_row_layout_with_objectness() {
        // Two classes: stride 7.
        let data = vec![
            100.0, 100.0, 20.0, 10.0, 0.9, 0.1, 0.8, // kept, class 1
            200.0, 200.0, 20.0, 10.0, 0.3, 0.9, 0.0, // objectness too low
            300.0, 300.0, 20.0, 10.0, 0.8, 0.1, 0.2, // class score too low
        ];
        let detections = decode_output(&[1, 3, 7], &data, &params(2)).unwrap();
        assert_eq!(detections.len(), 1);
        let d = detections[0];
        assert_eq!(d.class_id, 1);
        assert!((d.x - 180.0).abs() < 1e-3);
        assert!((d.y - 190.0).abs() < 1e-3);
        assert!((d.width - 40.0).abs() < 1e-3);
        assert!((d.height - 20.0).abs() < 1e-3);
        assert!((d.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn decodes_column_layout() {
        // One class, three candidates: attributes are rows.
        let data = vec![
            10.0, 50.0, 90.0, // cx
            10.0, 50.0, 90.0, // cy
            4.0, 4.0, 4.0, // w
            4.0, 4.0, 4.0, // h
            0.1, 0.95, 0.5, // class 0 score
        ];
        let detections = decode_output(&[1, 5, 3], &data, &params(1)).unwrap();
        assert_eq!(detections.len(), 2);
        assert!((detections[0].confidence - 0.95).abs() < 1e-6);
        assert!((detections[1].confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn boxes_are_clamped_to_the_frame() {
        let data = vec![0.0, 0.0, 50.0, 50.0, 0.9, 1.0];
        let detections = decode_output(&[1, 1, 6], &data, &params(1)).unwrap();
        assert_eq!(detections[0].x, 0.0);
        assert_eq!(detections[0].y, 0.0);
        assert!((detections[0].width - 50.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        assert!(decode_output(&[1, 3, 9], &[0.0; 27], &params(2)).is_err());
        assert!(decode_output(&[3, 1, 7], &[0.0; 21], &params(2)).is_err());
        assert!(decode_output(&[1, 3, 7], &[0.0; 5], &params(2)).is_err());
    }

    #[test]
    fn nms_keeps_best_of_overlapping_same_class() {
        let make = |x: f32, class_id: usize, confidence: f32| Detection {
            x,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            class_id,
            confidence,
        };
        let kept = non_maximum_suppression(
            vec![make(0.0, 0, 0.6), make(1.0, 0, 0.9), make(1.0, 1, 0.5), make(50.0, 0, 0.4)],
            0.45,
        );
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].confidence, 0.9);
        assert!(kept.iter().any(|d| d.class_id == 1));
        assert!(kept.iter().any(|d| d.x == 50.0));
    }
}
