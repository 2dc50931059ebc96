// vidmark-core/tests/annotation_tests.rs

use std::fs;

use tempfile::tempdir;
use vidmark_core::annotate::overlay::class_color;
use vidmark_core::annotate::{Annotator, Detection, DetectionAnnotator, Detector, LabelSet};
use vidmark_core::{CoreResult, Frame};

/// Reports one box per frame, moving one pixel right every frame.
struct SlidingDetector;

impl Detector for SlidingDetector {
    fn detect(&mut self, frame: &Frame) -> CoreResult<Vec<Detection>> {
        Ok(vec![Detection {
            x: frame.index() as f32,
            y: 1.0,
            width: 3.0,
            height: 3.0,
            class_id: 1,
            confidence: 0.8,
        }])
    }
}

#[test]
fn detection_annotator_draws_with_labels_from_yaml() {
    let dir = tempdir().unwrap();
    let data_yaml = dir.path().join("data.yaml");
    fs::write(
        &data_yaml,
        "train: ../train/images\nval: ../valid/images\n\nnc: 2\nnames: ['license-plate', 'vehicle']\n",
    )
    .unwrap();
    let labels = LabelSet::load(&data_yaml).unwrap();
    assert_eq!(labels.name(1), "vehicle");

    let mut annotator = DetectionAnnotator::new(SlidingDetector, labels, 1);
    for index in 0..3u64 {
        let frame = Frame::new(index, 8, 8, vec![0; Frame::byte_len(8, 8)]).unwrap();
        let annotated = annotator.annotate(frame).unwrap();
        assert_eq!((annotated.width(), annotated.height()), (8, 8));
        assert_eq!(annotated.index(), index);
        assert_eq!(annotated.pixel(index as u32, 1), Some(class_color(1)));
        assert_eq!(annotated.pixel(index as u32 + 1, 2), Some([0, 0, 0]));
    }
    assert_eq!(annotator.detections_total(), 3);
}
