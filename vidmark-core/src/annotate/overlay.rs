//! Bounding box drawing on packed RGB24 frames.

/// One detected object in frame pixel coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with `other`.
    pub fn iou(&self, other: &Detection) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

const PALETTE: [[u8; 3]; 8] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [72, 249, 10],
    [26, 147, 52],
    [0, 194, 255],
    [132, 56, 255],
];

/// Box colour for a class. Stable across frames and runs.
pub fn class_color(class_id: usize) -> [u8; 3] {
    PALETTE[class_id % PALETTE.len()]
}

/// Draws the outline of every detection into `data`, an RGB24 buffer of
/// `width` x `height` pixels. Boxes are clipped to the frame.
pub fn draw_detections(
    data: &mut [u8],
    width: u32,
    height: u32,
    detections: &[Detection],
    thickness: u32,
) {
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 || data.len() < w * h * 3 {
        return;
    }
    let thickness = thickness.max(1) as usize;

    for detection in detections {
        let Some((left, top, right, bottom)) = clip(detection, w, h) else {
            continue;
        };
        let color = class_color(detection.class_id);

        for t in 0..thickness {
            if top + t <= bottom {
                fill_row(data, w, top + t, left, right, color);
            }
            if bottom >= top + t {
                fill_row(data, w, bottom - t, left, right, color);
            }
            if left + t <= right {
                fill_column(data, w, left + t, top, bottom, color);
            }
            if right >= left + t {
                fill_column(data, w, right - t, top, bottom, color);
            }
        }
    }
}

/// Inclusive pixel bounds of a detection inside the frame, or `None` when it
/// lies entirely outside.
fn clip(detection: &Detection, w: usize, h: usize) -> Option<(usize, usize, usize, usize)> {
    if !(detection.x.is_finite()
        && detection.y.is_finite()
        && detection.width.is_finite()
        && detection.height.is_finite())
    {
        return None;
    }
    let x1 = detection.x.round();
    let y1 = detection.y.round();
    let x2 = (detection.x + detection.width).round() - 1.0;
    let y2 = (detection.y + detection.height).round() - 1.0;
    if x2 < 0.0 || y2 < 0.0 || x1 >= w as f32 || y1 >= h as f32 || x2 < x1 || y2 < y1 {
        return None;
    }
    let left = x1.max(0.0) as usize;
    let top = y1.max(0.0) as usize;
    let right = (x2 as usize).min(w - 1);
    let bottom = (y2 as usize).min(h - 1);
    Some((left, top, right, bottom))
}

fn fill_row(data: &mut [u8], w: usize, y: usize, x1: usize, x2: usize, color: [u8; 3]) {
    let start = (y * w + x1) * 3;
    let end = (y * w + x2 + 1) * 3;
    for pixel in data[start..end].chunks_exact_mut(3) {
        pixel.copy_from_slice(&color);
    }
}

fn fill_column(data: &mut [u8], w: usize, x: usize, y1: usize, y2: usize, color: [u8; 3]) {
    for y in y1..=y2 {
        let offset = (y * w + x) * 3;
        data[offset..offset + 3].copy_from_slice(&color);
    }
}
