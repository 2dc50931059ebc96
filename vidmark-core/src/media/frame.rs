//! Decoded video frames.

use crate::error::{CoreError, CoreResult};

/// One decoded RGB24 image and its position in the stream.
///
/// Frames are immutable: annotators consume a frame and produce a new one of
/// the same dimensions through [`Frame::with_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    index: u64,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Bytes per pixel (packed RGB).
    pub const CHANNELS: usize = 3;

    pub fn new(index: u64, width: u32, height: u32, data: Vec<u8>) -> CoreResult<Self> {
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(CoreError::FrameSize {
                index,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            index,
            width,
            height,
            data,
        })
    }

    /// Size in bytes of a `width` x `height` RGB24 buffer.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::CHANNELS
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Builds the frame that replaces this one, keeping index and dimensions.
    pub fn with_data(&self, data: Vec<u8>) -> CoreResult<Self> {
        Self::new(self.index, self.width, self.height, data)
    }

    /// Pixel at (`x`, `y`), or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        Some([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_size() {
        let err = Frame::new(4, 2, 2, vec![0; 11]).unwrap_err();
        match err {
            CoreError::FrameSize { index, expected, actual } => {
                assert_eq!((index, expected, actual), (4, 12, 11));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn with_data_keeps_identity() {
        let frame = Frame::new(7, 1, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let next = frame.with_data(vec![9; 6]).unwrap();
        assert_eq!(next.index(), 7);
        assert_eq!((next.width(), next.height()), (1, 2));
        assert_eq!(next.pixel(0, 1), Some([9, 9, 9]));
        assert!(frame.with_data(vec![0; 3]).is_err());
    }

    #[test]
    fn pixel_lookup() {
        let frame = Frame::new(0, 2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.pixel(1, 0), Some([4, 5, 6]));
        assert_eq!(frame.pixel(2, 0), None);
    }
}
