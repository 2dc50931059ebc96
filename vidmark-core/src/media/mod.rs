//! Media I/O abstractions used by the job driver.
//!
//! The driver never talks to ffmpeg directly. It opens a [`FrameSource`] and a
//! [`FrameSink`] through a [`MediaBackend`], which keeps the decoding and
//! encoding tool swappable (the production backend lives in
//! [`crate::external`], test doubles in `mocks`).

use std::fmt;
use std::path::Path;

use crate::error::CoreResult;
use crate::resource::Release;

pub mod frame;
#[cfg(feature = "test-mocks")]
pub mod mocks;

pub use frame::Frame;

/// Frame rate as the rational number containers store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Option<Self> {
        (num > 0 && den > 0).then_some(Self { num, den })
    }

    /// Parses `"30000/1001"` or `"25"` style rates. Zero rates are rejected.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.split_once('/') {
            Some((num, den)) => Self::new(num.trim().parse().ok()?, den.trim().parse().ok()?),
            None => Self::new(value.parse().ok()?, 1),
        }
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Stream metadata shared by the input and the output of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Total frames as reported (or estimated) by the container. Zero if unknown.
    pub total_frames: u64,
}

/// Sequential reader of decoded frames.
pub trait FrameSource: Release {
    fn info(&self) -> &StreamInfo;

    /// Next frame, or `Ok(None)` once the stream is exhausted.
    fn read_frame(&mut self) -> CoreResult<Option<Frame>>;
}

/// Sequential writer of frames into an encoded output.
pub trait FrameSink: Release {
    fn write_frame(&mut self, frame: &Frame) -> CoreResult<()>;

    fn frames_written(&self) -> u64;
}

/// Opens frame sources and sinks.
pub trait MediaBackend {
    type Source: FrameSource;
    type Sink: FrameSink;

    fn open_source(&self, path: &Path) -> CoreResult<Self::Source>;

    /// Opens an output with the given geometry and rate, encoded with `codec`.
    fn open_sink(&self, path: &Path, info: &StreamInfo, codec: &str) -> CoreResult<Self::Sink>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rational_rates() {
        let rate = FrameRate::parse("30000/1001").unwrap();
        assert_eq!(rate, FrameRate { num: 30000, den: 1001 });
        assert!((rate.as_f64() - 29.97).abs() < 0.01);
        assert_eq!(rate.to_string(), "30000/1001");
    }

    #[test]
    fn parses_integer_rates() {
        assert_eq!(FrameRate::parse(" 25 "), FrameRate::new(25, 1));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!(FrameRate::parse("0/0"), None);
        assert_eq!(FrameRate::parse("30/0"), None);
        assert_eq!(FrameRate::parse("abc"), None);
        assert_eq!(FrameRate::parse(""), None);
    }
}
