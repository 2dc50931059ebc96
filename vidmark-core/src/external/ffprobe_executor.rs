//! FFprobe integration for reading stream metadata
//!
//! The job needs four facts about its input: width, height, frame rate and
//! total frame count. The frame count is container dependent; when the stream
//! does not carry `nb_frames` it is estimated from the duration.
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use crate::media::{FrameRate, StreamInfo};
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Reads the metadata of the first video stream in `input_path`.
pub fn probe_stream(input_path: &Path) -> CoreResult<StreamInfo> {
    log::debug!(
        "Running ffprobe (via crate) for stream info on: {}",
        input_path.display()
    );
    let metadata = ffprobe(input_path).map_err(|err| {
        log::error!("ffprobe failed on {}: {:?}", input_path.display(), err);
        map_ffprobe_error(err, "stream info")
    })?;

    let video_stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            CoreError::VideoInfoError(format!(
                "No video stream found in {}",
                input_path.display()
            ))
        })?;

    let width = dimension(video_stream.width, "width", input_path)?;
    let height = dimension(video_stream.height, "height", input_path)?;

    let frame_rate = select_frame_rate(&video_stream.avg_frame_rate, &video_stream.r_frame_rate)
        .ok_or_else(|| {
            CoreError::VideoInfoError(format!(
                "Video stream has no usable frame rate in {} (avg={}, r={})",
                input_path.display(),
                video_stream.avg_frame_rate,
                video_stream.r_frame_rate
            ))
        })?;

    let duration = video_stream
        .duration
        .as_deref()
        .or(metadata.format.duration.as_deref());
    let total_frames = estimate_total_frames(video_stream.nb_frames.as_deref(), duration, frame_rate);

    if total_frames == 0 {
        log::warn!(
            "Total frame count unknown for {}, progress will not be reported",
            input_path.display()
        );
    }

    Ok(StreamInfo {
        width,
        height,
        frame_rate,
        total_frames,
    })
}

fn dimension(value: Option<i64>, name: &str, input_path: &Path) -> CoreResult<u32> {
    let value = value.ok_or_else(|| {
        CoreError::VideoInfoError(format!(
            "Video stream missing {name} in {}",
            input_path.display()
        ))
    })?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            CoreError::VideoInfoError(format!(
                "Invalid {name} ({value}) found in {}",
                input_path.display()
            ))
        })
}

/// Prefers the average rate; `r_frame_rate` is the fallback for streams that
/// report `0/0` as average.
pub(crate) fn select_frame_rate(avg_frame_rate: &str, r_frame_rate: &str) -> Option<FrameRate> {
    FrameRate::parse(avg_frame_rate).or_else(|| FrameRate::parse(r_frame_rate))
}

/// `nb_frames` when present and non-zero, else `round(duration * fps)`, else 0.
pub(crate) fn estimate_total_frames(
    nb_frames: Option<&str>,
    duration_secs: Option<&str>,
    frame_rate: FrameRate,
) -> u64 {
    if let Some(count) = nb_frames.and_then(|n| n.trim().parse::<u64>().ok()).filter(|n| *n > 0) {
        return count;
    }
    duration_secs
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| (d * frame_rate.as_f64()).round() as u64)
        .unwrap_or(0)
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => {
            CoreError::FfprobeParse(format!("ffprobe {context} output deserialization: {err}"))
        }
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error during {context}: {err:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(num: u32, den: u32) -> FrameRate {
        FrameRate::new(num, den).unwrap()
    }

    #[test]
    fn nb_frames_wins() {
        assert_eq!(estimate_total_frames(Some("240"), Some("100.0"), rate(24, 1)), 240);
    }

    #[test]
    fn duration_fallback_rounds() {
        assert_eq!(estimate_total_frames(None, Some("10.01"), rate(30000, 1001)), 300);
        assert_eq!(estimate_total_frames(Some("0"), Some("2.0"), rate(25, 1)), 50);
        assert_eq!(estimate_total_frames(Some("N/A"), Some("1.0"), rate(30, 1)), 30);
    }

    #[test]
    fn unknown_total_is_zero() {
        assert_eq!(estimate_total_frames(None, None, rate(25, 1)), 0);
        assert_eq!(estimate_total_frames(None, Some("N/A"), rate(25, 1)), 0);
    }

    #[test]
    fn average_rate_preferred() {
        assert_eq!(select_frame_rate("25/1", "50/1"), Some(rate(25, 1)));
        assert_eq!(select_frame_rate("0/0", "24000/1001"), Some(rate(24000, 1001)));
        assert_eq!(select_frame_rate("0/0", "0/0"), None);
    }

    #[test]
    fn missing_file_fails_to_probe() {
        let result = probe_stream(Path::new("/definitely/not/here/clip.mp4"));
        assert!(result.is_err());
    }
}
