// ============================================================================
// vidmark-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: Frame decoding and encoding through ffmpeg child processes
//
// KEY COMPONENTS:
// - SidecarFrameSource: decodes the input to raw RGB24 frames on ffmpeg's
//   stdout, read through ffmpeg-sidecar's event iterator
// - SidecarFrameSink: pipes raw RGB24 frames into an encoding ffmpeg's stdin
// - SidecarBackend: MediaBackend opening both of the above
//
// The source decodes its first frame while opening. ffmpeg applies display
// rotation when decoding, so the reported geometry comes from that frame, not
// from the container's coded size.
//
// Both handles own their child process. Releasing a handle ends the process
// (closing stdin for the encoder, killing the decoder if it is still running)
// and waits for it, so no ffmpeg outlives the job.

use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
};
use crate::external::{
    check_dependency, is_non_critical_ffmpeg_error, map_ffmpeg_log_level, probe_stream,
};
use crate::media::{Frame, FrameSink, FrameSource, MediaBackend, StreamInfo};
use crate::resource::Release;
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel as FfmpegLogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ChildStdin;
use std::thread::{self, JoinHandle};

const DECODER: &str = "ffmpeg (decode)";
const ENCODER: &str = "ffmpeg (encode)";

// --- Backend ---

/// [`MediaBackend`] decoding and encoding with the `ffmpeg` binary on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct SidecarBackend;

impl MediaBackend for SidecarBackend {
    type Source = SidecarFrameSource;
    type Sink = SidecarFrameSink;

    fn open_source(&self, path: &Path) -> CoreResult<Self::Source> {
        SidecarFrameSource::open(path)
    }

    fn open_sink(&self, path: &Path, info: &StreamInfo, codec: &str) -> CoreResult<Self::Sink> {
        SidecarFrameSink::open(path, info, codec)
    }
}

// --- Decoding ---

/// Reads decoded RGB24 frames from an ffmpeg child process.
pub struct SidecarFrameSource {
    path: PathBuf,
    info: StreamInfo,
    child: Option<FfmpegChild>,
    events: Option<FfmpegIterator>,
    pending: Option<Frame>,
    next_index: u64,
    exhausted: bool,
    stderr_buffer: String,
}

impl SidecarFrameSource {
    /// Probes `path` and starts decoding it.
    ///
    /// Fails when the file is missing, cannot be probed (unsupported container,
    /// no video stream) or ffmpeg cannot be started.
    pub fn open(path: &Path) -> CoreResult<Self> {
        if !path.is_file() {
            return Err(CoreError::PathError(format!(
                "Input file not found: {}",
                path.display()
            )));
        }
        check_dependency("ffmpeg")?;
        let info = probe_stream(path)?;

        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner();
        cmd.arg("-nostdin");
        cmd.input(path.to_string_lossy().as_ref());
        cmd.args(["-map", "0:v:0", "-an", "-sn"]);
        cmd.rawvideo();

        log::debug!("Running decode command: {:?}", cmd);
        let mut child = cmd.spawn().map_err(|e| command_start_error(DECODER, e))?;
        let events = match child.iter() {
            Ok(events) => events,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CoreError::OperationFailed(format!(
                    "{DECODER}: failed to read process output: {e}"
                )));
            }
        };

        let mut source = Self {
            path: path.to_path_buf(),
            info,
            child: Some(child),
            events: Some(events),
            pending: None,
            next_index: 0,
            exhausted: false,
            stderr_buffer: String::new(),
        };
        if let Err(e) = source.prime() {
            if let Err(release_error) = source.release() {
                log::warn!("Failed to release input stream: {release_error}");
            }
            return Err(e);
        }

        log::info!(
            "Opened {} ({}x{} @ {} fps, {} frames)",
            path.display(),
            source.info.width,
            source.info.height,
            source.info.frame_rate,
            source.info.total_frames
        );
        Ok(source)
    }

    /// Decodes the first frame and takes the output geometry from it.
    fn prime(&mut self) -> CoreResult<()> {
        let Some(frame) = self.next_decoded()? else {
            return Ok(());
        };
        if (frame.width(), frame.height()) != (self.info.width, self.info.height) {
            log::info!(
                "Decoded frames of {} are {}x{}, stream reports {}x{} (display rotation)",
                self.path.display(),
                frame.width(),
                frame.height(),
                self.info.width,
                self.info.height
            );
            self.info.width = frame.width();
            self.info.height = frame.height();
        }
        self.pending = Some(frame);
        Ok(())
    }

    /// Pulls events until the next decoded frame or the end of the output.
    fn next_decoded(&mut self) -> CoreResult<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }

        while let Some(event) = self.events.as_mut().and_then(Iterator::next) {
            match event {
                FfmpegEvent::OutputFrame(output) => {
                    let frame = Frame::new(self.next_index, output.width, output.height, output.data)?;
                    self.next_index += 1;
                    return Ok(Some(frame));
                }
                FfmpegEvent::Log(level, message) => self.handle_log(level, &message),
                FfmpegEvent::Error(error) => self.handle_error(&error),
                _ => {}
            }
        }

        self.finish()?;
        Ok(None)
    }

    fn handle_log(&mut self, level: FfmpegLogLevel, message: &str) {
        let log_level = map_ffmpeg_log_level(&level);
        log::log!(target: "ffmpeg_log", log_level, "{message}");
        if log_level == log::Level::Error {
            self.stderr_buffer.push_str(message);
            self.stderr_buffer.push('\n');
        }
    }

    fn handle_error(&mut self, error: &str) {
        if is_non_critical_ffmpeg_error(error) {
            log::debug!("ffmpeg non-critical message: {error}");
        } else {
            log::warn!(target: "ffmpeg_log", "{error}");
            self.stderr_buffer.push_str(error);
            self.stderr_buffer.push('\n');
        }
    }

    /// Waits for the decoder after its output is exhausted and checks its exit status.
    fn finish(&mut self) -> CoreResult<()> {
        self.exhausted = true;
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| command_wait_error(DECODER, e))?;
        if status.success() {
            log::debug!("Decoder finished after {} frames", self.next_index);
            Ok(())
        } else {
            Err(command_failed_error(
                DECODER,
                status,
                self.stderr_buffer.trim().to_string(),
            ))
        }
    }
}

impl FrameSource for SidecarFrameSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_frame(&mut self) -> CoreResult<Option<Frame>> {
        if self.events.is_none() {
            return Err(CoreError::StreamClosed(format!(
                "input stream {}",
                self.path.display()
            )));
        }
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }
        self.next_decoded()
    }
}

impl Release for SidecarFrameSource {
    fn release(&mut self) -> CoreResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if !self.exhausted {
            // Stop a decoder that still has frames queued; it may already be gone.
            if let Err(e) = child.kill() {
                log::debug!("Decoder kill for {}: {e}", self.path.display());
            }
        }
        self.events = None;
        self.pending = None;
        child.wait().map_err(|e| command_wait_error(DECODER, e))?;
        log::debug!("Released input stream {}", self.path.display());
        Ok(())
    }
}

// --- Encoding ---

/// Writes raw RGB24 frames into an encoding ffmpeg child process.
pub struct SidecarFrameSink {
    path: PathBuf,
    info: StreamInfo,
    child: Option<FfmpegChild>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<String>>,
    frames_written: u64,
}

impl SidecarFrameSink {
    /// Starts an encoder producing `path` with the geometry and rate of `info`.
    pub fn open(path: &Path, info: &StreamInfo, codec: &str) -> CoreResult<Self> {
        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner();
        cmd.args(["-loglevel", "error", "-nostats"]);
        cmd.format("rawvideo");
        cmd.pix_fmt("rgb24");
        cmd.args(["-s", format!("{}x{}", info.width, info.height).as_str()]);
        cmd.args(["-framerate", info.frame_rate.to_string().as_str()]);
        cmd.input("-");
        cmd.codec_video(codec);
        cmd.pix_fmt("yuv420p");
        cmd.overwrite();
        cmd.output(path.to_string_lossy().as_ref());

        log::debug!("Running encode command: {:?}", cmd);
        let mut child = cmd.spawn().map_err(|e| command_start_error(ENCODER, e))?;

        let stdin = child.take_stdin();
        let stderr = child.take_stderr();
        let (Some(stdin), Some(mut stderr)) = (stdin, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CoreError::OperationFailed(format!(
                "{ENCODER}: process pipes unavailable"
            )));
        };

        // Keeps the encoder from blocking on a full stderr pipe.
        let stderr_drain = thread::spawn(move || {
            let mut buffer = String::new();
            if let Err(e) = stderr.read_to_string(&mut buffer) {
                log::debug!("Encoder stderr read ended: {e}");
            }
            buffer
        });

        log::info!(
            "Writing {} ({}x{} @ {} fps, codec {codec})",
            path.display(),
            info.width,
            info.height,
            info.frame_rate
        );

        Ok(Self {
            path: path.to_path_buf(),
            info: *info,
            child: Some(child),
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            frames_written: 0,
        })
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr_drain
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}

impl FrameSink for SidecarFrameSink {
    fn write_frame(&mut self, frame: &Frame) -> CoreResult<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            CoreError::StreamClosed(format!("output stream {}", self.path.display()))
        })?;
        if frame.width() != self.info.width || frame.height() != self.info.height {
            return Err(CoreError::VideoInfoError(format!(
                "Frame {} is {}x{}, output stream expects {}x{}",
                frame.index(),
                frame.width(),
                frame.height(),
                self.info.width,
                self.info.height
            )));
        }
        stdin.write_all(frame.data())?;
        self.frames_written += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl Release for SidecarFrameSink {
    fn release(&mut self) -> CoreResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        // Closing stdin signals end of input; ffmpeg then finalizes the container.
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.flush() {
                log::debug!("Encoder stdin flush failed: {e}");
            }
        }
        let status = child.wait().map_err(|e| command_wait_error(ENCODER, e))?;
        let stderr = self.collect_stderr();
        if !status.success() {
            log::error!("Encoder failed for {}: {}", self.path.display(), stderr.trim());
            return Err(command_failed_error(ENCODER, status, stderr.trim().to_string()));
        }
        log::debug!(
            "Released output stream {} ({} frames)",
            self.path.display(),
            self.frames_written
        );
        Ok(())
    }
}
