// ============================================================================
// vidmark-core/src/job.rs
// ============================================================================
//
// JOB DRIVER: End-to-end lifecycle of one annotation job
//
// Steps, in order:
// 1. resolve the output path and create the output directory
// 2. initialize the annotator
// 3. open the input stream and read its metadata
// 4. open the output stream with the input's geometry and rate
// 5. read, annotate and write every frame, reporting progress
// 6. release all handles, then emit the terminal record
//
// An input path with no file name fails as an unreadable input before any
// directory is created.
//
// Setup failures (1-4) and unexpected failures inside the loop are fatal and
// produce exactly one status event at progress 100. A failed annotation only
// skips its frame.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::annotate::{Annotator, AnnotatorProvider};
use crate::config::JobConfig;
use crate::error::{CoreError, CoreResult};
use crate::media::{Frame, FrameSink, FrameSource, MediaBackend, StreamInfo};
use crate::progress::JobState;
use crate::resource::Scoped;
use crate::status::{StatusEvent, StatusSink};

/// Message prefix of the fatal event for an unreadable input.
pub const INPUT_OPEN_ERROR: &str =
    "Error: Unable to open video file. Please check the file format or path.";

/// Derives `<output_dir>/<stem><suffix>.<ext>` from the input path.
///
/// Inputs without an extension get the suffix appended.
pub fn resolve_output_path(input: &Path, output_dir: &Path, suffix: &str) -> CoreResult<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| {
        CoreError::PathError(format!("Input path has no file name: {}", input.display()))
    })?;
    let mut name = stem.to_os_string();
    name.push(suffix);
    if let Some(extension) = input.extension() {
        name.push(".");
        name.push(extension);
    }
    Ok(output_dir.join(name))
}

/// A running job: where it reads, where it writes and how far it got.
#[derive(Debug, Clone)]
pub struct Job {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub info: StreamInfo,
    pub state: JobState,
}

/// Result of handling one decoded frame.
#[derive(Debug)]
pub enum FrameStep {
    /// The annotated frame reached the output.
    Written,
    /// The frame was dropped; the job goes on.
    Skip(String),
    /// The job cannot continue.
    Abort(CoreError),
}

/// Where a failed job stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    PrepareOutput,
    InitializeAnnotator,
    OpenInput,
    OpenOutput,
    Processing,
    Finalize,
}

/// Counters of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub output_path: PathBuf,
    pub frames_read: u64,
    pub frames_written: u64,
    pub frames_skipped: u64,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub enum JobOutcome {
    Completed(JobSummary),
    Failed { stage: JobStage, error: CoreError },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Process exit code: 0 on completion, 1 on any fatal failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(_) => 0,
            Self::Failed { .. } => 1,
        }
    }
}

#[derive(Debug, Default)]
struct FrameCounts {
    read: u64,
    written: u64,
    skipped: u64,
}

/// Runs jobs against a media backend and an annotator provider, reporting to
/// a status sink.
pub struct JobRunner<'a, B: MediaBackend, P: AnnotatorProvider> {
    config: JobConfig,
    backend: B,
    provider: P,
    status: &'a dyn StatusSink,
}

impl<'a, B: MediaBackend, P: AnnotatorProvider> JobRunner<'a, B, P> {
    pub fn new(config: JobConfig, backend: B, provider: P, status: &'a dyn StatusSink) -> Self {
        Self {
            config,
            backend,
            provider,
            status,
        }
    }

    /// Annotates `input` into the configured output directory.
    pub fn run(&self, input: &Path) -> JobOutcome {
        let started = Instant::now();
        log::info!("Starting job for {}", input.display());

        let output_path =
            match resolve_output_path(input, &self.config.output_dir, &self.config.output_suffix) {
                Ok(path) => path,
                Err(e) => {
                    let message = format!("{INPUT_OPEN_ERROR} ({e})");
                    return self.fail(JobStage::OpenInput, message, e);
                }
            };
        if let Err(e) = self.prepare_output_dir(&output_path) {
            let message = format!("Error: Unable to open output video: {e}");
            return self.fail(JobStage::PrepareOutput, message, e);
        }

        let annotator = match self
            .provider
            .initialize(&self.config.model_path, &self.config.label_config_path)
        {
            Ok(annotator) => annotator,
            Err(e) => {
                let message = format!("Error initializing model: {e}");
                return self.fail(JobStage::InitializeAnnotator, message, e);
            }
        };
        let mut annotator = Scoped::new("annotator", annotator);

        let source = match self.backend.open_source(input) {
            Ok(source) => source,
            Err(e) => {
                let message = format!("{INPUT_OPEN_ERROR} ({e})");
                return self.fail(JobStage::OpenInput, message, e);
            }
        };
        let info = *source.info();
        let mut source = Scoped::new("input stream", source);

        let sink = match self
            .backend
            .open_sink(&output_path, &info, &self.config.output_codec)
        {
            Ok(sink) => sink,
            Err(e) => {
                let message = format!("Error: Unable to open output video: {e}");
                return self.fail(JobStage::OpenOutput, message, e);
            }
        };
        let mut sink = Scoped::new("output stream", sink);

        let mut job = Job {
            input_path: input.to_path_buf(),
            output_path,
            info,
            state: JobState::new(),
        };
        let processed = self.process_frames(&mut job, &mut source, &mut annotator, &mut sink);

        if let Err(e) = source.release() {
            log::warn!("Failed to release input stream: {e}");
        }
        if let Err(e) = annotator.release() {
            log::warn!("Failed to release annotator: {e}");
        }
        let finalized = sink.release();

        let counts = match processed {
            Ok(counts) => counts,
            Err(e) => {
                let message = format!("An error occurred during processing: {e}");
                return self.fail(JobStage::Processing, message, e);
            }
        };
        if let Err(e) = finalized {
            let message = format!("An error occurred during processing: {e}");
            return self.fail(JobStage::Finalize, message, e);
        }

        self.status.emit(&StatusEvent::completed(
            job.output_path.to_string_lossy().into_owned(),
        ));

        let summary = JobSummary {
            output_path: job.output_path,
            frames_read: counts.read,
            frames_written: counts.written,
            frames_skipped: counts.skipped,
            elapsed: started.elapsed(),
        };
        log::info!(
            "Job finished: {} frames read, {} written, {} skipped",
            summary.frames_read,
            summary.frames_written,
            summary.frames_skipped
        );
        JobOutcome::Completed(summary)
    }

    fn prepare_output_dir(&self, output_path: &Path) -> CoreResult<()> {
        fs::create_dir_all(&self.config.output_dir)?;
        log::debug!("Output path: {}", output_path.display());
        Ok(())
    }

    fn process_frames(
        &self,
        job: &mut Job,
        source: &mut Scoped<B::Source>,
        annotator: &mut Scoped<Box<dyn Annotator>>,
        sink: &mut Scoped<B::Sink>,
    ) -> CoreResult<FrameCounts> {
        let mut counts = FrameCounts::default();

        while let Some(frame) = source.get_mut()?.read_frame()? {
            counts.read += 1;
            let index = frame.index();

            match process_frame(frame, annotator.get_mut()?.as_mut(), sink.get_mut()?) {
                FrameStep::Written => counts.written += 1,
                FrameStep::Skip(reason) => {
                    counts.skipped += 1;
                    log::debug!("Skipping frame {index}: {reason}");
                    self.status.emit(&StatusEvent::warning(
                        job.state.last_reported_progress,
                        format!("Error processing frame {index}. Skipping."),
                    ));
                }
                FrameStep::Abort(e) => return Err(e),
            }

            if let Some(event) = job.state.advance(job.info.total_frames, self.config.progress_step) {
                self.status.emit(&event);
            }
        }

        log::debug!(
            "Input {} exhausted after {} frames ({} expected)",
            job.input_path.display(),
            job.state.frame_index,
            job.info.total_frames
        );
        Ok(counts)
    }

    fn fail(&self, stage: JobStage, message: String, error: CoreError) -> JobOutcome {
        self.status.emit(&StatusEvent::fatal(message));
        JobOutcome::Failed { stage, error }
    }
}

/// Annotates one frame and writes the result.
pub fn process_frame<S: FrameSink + ?Sized>(
    frame: Frame,
    annotator: &mut dyn Annotator,
    sink: &mut S,
) -> FrameStep {
    let (width, height) = (frame.width(), frame.height());
    match annotator.annotate(frame) {
        Err(e) => FrameStep::Skip(e.to_string()),
        Ok(annotated) if annotated.width() != width || annotated.height() != height => {
            FrameStep::Skip(format!(
                "annotator returned a {}x{} frame for a {width}x{height} input",
                annotated.width(),
                annotated.height()
            ))
        }
        Ok(annotated) => match sink.write_frame(&annotated) {
            Ok(()) => FrameStep::Written,
            Err(e) => FrameStep::Abort(e),
        },
    }
}
