//! Core library for annotating videos frame by frame with object detections.
//!
//! A job decodes an input video with ffmpeg, runs every frame through an
//! [`annotate::Annotator`], encodes the annotated frames into
//! `<output_dir>/<stem>-output.<ext>` and reports progress as structured
//! [`status::StatusEvent`]s.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use vidmark_core::annotate::DefaultAnnotatorProvider;
//! use vidmark_core::external::SidecarBackend;
//! use vidmark_core::status::JsonStatusWriter;
//! use vidmark_core::{JobConfig, JobRunner};
//! use std::path::Path;
//!
//! let config = JobConfig::default();
//! config.validate().unwrap();
//!
//! let status = JsonStatusWriter::new();
//! let provider = DefaultAnnotatorProvider::from_config(&config);
//! let runner = JobRunner::new(config, SidecarBackend, provider, &status);
//!
//! let outcome = runner.run(Path::new("clip.mp4"));
//! std::process::exit(outcome.exit_code());
//! ```

pub mod annotate;
pub mod config;
pub mod error;
pub mod external;
pub mod job;
pub mod media;
pub mod progress;
pub mod resource;
pub mod status;

// Re-exports for public API
pub use config::{JobConfig, JobConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use job::{FrameStep, Job, JobOutcome, JobRunner, JobStage, JobSummary, resolve_output_path};
pub use media::{Frame, FrameRate, StreamInfo};
pub use progress::{JobState, report_progress};
pub use status::{StatusEvent, StatusSink};
