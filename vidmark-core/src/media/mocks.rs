// vidmark-core/src/media/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled only with the "test-mocks" feature. The mocks share their state
// through `Arc<Mutex<..>>` so tests can inspect handles after a job has
// consumed (and dropped) them.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::annotate::{AnnotationError, Annotator, AnnotatorProvider};
use crate::error::{CoreError, CoreResult};
use crate::media::{Frame, FrameRate, FrameSink, FrameSource, MediaBackend, StreamInfo};
use crate::resource::Release;
use crate::status::{StatusEvent, StatusSink};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// --- Media backend ---

/// Observable state shared by a [`MockBackend`] and the handles it opens.
#[derive(Debug, Clone)]
pub struct MockMediaState {
    pub info: StreamInfo,
    /// Frames the source actually yields (may differ from `info.total_frames`)
    pub frames_available: u64,
    pub read_error_at: Option<u64>,
    pub write_error_at: Option<u64>,
    pub fail_open_source: bool,
    pub fail_open_sink: bool,
    pub fail_sink_release: bool,
    pub sources_opened: u32,
    pub sinks_opened: u32,
    pub source_releases: u32,
    pub sink_releases: u32,
    pub sink_path: Option<PathBuf>,
    pub sink_codec: Option<String>,
    /// Indices of frames written to the sink, in order
    pub written: Vec<u64>,
}

/// In-memory [`MediaBackend`] producing solid-colour frames.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockMediaState>>,
}

impl MockBackend {
    /// A source of `frames` frames of `width` x `height` at 25 fps, whose
    /// container reports the same total.
    pub fn new(width: u32, height: u32, frames: u64) -> Self {
        let info = StreamInfo {
            width,
            height,
            frame_rate: FrameRate { num: 25, den: 1 },
            total_frames: frames,
        };
        Self {
            state: Arc::new(Mutex::new(MockMediaState {
                info,
                frames_available: frames,
                read_error_at: None,
                write_error_at: None,
                fail_open_source: false,
                fail_open_sink: false,
                fail_sink_release: false,
                sources_opened: 0,
                sinks_opened: 0,
                source_releases: 0,
                sink_releases: 0,
                sink_path: None,
                sink_codec: None,
                written: Vec::new(),
            })),
        }
    }

    /// Overrides the frame count the container reports.
    pub fn with_reported_total(self, total_frames: u64) -> Self {
        lock(&self.state).info.total_frames = total_frames;
        self
    }

    pub fn fail_open_source(self) -> Self {
        lock(&self.state).fail_open_source = true;
        self
    }

    pub fn fail_open_sink(self) -> Self {
        lock(&self.state).fail_open_sink = true;
        self
    }

    pub fn fail_sink_release(self) -> Self {
        lock(&self.state).fail_sink_release = true;
        self
    }

    pub fn read_error_at(self, index: u64) -> Self {
        lock(&self.state).read_error_at = Some(index);
        self
    }

    pub fn write_error_at(self, index: u64) -> Self {
        lock(&self.state).write_error_at = Some(index);
        self
    }

    /// Snapshot of the shared state.
    pub fn state(&self) -> MockMediaState {
        lock(&self.state).clone()
    }
}

impl MediaBackend for MockBackend {
    type Source = MockFrameSource;
    type Sink = MockFrameSink;

    fn open_source(&self, path: &Path) -> CoreResult<Self::Source> {
        let mut state = lock(&self.state);
        if state.fail_open_source {
            return Err(CoreError::PathError(format!(
                "Input file not found: {}",
                path.display()
            )));
        }
        state.sources_opened += 1;
        log::debug!("Mock source opened for {}", path.display());
        Ok(MockFrameSource {
            state: self.state.clone(),
            info: state.info,
            next_index: 0,
            released: false,
        })
    }

    fn open_sink(&self, path: &Path, info: &StreamInfo, codec: &str) -> CoreResult<Self::Sink> {
        let mut state = lock(&self.state);
        if state.fail_open_sink {
            return Err(CoreError::OperationFailed(format!(
                "cannot create {}",
                path.display()
            )));
        }
        state.sinks_opened += 1;
        state.sink_path = Some(path.to_path_buf());
        state.sink_codec = Some(codec.to_string());
        Ok(MockFrameSink {
            state: self.state.clone(),
            info: *info,
            frames_written: 0,
            released: false,
        })
    }
}

pub struct MockFrameSource {
    state: Arc<Mutex<MockMediaState>>,
    info: StreamInfo,
    next_index: u64,
    released: bool,
}

impl FrameSource for MockFrameSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_frame(&mut self) -> CoreResult<Option<Frame>> {
        if self.released {
            return Err(CoreError::StreamClosed("input stream".to_string()));
        }
        let (available, read_error_at) = {
            let state = lock(&self.state);
            (state.frames_available, state.read_error_at)
        };
        if read_error_at == Some(self.next_index) {
            return Err(CoreError::OperationFailed(format!(
                "decoder failed at frame {}",
                self.next_index
            )));
        }
        if self.next_index >= available {
            return Ok(None);
        }
        let index = self.next_index;
        self.next_index += 1;
        let fill = (index % 256) as u8;
        let data = vec![fill; Frame::byte_len(self.info.width, self.info.height)];
        Frame::new(index, self.info.width, self.info.height, data).map(Some)
    }
}

impl Release for MockFrameSource {
    fn release(&mut self) -> CoreResult<()> {
        if !self.released {
            self.released = true;
            lock(&self.state).source_releases += 1;
        }
        Ok(())
    }
}

pub struct MockFrameSink {
    state: Arc<Mutex<MockMediaState>>,
    info: StreamInfo,
    frames_written: u64,
    released: bool,
}

impl FrameSink for MockFrameSink {
    fn write_frame(&mut self, frame: &Frame) -> CoreResult<()> {
        if self.released {
            return Err(CoreError::StreamClosed("output stream".to_string()));
        }
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
        let mut state = lock(&self.state);
        if state.write_error_at == Some(frame.index()) {
            return Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "encoder pipe closed",
            )));
        }
        state.written.push(frame.index());
        self.frames_written += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl Release for MockFrameSink {
    fn release(&mut self) -> CoreResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let mut state = lock(&self.state);
        state.sink_releases += 1;
        if state.fail_sink_release {
            return Err(CoreError::OperationFailed("encoder exited with status 1".to_string()));
        }
        Ok(())
    }
}

// --- Annotator ---

/// Observable state shared by a [`MockAnnotatorProvider`] and its annotators.
#[derive(Debug, Clone, Default)]
pub struct MockAnnotatorState {
    pub initializations: u32,
    pub annotated: Vec<u64>,
    pub shutdowns: u32,
}

/// Provider of pass-through annotators with scripted failures.
#[derive(Debug, Clone, Default)]
pub struct MockAnnotatorProvider {
    init_error: Option<String>,
    fail_frames: Vec<u64>,
    wrong_size_frames: Vec<u64>,
    state: Arc<Mutex<MockAnnotatorState>>,
}

impl MockAnnotatorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_init(mut self, cause: &str) -> Self {
        self.init_error = Some(cause.to_string());
        self
    }

    pub fn fail_frame(mut self, index: u64) -> Self {
        self.fail_frames.push(index);
        self
    }

    /// The annotator returns a 1x1 frame for `index`.
    pub fn wrong_size_frame(mut self, index: u64) -> Self {
        self.wrong_size_frames.push(index);
        self
    }

    pub fn state(&self) -> MockAnnotatorState {
        lock(&self.state).clone()
    }
}

impl AnnotatorProvider for MockAnnotatorProvider {
    fn initialize(&self, model_path: &Path, _label_config_path: &Path) -> CoreResult<Box<dyn Annotator>> {
        lock(&self.state).initializations += 1;
        if let Some(cause) = &self.init_error {
            return Err(CoreError::AnnotatorInit(cause.clone()));
        }
        log::debug!("Mock annotator initialized for {}", model_path.display());
        Ok(Box::new(MockAnnotator {
            fail_frames: self.fail_frames.clone(),
            wrong_size_frames: self.wrong_size_frames.clone(),
            state: self.state.clone(),
        }))
    }
}

struct MockAnnotator {
    fail_frames: Vec<u64>,
    wrong_size_frames: Vec<u64>,
    state: Arc<Mutex<MockAnnotatorState>>,
}

impl Annotator for MockAnnotator {
    fn annotate(&mut self, frame: Frame) -> Result<Frame, AnnotationError> {
        let index = frame.index();
        lock(&self.state).annotated.push(index);
        if self.fail_frames.contains(&index) {
            return Err(AnnotationError::new(index, "mock detector failure"));
        }
        if self.wrong_size_frames.contains(&index) {
            return Frame::new(index, 1, 1, vec![0; Frame::CHANNELS])
                .map_err(|e| AnnotationError::new(index, e.to_string()));
        }
        Ok(frame)
    }

    fn shutdown(&mut self) -> CoreResult<()> {
        lock(&self.state).shutdowns += 1;
        Ok(())
    }
}

// --- Status ---

/// Status sink collecting every event.
#[derive(Debug, Default)]
pub struct RecordingStatusSink {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        lock(&self.events).clone()
    }

    /// Progress values of all non-terminal events, in order.
    pub fn progress_values(&self) -> Vec<u8> {
        lock(&self.events)
            .iter()
            .filter_map(StatusEvent::progress_value)
            .collect()
    }
}

impl StatusSink for RecordingStatusSink {
    fn emit(&self, event: &StatusEvent) {
        lock(&self.events).push(event.clone());
    }
}
