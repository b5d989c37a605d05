//! Shared fakes for pipeline and loop tests. Each fake keeps its record
//! behind an `Arc<Mutex<_>>` so tests can inspect it after the pipeline
//! has taken ownership.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::capture::domain::capture_source::CaptureSource;
use crate::detection::domain::worker_channel::{SendOutcome, WorkerChannel};
use crate::detection::domain::worker_message::WorkerEvent;
use crate::pipeline::frame_pipeline::FramePipeline;
use crate::pipeline::pipeline_config::{ConfigError, PipelineConfig};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::detection::{BoundingBox, Detection};
use crate::shared::frame::FrameSnapshot;

pub fn detection(label: &str, score: f64) -> Detection {
    Detection::new(BoundingBox::new(1.0, 1.0, 4.0, 4.0), label, score)
}

#[derive(Default)]
pub struct SurfaceLog {
    pub clears: usize,
    pub labels: Vec<String>,
}

pub struct SharedSurface(pub Arc<Mutex<SurfaceLog>>);

impl RenderSurface for SharedSurface {
    fn dimensions(&self) -> (u32, u32) {
        (64, 64)
    }

    fn clear(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.clears += 1;
        log.labels.clear();
    }

    fn draw_box(&mut self, _bounding_box: &BoundingBox, label: &str) {
        self.0.lock().unwrap().labels.push(label.to_string());
    }
}

#[derive(Default)]
pub struct ChannelLog {
    pub inits: Vec<Option<String>>,
    pub sent: Vec<usize>,
    pub events: VecDeque<WorkerEvent>,
    pub busy: bool,
    pub closed: bool,
}

/// Channel that accepts frames instantly and replays scripted events.
pub struct FakeChannel(pub Arc<Mutex<ChannelLog>>);

impl WorkerChannel for FakeChannel {
    fn init(&mut self, backend: Option<&str>) -> bool {
        let mut log = self.0.lock().unwrap();
        log.inits.push(backend.map(str::to_string));
        !log.closed
    }

    fn detect(&mut self, frame: FrameSnapshot) -> SendOutcome {
        let mut log = self.0.lock().unwrap();
        if log.closed {
            SendOutcome::Closed
        } else if log.busy {
            SendOutcome::Busy
        } else {
            log.sent.push(frame.index());
            SendOutcome::Queued
        }
    }

    fn try_next_event(&mut self) -> Option<WorkerEvent> {
        self.0.lock().unwrap().events.pop_front()
    }

    fn pending(&self) -> usize {
        0
    }

    fn shutdown(&mut self) {
        self.0.lock().unwrap().closed = true;
    }
}

#[derive(Default)]
pub struct LoggerLog {
    pub rates: Vec<String>,
    pub infos: Vec<String>,
    pub failures: Vec<String>,
    pub metrics: Vec<(String, f64)>,
}

pub struct SharedLogger(pub Arc<Mutex<LoggerLog>>);

impl PipelineLogger for SharedLogger {
    fn rate(&mut self, formatted: &str) {
        self.0.lock().unwrap().rates.push(formatted.to_string());
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.0
            .lock()
            .unwrap()
            .metrics
            .push((name.to_string(), value));
    }

    fn info(&mut self, message: &str) {
        self.0.lock().unwrap().infos.push(message.to_string());
    }

    fn failure(&mut self, message: &str) {
        self.0.lock().unwrap().failures.push(message.to_string());
    }
}

/// Handles onto the records of a pipeline built from fakes.
#[derive(Clone, Default)]
pub struct Harness {
    pub surface: Arc<Mutex<SurfaceLog>>,
    pub channel: Arc<Mutex<ChannelLog>>,
    pub logger: Arc<Mutex<LoggerLog>>,
}

impl Harness {
    pub fn try_pipeline(
        config: PipelineConfig,
        source: Box<dyn CaptureSource>,
    ) -> Result<(FramePipeline, Harness), ConfigError> {
        let harness = Harness::default();
        let surface = Box::new(SharedSurface(harness.surface.clone()));
        harness.build(config, source, surface)
    }

    /// Like [`Harness::pipeline`] but draws onto `surface`; the surface log
    /// then stays empty.
    pub fn pipeline_with_surface(
        config: PipelineConfig,
        source: Box<dyn CaptureSource>,
        surface: Box<dyn RenderSurface>,
    ) -> (FramePipeline, Harness) {
        Harness::default().build(config, source, surface).unwrap()
    }

    fn build(
        self,
        config: PipelineConfig,
        source: Box<dyn CaptureSource>,
        surface: Box<dyn RenderSurface>,
    ) -> Result<(FramePipeline, Harness), ConfigError> {
        let pipeline = FramePipeline::new(
            config,
            source,
            Box::new(FakeChannel(self.channel.clone())),
            surface,
            Box::new(SharedLogger(self.logger.clone())),
        )?;
        Ok((pipeline, self))
    }

    pub fn pipeline(
        config: PipelineConfig,
        source: Box<dyn CaptureSource>,
    ) -> (FramePipeline, Harness) {
        Self::try_pipeline(config, source).unwrap()
    }

    pub fn push_event(&self, event: WorkerEvent) {
        self.channel.lock().unwrap().events.push_back(event);
    }

    pub fn set_busy(&self, busy: bool) {
        self.channel.lock().unwrap().busy = busy;
    }

    pub fn sent(&self) -> Vec<usize> {
        self.channel.lock().unwrap().sent.clone()
    }

    pub fn inits(&self) -> Vec<Option<String>> {
        self.channel.lock().unwrap().inits.clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.surface.lock().unwrap().labels.clone()
    }

    pub fn clears(&self) -> usize {
        self.surface.lock().unwrap().clears
    }

    pub fn rates(&self) -> Vec<String> {
        self.logger.lock().unwrap().rates.clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.logger.lock().unwrap().failures.clone()
    }
}
