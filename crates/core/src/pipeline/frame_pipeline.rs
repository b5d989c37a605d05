use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::capture::domain::capture_source::CaptureSource;
use crate::detection::domain::worker_channel::{SendOutcome, WorkerChannel};
use crate::detection::domain::worker_message::WorkerEvent;
use crate::pipeline::pipeline_config::{ConfigError, PipelineConfig};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::pipeline_state::PipelineState;
use crate::pipeline::readiness_gate::DetectionToggle;
use crate::rendering::domain::render_surface::RenderSurface;
use crate::rendering::domain::result_renderer::ResultRenderer;
use crate::shared::detection::ResultSet;

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The readiness gate was closed.
    Gated,
    /// Not a dispatch tick under frame skip.
    Skipped,
    CaptureFailed,
    Dispatched,
    /// The worker already had its in-flight limit; the frame was dropped.
    Busy,
    WorkerClosed,
    /// Event handling or dispatch panicked and was contained.
    Faulted,
}

/// The tick body: gate, skip, capture, dispatch, render, telemetry.
///
/// Owns every collaborator so a tick can run on whichever thread the
/// scheduler picks without sharing memory with anything else.
pub struct FramePipeline {
    state: PipelineState,
    config: PipelineConfig,
    source: Box<dyn CaptureSource>,
    channel: Box<dyn WorkerChannel>,
    surface: Box<dyn RenderSurface>,
    renderer: ResultRenderer,
    logger: Box<dyn PipelineLogger>,
}

impl FramePipeline {
    pub fn new(
        config: PipelineConfig,
        source: Box<dyn CaptureSource>,
        channel: Box<dyn WorkerChannel>,
        surface: Box<dyn RenderSurface>,
        logger: Box<dyn PipelineLogger>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: PipelineState::new(config.rate_update_interval_ms),
            renderer: ResultRenderer::new(config.score_threshold),
            config,
            source,
            channel,
            surface,
            logger,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn surface(&self) -> &dyn RenderSurface {
        self.surface.as_ref()
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.renderer.is_active()
    }

    /// The capture collaborator finished setting the source up.
    pub fn mark_capture_ready(&mut self) {
        self.state.gate.set_capture_ready(true);
    }

    /// Starts an init round on the worker with the configured backend hint.
    pub fn initialize_worker(&mut self) -> bool {
        let sent = self.channel.init(self.config.backend.as_deref());
        if !sent {
            self.logger.failure("Detection worker is not running");
        }
        sent
    }

    /// Applies events that arrived while stopped, then lets renders through.
    /// Results from before the restart are discarded, readiness is kept.
    pub fn activate(&mut self) {
        self.drain_events();
        self.renderer.set_active(true);
    }

    /// Stops rendering and wipes the surface.
    pub fn deactivate(&mut self) {
        self.renderer.set_active(false);
        self.renderer.clear(self.surface.as_mut());
    }

    pub fn set_detection_enabled(&mut self, enabled: bool) {
        match self.state.gate.set_detection_enabled(enabled) {
            DetectionToggle::Disabled => {
                self.renderer.clear(self.surface.as_mut());
                self.logger.info("Detection disabled");
            }
            DetectionToggle::Enabled => self.logger.info("Detection enabled"),
            DetectionToggle::Unchanged => {}
        }
    }

    /// Runs one tick at `now_ms` (monotonic milliseconds). A panic while
    /// handling worker events or dispatching only costs this tick.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        let step = panic::catch_unwind(AssertUnwindSafe(|| {
            self.drain_events();
            self.dispatch()
        }));
        let outcome = match step {
            Ok(outcome) => outcome,
            Err(payload) => {
                log::error!(
                    "Tick {} faulted: {} - skipping tick",
                    self.state.tick_count(),
                    panic_message(payload.as_ref())
                );
                self.state.counters.faults += 1;
                TickOutcome::Faulted
            }
        };

        self.state.complete_tick(now_ms, self.logger.as_mut());
        outcome
    }

    /// Handles every event the worker has queued so far, in order.
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.channel.try_next_event() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Ready => {
                self.state.gate.set_worker_ready(true);
                self.logger.info("Detection worker ready");
            }
            WorkerEvent::Result { detections } => self.render(detections),
            WorkerEvent::Error { message } => {
                self.state.gate.set_worker_ready(false);
                self.logger.failure(&message);
            }
        }
    }

    /// Stops the worker. The pipeline can no longer dispatch afterwards.
    pub fn shutdown_worker(&mut self) {
        self.channel.shutdown();
        self.state.gate.set_worker_ready(false);
    }

    fn dispatch(&mut self) -> TickOutcome {
        if !self.state.gate.can_dispatch(self.source.as_ref()) {
            return TickOutcome::Gated;
        }
        if self.state.tick_count() % self.config.frame_skip != 0 {
            return TickOutcome::Skipped;
        }

        let frame = match self.source.snapshot() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Frame capture failed: {e} - skipping frame");
                self.state.counters.capture_failures += 1;
                return TickOutcome::CaptureFailed;
            }
        };

        match self.channel.detect(frame) {
            SendOutcome::Queued => {
                self.state.counters.dispatched += 1;
                TickOutcome::Dispatched
            }
            SendOutcome::Busy => {
                self.state.counters.busy_drops += 1;
                TickOutcome::Busy
            }
            SendOutcome::Closed => TickOutcome::WorkerClosed,
        }
    }

    fn render(&mut self, detections: ResultSet) {
        if !self.state.gate.detection_enabled() {
            log::debug!("Discarding result received while detection is disabled");
            return;
        }
        match self.renderer.render(self.surface.as_mut(), &detections) {
            Some(drawn) => {
                self.logger.metric("detections", drawn as f64);
                log::debug!(
                    "<- worker {}",
                    WorkerEvent::Result { detections }.to_json()
                );
            }
            None => log::debug!("Discarding result received after stop"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
