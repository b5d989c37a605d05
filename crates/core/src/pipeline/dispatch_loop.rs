use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::frame_pipeline::FramePipeline;

/// Requests the owner can make of a running loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    SetDetectionEnabled(bool),
}

#[derive(thiserror::Error, Debug)]
pub enum LoopError {
    #[error("dispatch loop thread panicked; pipeline state was lost")]
    PipelineLost,
}

struct RunningLoop {
    cancelled: Arc<AtomicBool>,
    control: Sender<LoopControl>,
    handle: JoinHandle<FramePipeline>,
}

/// Drives a [`FramePipeline`] on a dedicated thread, one tick per interval.
///
/// Layout: `ticker → loop thread [events/gate/skip/capture/dispatch] → worker`
///
/// At most one schedule exists per loop: starting again stops the previous
/// schedule first. Stopping is synchronous; once `stop` returns no further
/// tick runs and the surface has been cleared.
pub struct DispatchLoop {
    pipeline: Option<FramePipeline>,
    running: Option<RunningLoop>,
    tick_interval: Duration,
    origin: Instant,
    active_schedules: Arc<AtomicUsize>,
}

impl DispatchLoop {
    pub fn new(pipeline: FramePipeline) -> Self {
        Self {
            tick_interval: pipeline.config().tick_interval(),
            pipeline: Some(pipeline),
            running: None,
            origin: Instant::now(),
            active_schedules: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Number of schedule threads currently alive.
    pub fn active_schedules(&self) -> usize {
        self.active_schedules.load(Ordering::Acquire)
    }

    /// The pipeline, while no schedule owns it.
    pub fn pipeline(&self) -> Option<&FramePipeline> {
        self.pipeline.as_ref()
    }

    pub fn pipeline_mut(&mut self) -> Option<&mut FramePipeline> {
        self.pipeline.as_mut()
    }

    pub fn start(&mut self) -> Result<(), LoopError> {
        if self.running.is_some() {
            self.stop()?;
        }
        let mut pipeline = self.pipeline.take().ok_or(LoopError::PipelineLost)?;
        pipeline.activate();

        let cancelled = Arc::new(AtomicBool::new(false));
        let (control_tx, control_rx) = crossbeam_channel::unbounded::<LoopControl>();
        self.active_schedules.fetch_add(1, Ordering::AcqRel);
        let guard = ScheduleGuard(self.active_schedules.clone());

        let handle = spawn_schedule(
            pipeline,
            self.tick_interval,
            self.origin,
            cancelled.clone(),
            control_rx,
            guard,
        );

        log::info!(
            "Dispatch loop started ({} ms per tick)",
            self.tick_interval.as_millis()
        );
        self.running = Some(RunningLoop {
            cancelled,
            control: control_tx,
            handle,
        });
        Ok(())
    }

    /// Cancels the schedule, waits for its thread and clears the surface.
    /// Calling it while stopped only clears the surface.
    pub fn stop(&mut self) -> Result<(), LoopError> {
        if let Some(running) = self.running.take() {
            running.cancelled.store(true, Ordering::Release);
            drop(running.control);
            let pipeline = running.handle.join().map_err(|_| LoopError::PipelineLost)?;
            self.pipeline = Some(pipeline);
            log::info!("Dispatch loop stopped");
        }
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.deactivate();
        }
        Ok(())
    }

    /// Applied on the loop thread between ticks when running.
    pub fn set_detection_enabled(&mut self, enabled: bool) {
        match (&self.running, self.pipeline.as_mut()) {
            (Some(running), _) => {
                if running
                    .control
                    .send(LoopControl::SetDetectionEnabled(enabled))
                    .is_err()
                {
                    log::warn!("Dispatch loop thread is gone; toggle dropped");
                }
            }
            (None, Some(pipeline)) => pipeline.set_detection_enabled(enabled),
            (None, None) => {}
        }
    }

    /// Stops the loop and the worker, handing the pipeline back for
    /// inspection.
    pub fn shutdown(mut self) -> Result<FramePipeline, LoopError> {
        self.stop()?;
        let mut pipeline = self.pipeline.take().ok_or(LoopError::PipelineLost)?;
        pipeline.shutdown_worker();
        Ok(pipeline)
    }
}

impl Drop for DispatchLoop {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{e}");
        }
    }
}

/// Decrements the live schedule count when the thread exits, panics included.
struct ScheduleGuard(Arc<AtomicUsize>);

impl Drop for ScheduleGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn spawn_schedule(
    mut pipeline: FramePipeline,
    interval: Duration,
    origin: Instant,
    cancelled: Arc<AtomicBool>,
    control: Receiver<LoopControl>,
    guard: ScheduleGuard,
) -> JoinHandle<FramePipeline> {
    std::thread::spawn(move || {
        let _guard = guard;
        let ticker = crossbeam_channel::tick(interval);
        loop {
            crossbeam_channel::select! {
                recv(ticker) -> _ => {
                    if cancelled.load(Ordering::Acquire) {
                        break;
                    }
                    let now_ms = origin.elapsed().as_secs_f64() * 1000.0;
                    let outcome = pipeline.tick(now_ms);
                    log::trace!("tick {}: {outcome:?}", pipeline.state().tick_count());
                }
                recv(control) -> message => match message {
                    Ok(message) => apply(&mut pipeline, message),
                    Err(_) => break,
                },
            }
        }
        // Requests sent just before stop still take effect.
        for message in control.try_iter() {
            apply(&mut pipeline, message);
        }
        pipeline
    })
}

fn apply(pipeline: &mut FramePipeline, message: LoopControl) {
    match message {
        LoopControl::SetDetectionEnabled(enabled) => pipeline.set_detection_enabled(enabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::infrastructure::synthetic_source::SyntheticSource;
    use crate::detection::domain::worker_message::WorkerEvent;
    use crate::detection::infrastructure::detection_worker::DetectionWorker;
    use crate::detection::infrastructure::luminance_detector::LuminanceDetector;
    use crate::pipeline::pipeline_config::PipelineConfig;
    use crate::pipeline::test_support::{
        detection, Harness, LoggerLog, SharedLogger, SharedSurface, SurfaceLog,
    };
    use crate::rendering::infrastructure::overlay_surface::OverlaySurface;
    use crate::shared::detection::{BoundingBox, Detection};
    use rstest::rstest;
    use std::sync::Mutex;

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            frame_skip: 1,
            tick_interval_ms: 1,
            ..Default::default()
        }
    }

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met within 5s");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn ready_loop() -> (DispatchLoop, Harness) {
        let (mut pipeline, harness) =
            Harness::pipeline(fast_config(), Box::new(SyntheticSource::new(8, 8)));
        pipeline.mark_capture_ready();
        harness.push_event(WorkerEvent::Ready);
        (DispatchLoop::new(pipeline), harness)
    }

    #[test]
    fn test_start_runs_ticks_until_stop() {
        let (mut dispatch, harness) = ready_loop();

        dispatch.start().unwrap();
        assert!(dispatch.is_running());
        wait_until(|| harness.sent().len() >= 3);
        dispatch.stop().unwrap();

        assert!(!dispatch.is_running());
        assert_eq!(dispatch.active_schedules(), 0);
        let ticks = dispatch.pipeline().unwrap().state().tick_count();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(dispatch.pipeline().unwrap().state().tick_count(), ticks);
    }

    #[test]
    fn test_double_start_keeps_single_schedule() {
        let (mut dispatch, _harness) = ready_loop();

        dispatch.start().unwrap();
        dispatch.start().unwrap();

        wait_until(|| dispatch.active_schedules() == 1);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(dispatch.active_schedules(), 1);

        dispatch.stop().unwrap();
        assert_eq!(dispatch.active_schedules(), 0);
    }

    #[test]
    fn test_restart_preserves_tick_count() {
        let (mut dispatch, harness) = ready_loop();

        dispatch.start().unwrap();
        wait_until(|| !harness.sent().is_empty());
        dispatch.stop().unwrap();
        let first_run = dispatch.pipeline().unwrap().state().tick_count();

        dispatch.start().unwrap();
        wait_until(|| harness.sent().len() > first_run as usize);
        dispatch.stop().unwrap();

        assert!(dispatch.pipeline().unwrap().state().tick_count() > first_run);
    }

    #[test]
    fn test_stop_clears_surface() {
        let (mut dispatch, harness) = ready_loop();
        dispatch.start().unwrap();
        harness.push_event(WorkerEvent::Result {
            detections: vec![detection("person", 0.9)],
        });
        wait_until(|| !harness.labels().is_empty());

        dispatch.stop().unwrap();

        assert!(harness.labels().is_empty());
        assert!(harness.clears() >= 1);
    }

    #[test]
    fn test_result_arriving_after_stop_is_not_drawn() {
        let (mut dispatch, harness) = ready_loop();
        dispatch.start().unwrap();
        wait_until(|| !harness.sent().is_empty());
        dispatch.stop().unwrap();

        harness.push_event(WorkerEvent::Result {
            detections: vec![detection("late", 0.9)],
        });
        dispatch.pipeline_mut().unwrap().drain_events();
        assert!(harness.labels().is_empty());

        // nor on the next start
        harness.push_event(WorkerEvent::Result {
            detections: vec![detection("stale", 0.9)],
        });
        dispatch.start().unwrap();
        std::thread::sleep(Duration::from_millis(10));
        dispatch.stop().unwrap();
        assert!(harness.labels().is_empty());
    }

    #[test]
    fn test_toggle_while_running_applies_on_loop_thread() {
        let (mut dispatch, harness) = ready_loop();
        dispatch.start().unwrap();
        wait_until(|| !harness.sent().is_empty());

        dispatch.set_detection_enabled(false);
        dispatch.stop().unwrap();

        let pipeline = dispatch.pipeline().unwrap();
        assert!(!pipeline.state().gate.detection_enabled());
    }

    #[test]
    fn test_toggle_while_stopped_applies_directly() {
        let (mut dispatch, _harness) = ready_loop();
        dispatch.set_detection_enabled(false);
        assert!(!dispatch.pipeline().unwrap().state().gate.detection_enabled());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (mut dispatch, harness) = ready_loop();
        dispatch.stop().unwrap();
        dispatch.stop().unwrap();
        assert!(dispatch.pipeline().is_some());
        assert_eq!(harness.clears(), 2);
    }

    #[rstest]
    #[case::infinite_origin(BoundingBox::new(f64::INFINITY, 0.0, 10.0, 10.0))]
    #[case::nan_extent(BoundingBox::new(0.0, 0.0, f64::NAN, 10.0))]
    #[case::huge_origin(BoundingBox::new(1e300, -1e300, 10.0, 10.0))]
    #[case::huge_extent(BoundingBox::new(0.0, 0.0, f64::MAX, f64::MAX))]
    fn test_malformed_box_does_not_stop_loop(#[case] bounding_box: BoundingBox) {
        let (mut pipeline, harness) = Harness::pipeline_with_surface(
            fast_config(),
            Box::new(SyntheticSource::new(8, 8)),
            Box::new(OverlaySurface::new(8, 8)),
        );
        pipeline.mark_capture_ready();
        harness.push_event(WorkerEvent::Ready);
        let mut dispatch = DispatchLoop::new(pipeline);

        dispatch.start().unwrap();
        harness.push_event(WorkerEvent::Result {
            detections: vec![Detection::new(bounding_box, "person", 0.9)],
        });
        wait_until(|| harness.channel.lock().unwrap().events.is_empty());
        let sent = harness.sent().len();
        wait_until(|| harness.sent().len() > sent);

        dispatch.stop().unwrap();
        let pipeline = dispatch.pipeline().unwrap();
        assert_eq!(pipeline.state().counters.faults, 0);
        assert_eq!(dispatch.active_schedules(), 0);
    }

    #[test]
    fn test_end_to_end_with_real_worker_draws_boxes() {
        let surface = Arc::new(Mutex::new(SurfaceLog::default()));
        let logger = Arc::new(Mutex::new(LoggerLog::default()));
        let source = SyntheticSource::new(64, 48).with_square(12, 3);
        let worker = DetectionWorker::spawn(Box::new(LuminanceDetector::default()));

        let mut pipeline = FramePipeline::new(
            fast_config(),
            Box::new(source),
            Box::new(worker),
            Box::new(SharedSurface(surface.clone())),
            Box::new(SharedLogger(logger.clone())),
        )
        .unwrap();
        pipeline.mark_capture_ready();
        assert!(pipeline.initialize_worker());

        let mut dispatch = DispatchLoop::new(pipeline);
        dispatch.start().unwrap();
        wait_until(|| !surface.lock().unwrap().labels.is_empty());

        let pipeline = dispatch.shutdown().unwrap();

        assert!(pipeline.state().counters.dispatched > 0);
        assert!(surface.lock().unwrap().labels.is_empty(), "cleared on stop");
        let log = logger.lock().unwrap();
        assert!(log.failures.is_empty());
        assert!(log.metrics.iter().any(|(name, _)| name == "detections"));
    }
}
