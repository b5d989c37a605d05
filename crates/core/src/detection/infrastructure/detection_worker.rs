use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::detection::domain::object_detector::ObjectDetector;
use crate::detection::domain::worker_channel::{SendOutcome, WorkerChannel};
use crate::detection::domain::worker_message::{WorkerEvent, WorkerRequest};
use crate::detection::domain::worker_state::WorkerState;
use crate::shared::constants::DEFAULT_MAX_PENDING_DETECTIONS;
use crate::shared::frame::FrameSnapshot;

pub const WORKER_STOPPED_MESSAGE: &str = "detection worker stopped unexpectedly";

/// Runs an [`ObjectDetector`] on a dedicated thread behind a message channel.
///
/// Layout: `loop → requests → worker [load/detect] → events → loop`
///
/// Requests are handled strictly one at a time in FIFO order. Admission of
/// `detect` requests is capped at `max_pending` unacknowledged frames; beyond
/// that the newest frame is dropped on the sender side, so the queue can
/// never grow without bound when inference is slower than dispatch.
pub struct DetectionWorker {
    requests: Option<Sender<WorkerRequest>>,
    events: Receiver<WorkerEvent>,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
    handle: Option<JoinHandle<()>>,
    disconnect_reported: bool,
}

impl DetectionWorker {
    pub fn spawn(detector: Box<dyn ObjectDetector>) -> Self {
        Self::with_max_pending(detector, DEFAULT_MAX_PENDING_DETECTIONS)
    }

    pub fn with_max_pending(detector: Box<dyn ObjectDetector>, max_pending: usize) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<WorkerRequest>();
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerEvent>();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = WorkerLoop {
            detector,
            state: WorkerState::default(),
            events: event_tx,
            pending: pending.clone(),
        };
        let handle = std::thread::spawn(move || worker.run(request_rx));

        Self {
            requests: Some(request_tx),
            events: event_rx,
            pending,
            max_pending: max_pending.max(1),
            handle: Some(handle),
            disconnect_reported: false,
        }
    }

    /// Blocks up to `timeout` for the next event.
    pub fn wait_event(&mut self, timeout: Duration) -> Option<WorkerEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => self.report_disconnect(),
        }
    }

    fn try_reserve(&self) -> bool {
        let max = self.max_pending;
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .is_ok()
    }

    fn report_disconnect(&mut self) -> Option<WorkerEvent> {
        if self.disconnect_reported {
            return None;
        }
        self.disconnect_reported = true;
        Some(WorkerEvent::error(WORKER_STOPPED_MESSAGE))
    }
}

impl WorkerChannel for DetectionWorker {
    fn init(&mut self, backend: Option<&str>) -> bool {
        let Some(requests) = &self.requests else {
            return false;
        };
        let request = WorkerRequest::Init {
            backend: backend.map(str::to_string),
        };
        log::debug!("-> worker {}", request.to_wire());
        requests.send(request).is_ok()
    }

    fn detect(&mut self, frame: FrameSnapshot) -> SendOutcome {
        let Some(requests) = &self.requests else {
            return SendOutcome::Closed;
        };
        if !self.try_reserve() {
            log::debug!(
                "Worker busy ({} pending), dropping frame {}",
                self.pending.load(Ordering::Acquire),
                frame.index()
            );
            return SendOutcome::Busy;
        }
        match requests.send(WorkerRequest::Detect(frame)) {
            Ok(()) => SendOutcome::Queued,
            Err(_) => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                SendOutcome::Closed
            }
        }
    }

    fn try_next_event(&mut self) -> Option<WorkerEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.report_disconnect(),
        }
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    fn shutdown(&mut self) {
        // Closing the request channel ends the worker loop once it drains.
        self.requests = None;
        self.disconnect_reported = true;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Detection worker thread panicked");
            }
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Decrements the in-flight count when a `detect` request is done,
/// including when inference panics.
struct Acknowledge(Arc<AtomicUsize>);

impl Drop for Acknowledge {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

struct WorkerLoop {
    detector: Box<dyn ObjectDetector>,
    state: WorkerState,
    events: Sender<WorkerEvent>,
    pending: Arc<AtomicUsize>,
}

impl WorkerLoop {
    fn run(mut self, requests: Receiver<WorkerRequest>) {
        for request in requests {
            let delivered = match request {
                WorkerRequest::Init { backend } => self.initialize(backend.as_deref()),
                WorkerRequest::Detect(frame) => self.detect(frame),
            };
            if !delivered {
                break;
            }
        }
        log::debug!("Detection worker exiting in state {:?}", self.state);
    }

    /// Returns `false` once nobody is listening for events.
    fn initialize(&mut self, backend: Option<&str>) -> bool {
        if let Err(e) = self.state.begin_init() {
            log::warn!("Ignoring init request: {e}");
            return true;
        }

        let loaded = self.detector.load(backend);
        if let Err(e) = self.state.finish_init(loaded.is_ok()) {
            log::error!("{e}");
        }

        let event = match loaded {
            Ok(()) => {
                log::info!("Detection worker ready");
                WorkerEvent::Ready
            }
            Err(e) => {
                log::error!("Detection worker initialization failed: {e}");
                WorkerEvent::error(e.to_string())
            }
        };
        self.events.send(event).is_ok()
    }

    fn detect(&mut self, frame: FrameSnapshot) -> bool {
        let ack = Acknowledge(self.pending.clone());
        let index = frame.index();

        if !self.state.accepts_detect() {
            log::debug!(
                "Dropping detect request for frame {index} in state {:?}",
                self.state
            );
            return true;
        }

        let outcome = self.detector.detect(&frame);
        drop(frame);
        drop(ack);

        match outcome {
            Ok(detections) => self.events.send(WorkerEvent::Result { detections }).is_ok(),
            Err(e) => {
                log::warn!("Detection failed on frame {index}: {e} - skipping frame");
                true
            }
        }
    }
}
