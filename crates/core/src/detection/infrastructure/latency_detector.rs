use std::time::Duration;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::detection::ResultSet;
use crate::shared::frame::FrameSnapshot;

/// Decorator that holds every inference for a fixed duration.
///
/// Simulates a model whose latency exceeds the tick interval, which is the
/// situation the in-flight limit exists for.
pub struct LatencyDetector {
    inner: Box<dyn ObjectDetector>,
    latency: Duration,
}

impl LatencyDetector {
    pub fn new(inner: Box<dyn ObjectDetector>, latency: Duration) -> Self {
        Self { inner, latency }
    }
}

impl ObjectDetector for LatencyDetector {
    fn load(&mut self, backend: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
        self.inner.load(backend)
    }

    fn detect(&mut self, frame: &FrameSnapshot) -> Result<ResultSet, Box<dyn std::error::Error>> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        self.inner.detect(frame)
    }
}
