use crate::capture::domain::capture_source::CaptureSource;

/// Effect of flipping the detection switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionToggle {
    Enabled,
    /// The caller must clear the render surface now.
    Disabled,
    Unchanged,
}

/// Independent readiness signals, combined into one dispatch permission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadinessGate {
    capture_ready: bool,
    worker_ready: bool,
    detection_enabled: bool,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            capture_ready: false,
            worker_ready: false,
            detection_enabled: true,
        }
    }

    /// Pure check. The source is only queried when every flag is set.
    pub fn can_dispatch(&self, source: &dyn CaptureSource) -> bool {
        if !(self.capture_ready && self.worker_ready && self.detection_enabled) {
            return false;
        }
        if !source.current_frame_available() {
            return false;
        }
        let (w, h) = source.dimensions();
        w > 0 && h > 0
    }

    pub fn capture_ready(&self) -> bool {
        self.capture_ready
    }

    pub fn worker_ready(&self) -> bool {
        self.worker_ready
    }

    pub fn detection_enabled(&self) -> bool {
        self.detection_enabled
    }

    pub fn set_capture_ready(&mut self, ready: bool) {
        self.capture_ready = ready;
    }

    pub fn set_worker_ready(&mut self, ready: bool) {
        self.worker_ready = ready;
    }

    pub fn set_detection_enabled(&mut self, enabled: bool) -> DetectionToggle {
        if self.detection_enabled == enabled {
            return DetectionToggle::Unchanged;
        }
        self.detection_enabled = enabled;
        if enabled {
            DetectionToggle::Enabled
        } else {
            DetectionToggle::Disabled
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
