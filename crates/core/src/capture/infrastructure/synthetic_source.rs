use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_source::CaptureSource;
use crate::shared::constants::{DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH};
use crate::shared::frame::FrameSnapshot;

const BACKGROUND: u8 = 16;
const FOREGROUND: u8 = 240;

/// Test-pattern source: a bright square sliding across a dark frame.
///
/// Frame contents are a pure function of the frame index. Availability is
/// shared through an atomic flag so a caller that has handed the source to
/// the pipeline can still simulate a feed that drops out or never starts.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    square: u32,
    step: u32,
    next_index: usize,
    available: Arc<AtomicBool>,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        let square = (width.min(height) / 4).max(1);
        Self {
            width,
            height,
            square,
            step: 4,
            next_index: 0,
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_square(mut self, square: u32, step: u32) -> Self {
        self.square = square.max(1);
        self.step = step;
        self
    }

    /// Handle that toggles whether the source currently has a frame.
    pub fn availability(&self) -> Arc<AtomicBool> {
        self.available.clone()
    }

    /// Top-left corner of the square in frame `index`.
    pub fn square_origin(&self, index: usize) -> (u32, u32) {
        let span_x = self.width.saturating_sub(self.square).max(1);
        let x = ((index as u64 * self.step as u64) % span_x as u64) as u32;
        let y = self.height.saturating_sub(self.square) / 2;
        (x, y)
    }

    pub fn square_size(&self) -> u32 {
        self.square
    }

    fn render(&self, index: usize) -> Vec<u8> {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut data = vec![BACKGROUND; w * h * 3];
        let (sx, sy) = self.square_origin(index);
        let x_end = (sx + self.square).min(self.width) as usize;
        let y_end = (sy + self.square).min(self.height) as usize;
        for row in sy as usize..y_end {
            let start = (row * w + sx as usize) * 3;
            let end = (row * w + x_end) * 3;
            data[start..end].fill(FOREGROUND);
        }
        data
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_WIDTH, DEFAULT_CAPTURE_HEIGHT)
    }
}

impl CaptureSource for SyntheticSource {
    fn current_frame_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn snapshot(&mut self) -> Result<FrameSnapshot, CaptureError> {
        if !self.current_frame_available() {
            return Err(CaptureError::NotReady);
        }
        let index = self.next_index;
        self.next_index += 1;
        Ok(FrameSnapshot::new(
            self.render(index),
            self.width,
            self.height,
            3,
            index,
        ))
    }
}
