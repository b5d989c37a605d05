use ndarray::Axis;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::detection::{BoundingBox, Detection, ResultSet};
use crate::shared::frame::FrameSnapshot;

pub const DEFAULT_LUMA_THRESHOLD: u8 = 200;
pub const LABEL: &str = "bright";

/// Model-free detector reporting the bounding box of bright pixels.
///
/// Stands in for a real model when wiring the pipeline end to end. The score
/// is the fraction of the box covered by bright pixels, so a solid blob
/// scores 1.0 and scattered noise scores low.
pub struct LuminanceDetector {
    threshold: u8,
    loaded: bool,
}

impl LuminanceDetector {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            loaded: false,
        }
    }
}

impl Default for LuminanceDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LUMA_THRESHOLD)
    }
}

impl ObjectDetector for LuminanceDetector {
    fn load(&mut self, backend: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
        match backend {
            None | Some("cpu") => {
                self.loaded = true;
                Ok(())
            }
            Some(other) => Err(format!("unsupported backend: {other}").into()),
        }
    }

    fn detect(&mut self, frame: &FrameSnapshot) -> Result<ResultSet, Box<dyn std::error::Error>> {
        if !self.loaded {
            return Err("detector not loaded".into());
        }
        if frame.channels() < 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }

        let pixels = frame.as_ndarray();
        let mut min = (usize::MAX, usize::MAX);
        let mut max = (0usize, 0usize);
        let mut hits = 0usize;

        for (y, row) in pixels.axis_iter(Axis(0)).enumerate() {
            for (x, px) in row.axis_iter(Axis(0)).enumerate() {
                if luma(px[0], px[1], px[2]) >= self.threshold {
                    hits += 1;
                    min = (min.0.min(x), min.1.min(y));
                    max = (max.0.max(x), max.1.max(y));
                }
            }
        }

        if hits == 0 {
            return Ok(Vec::new());
        }

        let width = (max.0 - min.0 + 1) as f64;
        let height = (max.1 - min.1 + 1) as f64;
        let score = (hits as f64 / (width * height)).min(1.0);
        Ok(vec![Detection::new(
            BoundingBox::new(min.0 as f64, min.1 as f64, width, height),
            LABEL,
            score,
        )])
    }
}

/// Rec. 601 luma.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}
