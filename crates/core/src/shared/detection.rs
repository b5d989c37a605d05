use serde::{Deserialize, Serialize};

/// Axis-aligned box in surface pixel coordinates.
///
/// Serialized as the flat `[x, y, width, height]` array used on the worker
/// wire format.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// One object found by the detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "bbox")]
    pub bounding_box: BoundingBox,
    #[serde(rename = "class")]
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub score: f64,
}

impl Detection {
    pub fn new(bounding_box: BoundingBox, label: impl Into<String>, score: f64) -> Self {
        Self {
            bounding_box,
            label: label.into(),
            score,
        }
    }

    /// Scores below `threshold` are discarded; the boundary is inclusive.
    pub fn passes(&self, threshold: f64) -> bool {
        self.score >= threshold
    }

    /// Display label: class name and score as a rounded integer percentage.
    pub fn caption(&self) -> String {
        format!("{} ({}%)", self.label, (self.score * 100.0).round() as i64)
    }
}

/// Ordered detections produced for one dispatched frame.
pub type ResultSet = Vec<Detection>;
