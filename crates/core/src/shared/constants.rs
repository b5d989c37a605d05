/// Detections scoring below this are not drawn.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

/// Run detection on every Nth tick.
pub const DEFAULT_FRAME_SKIP: u64 = 2;

/// Minimum spacing between two published rate readings.
pub const DEFAULT_RATE_UPDATE_INTERVAL_MS: f64 = 1000.0;

/// Fixed-interval stand-in for the display refresh (~60 Hz).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Unacknowledged `detect` requests admitted before frames are dropped.
pub const DEFAULT_MAX_PENDING_DETECTIONS: usize = 1;

pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
