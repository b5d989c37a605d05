use crate::capture::domain::capture_error::CaptureError;
use crate::shared::frame::FrameSnapshot;

/// A live, continuously updating image source.
///
/// The pipeline never owns how the source was acquired; it only polls it
/// once per tick and pulls a snapshot on dispatch ticks.
pub trait CaptureSource: Send {
    /// Whether a decodable frame exists right now.
    fn current_frame_available(&self) -> bool;

    /// Current frame size as `(width, height)`. May be `(0, 0)` before the
    /// source has negotiated a format.
    fn dimensions(&self) -> (u32, u32);

    /// Extracts a still copy of the current frame.
    ///
    /// Failure is transient: the caller skips this frame and tries again on
    /// a later tick.
    fn snapshot(&mut self) -> Result<FrameSnapshot, CaptureError>;
}
