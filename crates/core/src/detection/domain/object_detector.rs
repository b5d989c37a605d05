use crate::shared::detection::ResultSet;
use crate::shared::frame::FrameSnapshot;

/// Domain interface for the opaque inference model.
///
/// Implementations may be stateful, hence `&mut self`. Both calls run on
/// the detection worker thread, never on the dispatch loop.
pub trait ObjectDetector: Send {
    /// Prepares the model. `backend` is an optional hint (e.g. `"cpu"`).
    fn load(&mut self, backend: Option<&str>) -> Result<(), Box<dyn std::error::Error>>;

    fn detect(&mut self, frame: &FrameSnapshot) -> Result<ResultSet, Box<dyn std::error::Error>>;
}
