use crate::detection::domain::worker_message::WorkerEvent;
use crate::shared::frame::FrameSnapshot;

/// What happened to a frame handed to [`WorkerChannel::detect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Accepted; a `Result` may follow.
    Queued,
    /// The in-flight limit is reached. The frame was released unprocessed.
    Busy,
    /// The worker is gone. The frame was released unprocessed.
    Closed,
}

/// Asynchronous, message-only boundary to the detector.
///
/// Nothing here blocks on inference. Events come back in the order the
/// worker emitted them and are pulled by the loop at tick boundaries.
pub trait WorkerChannel: Send {
    /// Starts an init round. Returns `false` when the worker is gone.
    fn init(&mut self, backend: Option<&str>) -> bool;

    /// Hands `frame` over to the worker. Fire-and-forget.
    fn detect(&mut self, frame: FrameSnapshot) -> SendOutcome;

    /// Next pending event, if any. Never blocks.
    fn try_next_event(&mut self) -> Option<WorkerEvent>;

    /// Number of `detect` requests not yet acknowledged by the worker.
    fn pending(&self) -> usize;

    /// Stops the worker and waits for it to exit. Default: no-op.
    fn shutdown(&mut self) {}
}
