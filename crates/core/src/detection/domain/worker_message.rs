use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shared::detection::ResultSet;
use crate::shared::frame::FrameSnapshot;

/// Loop → worker messages.
#[derive(Debug)]
pub enum WorkerRequest {
    Init { backend: Option<String> },
    /// Ownership of the frame moves to the worker with the message.
    Detect(FrameSnapshot),
}

impl WorkerRequest {
    /// Wire-format rendering for logs. Pixel data is summarized, never
    /// copied.
    pub fn to_wire(&self) -> Value {
        match self {
            WorkerRequest::Init { backend } => json!({"type": "init", "backend": backend}),
            WorkerRequest::Detect(frame) => json!({
                "type": "detect",
                "frame": {
                    "index": frame.index(),
                    "width": frame.width(),
                    "height": frame.height()
                }
            }),
        }
    }
}

/// Worker → loop messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerEvent {
    /// The model is loaded; `detect` will be accepted from now on.
    Ready,
    Result { detections: ResultSet },
    /// Unrecoverable worker-level failure, e.g. a failed init round.
    Error { message: String },
}

impl WorkerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        WorkerEvent::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"unserializable\":\"{e}\"}}"))
    }
}
