use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Message shown when the source could not be opened for permission or
/// device reasons, where the underlying error text is rarely actionable.
pub const ACCESS_GUIDANCE_MESSAGE: &str =
    "Initialization failed. Check camera access permissions or reconnect the device, then try again.";

/// Per-frame capture failure. Never fatal to the loop.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no decodable frame available")]
    NotReady,
    #[error("failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("frame {path} is {actual_width}x{actual_height}, source is {width}x{height}")]
    SizeMismatch {
        path: PathBuf,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Failure to bring a capture source up at startup. Aborts startup.
#[derive(Error, Debug)]
pub enum CaptureSetupError {
    #[error("permission denied opening capture source {0}")]
    PermissionDenied(PathBuf),
    #[error("capture device not found: {0}")]
    DeviceNotFound(PathBuf),
    #[error("invalid video size detected: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("capture source contains no usable frames: {0}")]
    Unsupported(String),
    #[error("failed to open capture source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode first frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl CaptureSetupError {
    /// Classifies an I/O error raised while opening `path`.
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            io::ErrorKind::NotFound => Self::DeviceNotFound(path),
            _ => Self::Io { path, source },
        }
    }

    /// Permission and device problems, as opposed to generic failures.
    pub fn is_access_error(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::DeviceNotFound(_))
    }
}

/// User-facing text for a startup failure.
pub fn startup_failure_message(error: &CaptureSetupError) -> String {
    if error.is_access_error() {
        ACCESS_GUIDANCE_MESSAGE.to_string()
    } else {
        error.to_string()
    }
}
