use std::fmt;

use ndarray::ArrayView3;

/// Callback run exactly once when a snapshot's pixel buffer is released.
pub type ReleaseHook = Box<dyn FnOnce() + Send>;

/// A single still image captured from a live source: contiguous RGB bytes
/// in row-major order.
///
/// A snapshot is deliberately not `Clone`. It is moved from the dispatch
/// loop into the detection worker, and whoever holds it last releases it
/// when it is dropped, on every exit path.
pub struct FrameSnapshot {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    on_release: Option<ReleaseHook>,
}

impl FrameSnapshot {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            on_release: None,
        }
    }

    /// Attaches a hook that runs when the snapshot is released.
    pub fn with_release_hook(mut self, hook: ReleaseHook) -> Self {
        self.on_release = Some(hook);
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Capture sequence number assigned by the source.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

impl Drop for FrameSnapshot {
    fn drop(&mut self) {
        self.data = Vec::new();
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl fmt::Debug for FrameSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSnapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
