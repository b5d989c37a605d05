use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::domain::capture_error::{CaptureError, CaptureSetupError};
use crate::capture::domain::capture_source::CaptureSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::FrameSnapshot;

/// Replays a directory of still images as a live source, looping forever.
///
/// Files are played in name order. Each snapshot decodes the next file, so
/// a file that disappears, is corrupted, or differs in size from the first
/// frame only costs that frame.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    next_index: usize,
    width: u32,
    height: u32,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self, CaptureSetupError> {
        let entries =
            fs::read_dir(dir).map_err(|e| CaptureSetupError::from_io(dir.to_path_buf(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CaptureSetupError::from_io(dir.to_path_buf(), e))?;
            let path = entry.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let first = paths.first().ok_or_else(|| {
            CaptureSetupError::Unsupported(format!("no image files in {}", dir.display()))
        })?;
        let (width, height) =
            image::image_dimensions(first).map_err(|source| CaptureSetupError::Decode {
                path: first.clone(),
                source,
            })?;
        if width == 0 || height == 0 {
            return Err(CaptureSetupError::InvalidDimensions { width, height });
        }

        log::info!(
            "Opened image sequence {} ({} frames, {width}x{height})",
            dir.display(),
            paths.len()
        );

        Ok(Self {
            paths,
            cursor: 0,
            next_index: 0,
            width,
            height,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl CaptureSource for ImageSequenceSource {
    fn current_frame_available(&self) -> bool {
        !self.paths.is_empty()
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn snapshot(&mut self) -> Result<FrameSnapshot, CaptureError> {
        if self.paths.is_empty() {
            return Err(CaptureError::NotReady);
        }
        let path = &self.paths[self.cursor];
        self.cursor = (self.cursor + 1) % self.paths.len();

        let img = image::open(path)
            .map_err(|source| CaptureError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();
        let (w, h) = img.dimensions();
        if (w, h) != (self.width, self.height) {
            return Err(CaptureError::SizeMismatch {
                path: path.clone(),
                width: self.width,
                height: self.height,
                actual_width: w,
                actual_height: h,
            });
        }

        let index = self.next_index;
        self.next_index += 1;
        Ok(FrameSnapshot::new(img.into_raw(), w, h, 3, index))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
