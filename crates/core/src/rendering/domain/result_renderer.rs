use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::constants::DEFAULT_SCORE_THRESHOLD;
use crate::shared::detection::Detection;

/// Paints result sets onto a [`RenderSurface`].
///
/// Every render is a full overwrite: clear, then draw the detections that
/// pass the score threshold. While inactive (loop stopped) renders are
/// discarded so late results never reach the surface.
pub struct ResultRenderer {
    threshold: f64,
    active: bool,
}

impl ResultRenderer {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            active: false,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Returns how many detections were drawn, or `None` if inactive.
    pub fn render(
        &self,
        surface: &mut dyn RenderSurface,
        detections: &[Detection],
    ) -> Option<usize> {
        if !self.active {
            return None;
        }
        surface.clear();
        let mut drawn = 0;
        for detection in detections.iter().filter(|d| d.passes(self.threshold)) {
            surface.draw_box(&detection.bounding_box, &detection.caption());
            drawn += 1;
        }
        Some(drawn)
    }

    pub fn clear(&self, surface: &mut dyn RenderSurface) {
        surface.clear();
    }
}

impl Default for ResultRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_THRESHOLD)
    }
}
