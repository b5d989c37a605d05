use image::{Rgba, RgbaImage};

use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::detection::BoundingBox;

pub const BOX_COLOR: Rgba<u8> = Rgba([0x00, 0xFF, 0xFF, 0xFF]);
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const LINE_WIDTH: i64 = 2;
const GLYPH_WIDTH: i64 = 8;
const TAG_PADDING: i64 = 8;
const TAG_HEIGHT: i64 = 20;

/// Transparent RGBA overlay meant to be composited over the live frame.
///
/// Boxes are stroked and a solid label tag is filled at each box origin.
/// Glyphs are not rasterized: captions are kept alongside the pixels for
/// whichever presenter draws text.
pub struct OverlaySurface {
    image: RgbaImage,
    annotations: Vec<(BoundingBox, String)>,
}

impl OverlaySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            annotations: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Boxes and captions drawn since the last clear, in draw order.
    pub fn annotations(&self) -> &[(BoundingBox, String)] {
        &self.annotations
    }

    pub fn is_blank(&self) -> bool {
        self.annotations.is_empty() && self.image.pixels().all(|p| p[3] == 0)
    }

    /// Rounds a box to whole pixels. Coordinates are clamped to a band a
    /// full surface wide around the image, which keeps everything visible
    /// unchanged and the edge arithmetic far from overflow.
    fn pixel_rect(&self, bounding_box: &BoundingBox) -> Option<[i64; 4]> {
        let BoundingBox {
            x,
            y,
            width,
            height,
        } = *bounding_box;
        if ![x, y, width, height].iter().all(|v| v.is_finite()) {
            return None;
        }
        let span = f64::from(self.image.width().max(self.image.height())) + TAG_HEIGHT as f64;
        let origin = |v: f64| v.clamp(-2.0 * span, 2.0 * span).round() as i64;
        let extent = |v: f64| v.clamp(0.0, 4.0 * span).round() as i64;
        Some([origin(x), origin(y), extent(width), extent(height)])
    }

    /// Fills `[x0, x1) x [y0, y1)`, clipped to the surface.
    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64) {
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        for y in y0.max(0)..y1.min(h) {
            for x in x0.max(0)..x1.min(w) {
                self.image.put_pixel(x as u32, y as u32, BOX_COLOR);
            }
        }
    }
}

impl RenderSurface for OverlaySurface {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = TRANSPARENT;
        }
        self.annotations.clear();
    }

    fn draw_box(&mut self, bounding_box: &BoundingBox, label: &str) {
        let Some([x, y, w, h]) = self.pixel_rect(bounding_box) else {
            log::debug!("Skipping box with non-finite coordinates: {bounding_box:?}");
            return;
        };

        if w > 0 && h > 0 {
            self.fill_rect(x, y, x + w, y + LINE_WIDTH);
            self.fill_rect(x, y + h - LINE_WIDTH, x + w, y + h);
            self.fill_rect(x, y, x + LINE_WIDTH, y + h);
            self.fill_rect(x + w - LINE_WIDTH, y, x + w, y + h);
        }

        let glyphs = i64::try_from(label.chars().count()).unwrap_or(i64::MAX);
        let tag_width = glyphs.saturating_mul(GLYPH_WIDTH).saturating_add(TAG_PADDING);
        self.fill_rect(x, y, x.saturating_add(tag_width), y + TAG_HEIGHT);

        self.annotations.push((*bounding_box, label.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn painted(surface: &OverlaySurface, x: u32, y: u32) -> bool {
        *surface.image().get_pixel(x, y) == BOX_COLOR
    }

    #[test]
    fn test_new_surface_is_blank() {
        let surface = OverlaySurface::new(32, 24);
        assert_eq!(surface.dimensions(), (32, 24));
        assert!(surface.is_blank());
    }

    #[test]
    fn test_draw_box_strokes_outline_and_tag() {
        let mut surface = OverlaySurface::new(100, 100);
        surface.draw_box(&BoundingBox::new(10.0, 40.0, 50.0, 30.0), "a");

        // tag: 1 glyph * 8 + 8 = 16 wide, 20 tall from the origin
        assert!(painted(&surface, 25, 45));
        assert!(!painted(&surface, 26, 45));
        // right edge and bottom edge
        assert!(painted(&surface, 59, 55));
        assert!(painted(&surface, 35, 69));
        // interior stays transparent
        assert!(!painted(&surface, 35, 62));
        // outside stays transparent
        assert!(!painted(&surface, 61, 55));
        assert_eq!(surface.annotations().len(), 1);
        assert_eq!(surface.annotations()[0].1, "a");
    }

    #[test]
    fn test_draw_box_clips_to_surface() {
        let mut surface = OverlaySurface::new(20, 20);
        surface.draw_box(&BoundingBox::new(-5.0, -5.0, 100.0, 100.0), "overflowing label");

        assert!(painted(&surface, 0, 0));
        assert!(!surface.is_blank());
    }

    #[rstest]
    #[case::infinite_x(f64::INFINITY, 0.0, 10.0, 10.0)]
    #[case::nan_width(0.0, 0.0, f64::NAN, 10.0)]
    #[case::negative_infinite_y(0.0, f64::NEG_INFINITY, 10.0, 10.0)]
    fn test_non_finite_box_is_skipped(
        #[case] x: f64,
        #[case] y: f64,
        #[case] width: f64,
        #[case] height: f64,
    ) {
        let mut surface = OverlaySurface::new(20, 20);
        surface.draw_box(&BoundingBox::new(x, y, width, height), "bad");

        assert!(surface.is_blank());
    }

    #[rstest]
    #[case::huge_origin(1e300, 1e300, 1e300, 1e300)]
    #[case::huge_extent(0.0, 0.0, f64::MAX, f64::MAX)]
    #[case::huge_negative_origin(-f64::MAX, -f64::MAX, 10.0, 10.0)]
    fn test_huge_box_is_clipped_without_overflow(
        #[case] x: f64,
        #[case] y: f64,
        #[case] width: f64,
        #[case] height: f64,
    ) {
        let mut surface = OverlaySurface::new(20, 20);
        surface.draw_box(&BoundingBox::new(x, y, width, height), "big");

        assert_eq!(surface.annotations().len(), 1);
    }

    #[test]
    fn test_box_spanning_past_both_edges_still_strokes_visible_part() {
        let mut surface = OverlaySurface::new(20, 20);
        surface.draw_box(&BoundingBox::new(-1e12, 5.0, 2e12, 10.0), "");

        assert!(painted(&surface, 10, 5), "top edge across the surface");
        assert!(!painted(&surface, 10, 10));
    }

    #[test]
    fn test_clear_wipes_pixels_and_annotations() {
        let mut surface = OverlaySurface::new(50, 50);
        surface.draw_box(&BoundingBox::new(5.0, 5.0, 20.0, 20.0), "x");

        surface.clear();

        assert!(surface.is_blank());
        assert!(surface.annotations().is_empty());
    }
}
