use crate::shared::detection::BoundingBox;

/// Domain interface for the overlay detections are painted on.
///
/// The surface has the same pixel dimensions as the capture source.
pub trait RenderSurface: Send {
    fn dimensions(&self) -> (u32, u32);

    /// Wipes the whole surface to transparent.
    fn clear(&mut self);

    fn draw_box(&mut self, bounding_box: &BoundingBox, label: &str);
}
