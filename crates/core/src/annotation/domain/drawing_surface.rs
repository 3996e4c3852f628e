use crate::shared::detection::BoundingBox;
use crate::shared::frame::Frame;

pub type Rgb = [u8; 3];

/// The visible canvas the annotator paints on.
///
/// Owned by the UI; the annotator only holds a weak reference while a
/// capture session is running.
pub trait DrawingSurface: Send {
    /// Replaces the whole surface with `frame`, wiping earlier overlays.
    fn draw_frame(&mut self, frame: &Frame);

    /// Outlines `location` and attaches `label` to it.
    fn draw_box(&mut self, location: &BoundingBox, color: Rgb, label: &str);

    fn clear(&mut self);

    fn set_visible(&mut self, visible: bool);
}
