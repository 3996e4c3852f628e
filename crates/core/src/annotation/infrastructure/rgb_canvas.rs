use std::path::Path;

use image::{Rgb as Pixel, RgbImage};

use crate::annotation::domain::drawing_surface::{DrawingSurface, Rgb};
use crate::shared::detection::BoundingBox;
use crate::shared::frame::Frame;

const LINE_WIDTH: u32 = 2;
const LABEL_STRIP_HEIGHT: u32 = 20;
const LABEL_INSET: u32 = 6;

/// Caption attached to a drawn box.
///
/// The canvas fills the strip at the bottom of the box; presenters with
/// fonts write `text` into the strip, which spans `x..x + width` and
/// `y..y + height` in frame pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLabel {
    pub text: String,
    pub color: Rgb,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl OverlayLabel {
    /// Where the text starts: inset from the strip's left edge, vertically
    /// centred.
    pub fn text_origin(&self) -> (u32, u32) {
        (
            self.x + LABEL_INSET.min(self.width / 2),
            self.y + self.height / 2,
        )
    }
}

/// In-memory RGB drawing surface backed by the `image` crate.
///
/// Boxes are rasterized as 2px outlines with a filled label strip along
/// their bottom edge. `revision` increases on every mutation so presenters
/// can skip re-uploading unchanged pixels.
#[derive(Default)]
pub struct RgbCanvas {
    image: Option<RgbImage>,
    labels: Vec<OverlayLabel>,
    visible: bool,
    revision: u64,
}

impl RgbCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn labels(&self) -> &[OverlayLabel] {
        &self.labels
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| img.dimensions())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        let img = self.image.as_ref()?;
        if x >= img.width() || y >= img.height() {
            return None;
        }
        Some(img.get_pixel(x, y).0)
    }

    /// Current pixels as `(width, height, rgba)` for GPU-backed image widgets.
    pub fn to_rgba(&self) -> Option<(u32, u32, Vec<u8>)> {
        let img = self.image.as_ref()?;
        let mut rgba = Vec::with_capacity(img.as_raw().len() / 3 * 4);
        for px in img.pixels() {
            rgba.extend_from_slice(&[px.0[0], px.0[1], px.0[2], 255]);
        }
        Some((img.width(), img.height(), rgba))
    }

    /// Writes the current pixels to an image file (format from extension).
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let img = self.image.as_ref().ok_or("Nothing drawn on the canvas yet")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        img.save(path)?;
        Ok(())
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl DrawingSurface for RgbCanvas {
    fn draw_frame(&mut self, frame: &Frame) {
        self.image = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec());
        if self.image.is_none() {
            log::warn!(
                "Frame {} has inconsistent dimensions, canvas cleared",
                frame.index()
            );
        }
        self.labels.clear();
        self.touch();
    }

    fn draw_box(&mut self, location: &BoundingBox, color: Rgb, label: &str) {
        let Some(img) = self.image.as_mut() else {
            return;
        };
        let Some((x0, y0, x1, y1)) = location.clamp_to(img.width(), img.height()) else {
            return;
        };
        let pixel = Pixel(color);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let on_edge = x < x0 + LINE_WIDTH
                    || x + LINE_WIDTH > x1
                    || y < y0 + LINE_WIDTH
                    || y + LINE_WIDTH > y1;
                let in_strip = y + LABEL_STRIP_HEIGHT > y1;
                if on_edge || in_strip {
                    img.put_pixel(x, y, pixel);
                }
            }
        }

        let strip_top = (y1 + 1).saturating_sub(LABEL_STRIP_HEIGHT).max(y0);
        self.labels.push(OverlayLabel {
            text: label.to_string(),
            color,
            x: x0,
            y: strip_top,
            width: x1 - x0 + 1,
            height: y1 - strip_top + 1,
        });
        self.touch();
    }

    fn clear(&mut self) {
        self.image = None;
        self.labels.clear();
        self.touch();
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Rgb = [0, 255, 0];
    const GRAY: Rgb = [90, 90, 90];

    fn canvas_with_frame() -> RgbCanvas {
        let mut canvas = RgbCanvas::new();
        canvas.draw_frame(&Frame::solid(640, 480, GRAY, 0));
        canvas
    }

    #[test]
    fn test_draw_frame_copies_pixels() {
        let canvas = canvas_with_frame();
        assert_eq!(canvas.dimensions(), Some((640, 480)));
        assert_eq!(canvas.pixel(320, 240), Some(GRAY));
    }

    #[test]
    fn test_box_outline_at_corners() {
        let mut canvas = canvas_with_frame();
        canvas.draw_box(&BoundingBox::new(10, 10, 100, 120), GREEN, "Alice 93.0%");

        assert_eq!(canvas.pixel(10, 10), Some(GREEN));
        assert_eq!(canvas.pixel(100, 10), Some(GREEN));
        assert_eq!(canvas.pixel(10, 120), Some(GREEN));
        assert_eq!(canvas.pixel(100, 120), Some(GREEN));
        // interior above the label strip is untouched
        assert_eq!(canvas.pixel(55, 60), Some(GRAY));
        // outside the box is untouched
        assert_eq!(canvas.pixel(9, 9), Some(GRAY));
        assert_eq!(canvas.pixel(101, 60), Some(GRAY));
    }

    #[test]
    fn test_label_strip_is_filled() {
        let mut canvas = canvas_with_frame();
        canvas.draw_box(&BoundingBox::new(10, 10, 100, 120), GREEN, "Alice 93.0%");
        assert_eq!(canvas.pixel(55, 110), Some(GREEN));
        assert_eq!(canvas.labels().len(), 1);
        assert_eq!(canvas.labels()[0].text, "Alice 93.0%");
        assert_eq!(canvas.labels()[0].color, GREEN);
    }

    #[test]
    fn test_label_sits_inside_its_box_strip() {
        let mut canvas = canvas_with_frame();
        canvas.draw_box(&BoundingBox::new(10, 10, 100, 120), GREEN, "Alice 93.0%");
        canvas.draw_box(&BoundingBox::new(300, 200, 420, 330), GREEN, "Bob 81.0%");

        let alice = &canvas.labels()[0];
        assert_eq!((alice.x, alice.y, alice.width, alice.height), (10, 101, 91, 20));
        let (tx, ty) = alice.text_origin();
        assert!((10..=100).contains(&tx));
        assert!((101..=120).contains(&ty));
        assert_eq!(canvas.pixel(tx, ty), Some(GREEN));

        let (tx, ty) = canvas.labels()[1].text_origin();
        assert!((300..=420).contains(&tx));
        assert!((311..=330).contains(&ty));
    }

    #[test]
    fn test_short_box_strip_is_clipped_to_box() {
        let mut canvas = canvas_with_frame();
        canvas.draw_box(&BoundingBox::new(10, 10, 30, 18), GREEN, "Tiny");
        let label = &canvas.labels()[0];
        assert_eq!((label.y, label.height), (10, 9));
        let (tx, ty) = label.text_origin();
        assert!((10..=30).contains(&tx));
        assert!((10..=18).contains(&ty));
    }

    #[test]
    fn test_redrawing_frame_wipes_overlay() {
        let mut canvas = canvas_with_frame();
        canvas.draw_box(&BoundingBox::new(10, 10, 100, 120), GREEN, "Alice 93.0%");
        canvas.draw_frame(&Frame::solid(640, 480, GRAY, 1));

        assert_eq!(canvas.pixel(10, 10), Some(GRAY));
        assert!(canvas.labels().is_empty());
    }

    #[test]
    fn test_box_outside_canvas_is_ignored() {
        let mut canvas = canvas_with_frame();
        let before = canvas.revision();
        canvas.draw_box(&BoundingBox::new(700, 500, 800, 600), GREEN, "Far");
        assert!(canvas.labels().is_empty());
        assert_eq!(canvas.revision(), before);
    }

    #[test]
    fn test_box_before_any_frame_is_ignored() {
        let mut canvas = RgbCanvas::new();
        canvas.draw_box(&BoundingBox::new(0, 0, 10, 10), GREEN, "x");
        assert!(canvas.labels().is_empty());
        assert!(canvas.dimensions().is_none());
    }

    #[test]
    fn test_clear_drops_image_and_labels() {
        let mut canvas = canvas_with_frame();
        canvas.draw_box(&BoundingBox::new(10, 10, 100, 120), GREEN, "Alice 93.0%");
        canvas.clear();
        assert!(canvas.dimensions().is_none());
        assert!(canvas.labels().is_empty());
    }

    #[test]
    fn test_revision_increases_on_mutation() {
        let mut canvas = RgbCanvas::new();
        let r0 = canvas.revision();
        canvas.set_visible(true);
        assert!(canvas.revision() > r0);
        assert!(canvas.is_visible());
    }

    #[test]
    fn test_to_rgba_adds_opaque_alpha() {
        let mut canvas = RgbCanvas::new();
        canvas.draw_frame(&Frame::solid(2, 1, [1, 2, 3], 0));
        let (w, h, rgba) = canvas.to_rgba().unwrap();
        assert_eq!((w, h), (2, 1));
        assert_eq!(rgba, vec![1, 2, 3, 255, 1, 2, 3, 255]);
    }

    #[test]
    fn test_save_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snaps").join("frame.png");
        let mut canvas = RgbCanvas::new();
        canvas.draw_frame(&Frame::solid(20, 10, [50, 100, 200], 0));
        canvas.save(&path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_save_without_image_errors() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = RgbCanvas::new();
        assert!(canvas.save(&dir.path().join("empty.png")).is_err());
    }
}
