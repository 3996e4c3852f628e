use crate::annotation::domain::drawing_surface::{DrawingSurface, Rgb};
use crate::shared::detection::Detection;

pub const KNOWN_FACE_COLOR: Rgb = [0, 255, 0];
pub const UNKNOWN_FACE_COLOR: Rgb = [255, 0, 0];

/// Colors used to tell matched faces apart from unmatched ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayStyle {
    pub known: Rgb,
    pub unknown: Rgb,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            known: KNOWN_FACE_COLOR,
            unknown: UNKNOWN_FACE_COLOR,
        }
    }
}

impl OverlayStyle {
    pub fn color_for(&self, detection: &Detection) -> Rgb {
        if detection.is_unknown() {
            self.unknown
        } else {
            self.known
        }
    }
}

/// Draws one labelled box per detection. An empty slice draws nothing.
pub fn draw_detections(
    surface: &mut dyn DrawingSurface,
    detections: &[Detection],
    style: &OverlayStyle,
) {
    for detection in detections {
        surface.draw_box(
            &detection.location,
            style.color_for(detection),
            &detection.label(),
        );
    }
}
