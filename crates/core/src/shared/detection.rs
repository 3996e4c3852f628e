use serde::{Deserialize, Serialize};

/// Name the recognition service assigns to faces it could not match.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Pixel offsets of a face in the coordinate space of the submitted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    /// Clips the box to a `width` x `height` surface.
    ///
    /// Returns `(x0, y0, x1, y1)` with inclusive corners, or `None` when
    /// nothing of the box is visible.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if width == 0 || height == 0 {
            return None;
        }
        let max_x = width as i32 - 1;
        let max_y = height as i32 - 1;
        let x0 = self.left.max(0);
        let y0 = self.top.max(0);
        let x1 = self.right.min(max_x);
        let y1 = self.bottom.min(max_y);
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// One face reported by the recognition service for one submitted frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub name: String,
    pub confidence: f64,
    pub location: BoundingBox,
}

impl Detection {
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_NAME
    }

    /// Overlay caption, e.g. `"Alice 93.0%"`.
    pub fn label(&self) -> String {
        format!("{} {:.1}%", self.name, self.confidence * 100.0)
    }
}
