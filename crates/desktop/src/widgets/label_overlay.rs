use iced::widget::canvas::{self, Frame, Text};
use iced::{mouse, Color, Pixels, Point, Rectangle, Renderer, Size, Theme};

use facelens_core::annotation::domain::drawing_surface::Rgb;
use facelens_core::annotation::infrastructure::rgb_canvas::OverlayLabel;

const MIN_FONT_SIZE: f32 = 9.0;
const FONT_TO_STRIP: f32 = 0.7;

/// How a frame of `width` x `height` pixels maps onto the widget bounds
/// when shown with `ContentFit::Contain` and centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFit {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
}

impl FrameFit {
    pub fn contain(frame: (u32, u32), bounds: Size) -> Option<Self> {
        let (width, height) = frame;
        if width == 0 || height == 0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
            return None;
        }
        let scale = (bounds.width / width as f32).min(bounds.height / height as f32);
        Some(Self {
            scale,
            offset_x: (bounds.width - width as f32 * scale) / 2.0,
            offset_y: (bounds.height - height as f32 * scale) / 2.0,
        })
    }

    /// Frame pixel to widget-local point.
    pub fn map(&self, x: u32, y: u32) -> Point {
        Point::new(
            self.offset_x + x as f32 * self.scale,
            self.offset_y + y as f32 * self.scale,
        )
    }

    pub fn font_size(&self, strip_height: u32) -> f32 {
        (strip_height as f32 * self.scale * FONT_TO_STRIP).max(MIN_FONT_SIZE)
    }
}

/// Black on light strips, white on dark ones.
pub fn text_color_on(strip: Rgb) -> Color {
    let [r, g, b] = strip.map(f32::from);
    let luminance = (0.299 * r + 0.587 * g + 0.114 * b) / 255.0;
    if luminance > 0.5 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}

/// Writes each box caption into its label strip, on top of the frame image.
pub struct LabelOverlay<'a> {
    labels: &'a [OverlayLabel],
    frame_size: (u32, u32),
}

impl<'a> LabelOverlay<'a> {
    pub fn new(labels: &'a [OverlayLabel], frame_size: (u32, u32)) -> Self {
        Self { labels, frame_size }
    }
}

impl<Message> canvas::Program<Message> for LabelOverlay<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let Some(fit) = FrameFit::contain(self.frame_size, bounds.size()) else {
            return vec![frame.into_geometry()];
        };

        for label in self.labels {
            let size = fit.font_size(label.height);
            let (x, y) = label.text_origin();
            let anchor = fit.map(x, y);
            frame.fill_text(Text {
                content: label.text.clone(),
                position: Point::new(anchor.x, anchor.y - size / 2.0),
                color: text_color_on(label.color),
                size: Pixels(size),
                ..Text::default()
            });
        }
        vec![frame.into_geometry()]
    }
}
