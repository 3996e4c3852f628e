use std::sync::{Arc, Mutex};

use iced::widget::{button, canvas, column, container, image, row, stack, text};
use iced::{Alignment, Element, Length, Theme};

use facelens_core::annotation::infrastructure::rgb_canvas::{OverlayLabel, RgbCanvas};
use facelens_core::pipeline::live_frame_annotator::LiveFrameAnnotator;

use crate::app::Message;
use crate::theme::muted_color;
use crate::widgets::label_overlay::LabelOverlay;

/// The annotator and the canvas it paints on. The canvas is owned here;
/// the annotator only holds a weak handle to it.
pub struct WebcamState {
    pub canvas: Arc<Mutex<RgbCanvas>>,
    pub annotator: Option<LiveFrameAnnotator>,
    /// Last recognition failure shown, so repeats are not toasted every frame.
    pub last_failure: Option<String>,
    frame: Option<image::Handle>,
    frame_size: (u32, u32),
    labels: Vec<OverlayLabel>,
    revision: u64,
}

impl WebcamState {
    pub fn new() -> Self {
        Self {
            canvas: Arc::new(Mutex::new(RgbCanvas::new())),
            annotator: None,
            last_failure: None,
            frame: None,
            frame_size: (0, 0),
            labels: Vec::new(),
            revision: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.annotator.as_ref().is_some_and(|a| a.is_running())
    }

    /// Drops the annotator (stopping it) so the next start picks up new settings.
    pub fn release(&mut self) {
        self.annotator = None;
        self.sync_canvas();
    }

    /// Copies the canvas into an image handle when it has changed.
    pub fn sync_canvas(&mut self) {
        let Ok(canvas) = self.canvas.lock() else {
            return;
        };
        if canvas.revision() == self.revision {
            return;
        }
        self.revision = canvas.revision();
        self.labels = canvas.labels().to_vec();
        self.frame = match canvas.to_rgba() {
            Some((w, h, rgba)) if canvas.is_visible() => {
                self.frame_size = (w, h);
                Some(image::Handle::from_rgba(w, h, rgba))
            }
            _ => None,
        };
    }
}

pub fn view<'a>(state: &'a WebcamState, theme: &Theme) -> Element<'a, Message> {
    let muted = muted_color(theme);
    let running = state.is_running();

    let controls = row![
        button(text("Start webcam"))
            .on_press_maybe((!running).then_some(Message::StartWebcam))
            .style(button::primary)
            .padding([8, 18]),
        button(text("Stop webcam"))
            .on_press_maybe(running.then_some(Message::StopWebcam))
            .style(button::secondary)
            .padding([8, 18]),
        text(status_line(state)).size(12).color(muted),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let preview: Element<'a, Message> = match &state.frame {
        Some(handle) => stack![
            image(handle.clone()).width(Length::Fill),
            canvas(LabelOverlay::new(&state.labels, state.frame_size))
                .width(Length::Fill)
                .height(Length::Fill),
        ]
        .into(),
        None => container(text("Camera is off").color(muted))
            .width(Length::Fill)
            .height(360)
            .center_x(Length::Fill)
            .center_y(360)
            .style(container::rounded_box)
            .into(),
    };

    column![controls, preview].spacing(12).into()
}

fn status_line(state: &WebcamState) -> String {
    match &state.annotator {
        Some(annotator) if annotator.is_running() => format!(
            "Frame {}, {} request(s) in flight, sampling every {} frame(s)",
            annotator.frame_count(),
            annotator.in_flight(),
            annotator.config().sample_interval
        ),
        _ => "Stopped".to_string(),
    }
}
