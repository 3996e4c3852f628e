use std::path::{Path, PathBuf};

use iced::widget::{button, column, container, row, text};
use iced::{Alignment, Element, Length, Theme};

use facelens_core::pipeline::recognize_image_use_case::RecognitionSummary;

use crate::app::Message;
use crate::theme::{muted_color, overlay_color, overlay_style};

#[derive(Default)]
pub struct RecognizeState {
    pub path: Option<PathBuf>,
    pub busy: bool,
    pub summary: Option<RecognitionSummary>,
}

pub fn view<'a>(state: &'a RecognizeState, theme: &Theme) -> Element<'a, Message> {
    let muted = muted_color(theme);

    let picker = row![
        button(text("Choose image\u{2026}"))
            .on_press(Message::PickRecognizeImage)
            .style(button::secondary)
            .padding([6, 14]),
        text(path_label(state.path.as_deref())).color(muted),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let action = button(text(if state.busy {
        "Recognizing\u{2026}"
    } else {
        "Recognize faces"
    }))
    .on_press_maybe((!state.busy).then_some(Message::Recognize))
    .style(button::primary)
    .padding([8, 18]);

    let mut content = column![
        text("Recognize faces in a photo").size(18),
        picker,
        text("or drop an image onto the window").size(12).color(muted),
        action,
    ]
    .spacing(12);

    if let Some(summary) = &state.summary {
        content = content.push(text(summary.message()).size(16));
        let style = overlay_style(theme);
        for (i, face) in summary.faces.iter().enumerate() {
            let loc = face.location;
            let card = column![
                text(format!("Face {}: {}", i + 1, face.name))
                    .color(overlay_color(style.color_for(face))),
                text(format!("Confidence: {:.1}%", face.confidence * 100.0)).size(12),
                text(format!(
                    "Location: ({}, {}, {}, {})",
                    loc.left, loc.top, loc.right, loc.bottom
                ))
                .size(12)
                .color(muted),
            ]
            .spacing(2);
            content = content.push(
                container(card)
                    .padding(10)
                    .width(Length::Fill)
                    .style(container::rounded_box),
            );
        }
    }

    content.into()
}

pub fn path_label(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "No image selected".to_string())
}
