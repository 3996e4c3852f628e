use std::path::PathBuf;

use iced::widget::{button, column, row, text, text_input};
use iced::{Alignment, Element, Theme};

use crate::app::Message;
use crate::tabs::recognize_tab::path_label;
use crate::theme::muted_color;

#[derive(Default)]
pub struct AddFaceState {
    pub name: String,
    pub path: Option<PathBuf>,
    pub busy: bool,
}

impl AddFaceState {
    pub fn reset(&mut self) {
        self.name.clear();
        self.path = None;
    }
}

pub fn view<'a>(state: &'a AddFaceState, theme: &Theme) -> Element<'a, Message> {
    let muted = muted_color(theme);

    let name = text_input("Person name", &state.name)
        .on_input(Message::AddNameChanged)
        .on_submit(Message::AddFace)
        .padding(8);

    let picker = row![
        button(text("Choose image\u{2026}"))
            .on_press(Message::PickAddImage)
            .style(button::secondary)
            .padding([6, 14]),
        text(path_label(state.path.as_deref())).color(muted),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let action = button(text(if state.busy { "Adding\u{2026}" } else { "Add face" }))
        .on_press_maybe((!state.busy).then_some(Message::AddFace))
        .style(button::primary)
        .padding([8, 18]);

    column![
        text("Register a known face").size(18),
        text("Use a clear photo with exactly one face.")
            .size(12)
            .color(muted),
        name,
        picker,
        action,
    ]
    .spacing(12)
    .into()
}
