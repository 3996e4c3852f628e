use iced::widget::{button, column, container, row, text};
use iced::{Alignment, Element, Length, Theme};

use facelens_core::ui::known_faces_list::KnownFacesList;

use crate::app::Message;
use crate::theme::muted_color;

pub fn view<'a>(list: &'a KnownFacesList, loading: bool, theme: &Theme) -> Element<'a, Message> {
    let header = row![
        text(format!("{} known face(s)", list.len()))
            .size(18)
            .width(Length::Fill),
        button(text(if loading { "Loading\u{2026}" } else { "Refresh" }))
            .on_press_maybe((!loading).then_some(Message::RefreshKnownFaces))
            .style(button::secondary)
            .padding([6, 14]),
    ]
    .align_y(Alignment::Center);

    if let Some(empty) = list.empty_message() {
        return column![header, text(empty).color(muted_color(theme))]
            .spacing(16)
            .into();
    }

    let rows: Vec<Element<'a, Message>> = list
        .rows()
        .iter()
        .map(|entry| {
            container(
                row![
                    text(entry.name.as_str()).width(Length::Fill),
                    button(text("Delete"))
                        .on_press(Message::KnownFace(entry.delete.clone()))
                        .style(button::danger)
                        .padding([4, 12]),
                ]
                .align_y(Alignment::Center),
            )
            .padding(10)
            .width(Length::Fill)
            .style(container::rounded_box)
            .into()
        })
        .collect();

    column![header, column(rows).spacing(6)]
        .spacing(16)
        .into()
}
