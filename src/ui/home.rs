use iced::widget::{button, column, container, scrollable, text, Column};
use iced::{Alignment, Element, Length};

use swipewipe::PhotoStack;

use crate::Message;

/// Month list with an import button on top
pub fn view<'a>(stacks: &'a [PhotoStack], status: &'a str) -> Element<'a, Message> {
    let mut months = Column::new().spacing(8).width(Length::Fill);

    for (index, stack) in stacks.iter().enumerate() {
        let label = format!("{}  ({})", stack.label(), stack.len());
        months = months.push(
            button(text(label).size(24))
                .width(Length::Fill)
                .padding(16)
                .on_press_maybe((!stack.is_empty()).then_some(Message::OpenStack(index))),
        );
    }

    if stacks.is_empty() {
        months = months.push(text("No photos yet. Import a folder to get started.").size(16));
    }

    let content: Column<Message> = column![
        text("swipewipe").size(48),
        button("Import Folder")
            .on_press(Message::ImportFolder)
            .padding(10),
        text(status).size(16),
        scrollable(months).height(Length::Fill),
    ]
    .spacing(20)
    .padding(40)
    .max_width(640.0)
    .align_x(Alignment::Center);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}
