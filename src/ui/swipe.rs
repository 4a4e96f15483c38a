use iced::widget::{
    button, column, container, horizontal_space, image, mouse_area, row, stack, text, Column,
};
use iced::{Alignment, Color, ContentFit, Element, Length, Padding, Theme};

use swipewipe::state::config::GestureConfig;
use swipewipe::swipe::gesture::hint;
use swipewipe::swipe::{Decision, Phase};
use swipewipe::AssetRef;

use crate::{ActiveSession, Message};

const KEEP_COLOR: Color = Color::from_rgb(0.2, 0.75, 0.35);
const DELETE_COLOR: Color = Color::from_rgb(0.9, 0.25, 0.25);
const PLACEHOLDER_COLOR: Color = Color::from_rgb(0.35, 0.35, 0.35);

/// Swipe deck for one month stack
pub fn view<'a>(active: &'a ActiveSession, gesture: &GestureConfig) -> Element<'a, Message> {
    let lifecycle = &active.lifecycle;
    let snapshot = lifecycle.snapshot();

    let header = row![
        button(text("←").size(24)).on_press(Message::Back),
        text(snapshot.label.clone()).size(28),
        horizontal_space(),
        text(snapshot.position()).size(18),
    ]
    .spacing(16)
    .align_y(Alignment::Center);

    let body: Element<'a, Message> = if let Some(result) = lifecycle.result().filter(|_| !lifecycle.is_committing()) {
        let mut done = Column::new()
            .spacing(12)
            .align_x(Alignment::Center)
            .push(text(format!("Deleted {} photos!", result.succeeded)).size(40));
        if result.failed > 0 {
            done = done.push(
                text(format!("{} photos could not be deleted", result.failed))
                    .size(18)
                    .color(DELETE_COLOR),
            );
        }
        centered(done)
    } else if lifecycle.is_committing() {
        centered(text(format!("Deleting {} photos...", snapshot.pending)).size(24))
    } else if lifecycle.awaiting_confirmation() {
        centered(
            button(text(format!("All done! Tap to delete {} photos", snapshot.pending)).size(28))
                .padding(20)
                .on_press(Message::ConfirmCommit),
        )
    } else if snapshot.phase == Phase::Browsing {
        deck(active, snapshot.current, snapshot.upcoming, gesture)
    } else {
        centered(text("Finishing up...").size(24))
    };

    let counters = row![
        counter("DELETE", snapshot.delete_count, DELETE_COLOR),
        horizontal_space(),
        counter("KEEP", snapshot.keep_count, KEEP_COLOR),
    ]
    .align_y(Alignment::Center);

    let accepts_input = lifecycle.session().accepts_decisions();
    let controls = row![
        button(text("Delete").size(20))
            .padding([10, 24])
            .on_press_maybe(accepts_input.then_some(Message::Decide(Decision::Delete))),
        horizontal_space(),
        button(text("Keep").size(20))
            .padding([10, 24])
            .on_press_maybe(accepts_input.then_some(Message::Decide(Decision::Keep))),
    ];

    let content: Column<Message> = column![header, body, counters, controls]
        .spacing(20)
        .padding(30)
        .max_width(720.0);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}

/// The top card, draggable, over the card underneath.
fn deck<'a>(
    active: &'a ActiveSession,
    current: Option<AssetRef>,
    upcoming: Option<AssetRef>,
    gesture: &GestureConfig,
) -> Element<'a, Message> {
    // A card that is leaving is already off the deck
    let (top, beneath, offset) = if active.lifecycle.in_flight().is_some() {
        (upcoming, None, 0.0)
    } else {
        (current, upcoming, active.drag.translation())
    };

    let Some(asset) = top else {
        return centered(text("").size(24));
    };

    let shifted = container(card(active, asset))
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(Padding {
            left: offset.max(0.0),
            right: (-offset).max(0.0),
            ..Padding::ZERO
        });

    let overlay: Element<'a, Message> = match hint(offset, gesture.hint_threshold, gesture.hint_full_opacity) {
        Some((decision, opacity)) => {
            let (label, color) = match decision {
                Decision::Keep => ("KEEP", KEEP_COLOR),
                _ => ("DELETE", DELETE_COLOR),
            };
            container(text(label).size(56).color(Color { a: opacity, ..color }))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into()
        }
        None => horizontal_space().into(),
    };

    let under: Element<'a, Message> = match beneath {
        Some(asset) => container(card(active, asset)).padding(24).into(),
        None => horizontal_space().into(),
    };

    mouse_area(stack![under, shifted, overlay].width(Length::Fill).height(Length::Fill))
        .on_move(Message::PointerMoved)
        .on_press(Message::DragStarted)
        .on_release(Message::DragEnded)
        .on_exit(Message::DragLeft)
        .into()
}

fn card<'a>(active: &'a ActiveSession, asset: AssetRef) -> Element<'a, Message> {
    match active.thumbnails.get(&asset) {
        Some(Some(handle)) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .content_fit(ContentFit::Contain)
            .into(),
        _ => container(horizontal_space())
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme: &Theme| container::Style {
                background: Some(PLACEHOLDER_COLOR.into()),
                ..container::Style::default()
            })
            .into(),
    }
}

fn counter<'a>(label: &'a str, count: usize, color: Color) -> Element<'a, Message> {
    column![
        text(label).size(14).color(color),
        text(count.to_string()).size(32),
    ]
    .align_x(Alignment::Center)
    .into()
}

fn centered<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
