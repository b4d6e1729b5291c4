use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use ratatui::Frame;
use strum::IntoEnumIterator;

use crate::app::state::visible_fields;
use crate::app::{OverlayState, Screen, StudioState};
use crate::card::{self, PostCard};
use crate::config::themes;
use crate::media::ImageSlot;
use crate::post::{Platform, TextField};

const FORM_WIDTH: u16 = 38;

pub fn draw_app(frame: &mut Frame, state: &StudioState) {
    match state.screen() {
        Screen::TemplatePicker => draw_picker(frame, state),
        Screen::Editor => draw_editor(frame, state),
    }

    if let Some(OverlayState::AttachImage(draft)) = state.overlay() {
        let title = match draft.slot {
            ImageSlot::Avatar => "Attach avatar",
            ImageSlot::PostImage => "Attach post image",
        };
        draw_prompt(frame, title, &draft.path);
    }
}

fn draw_picker(frame: &mut Frame, state: &StudioState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.size());

    let items: Vec<ListItem> = Platform::iter()
        .enumerate()
        .map(|(index, platform)| {
            let selected = index == state.picker_index();
            let marker = if selected { "▸ " } else { "  " };
            let style = if selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{marker}{platform}"), style),
                Span::styled(
                    format!("  — {}", template_blurb(platform)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" postmock — pick a template "),
    );
    frame.render_widget(list, chunks[0]);

    draw_status_bar(
        frame,
        chunks[1],
        state,
        "j/k move • Enter open • q quit",
    );
}

fn template_blurb(platform: Platform) -> &'static str {
    match platform {
        Platform::Twitter => "dark timeline post with view counts",
        Platform::LinkedIn => "feed update with headline and reactions",
        Platform::Instagram => "square image post with caption",
    }
}

fn draw_editor(frame: &mut Frame, state: &StudioState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.size());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(FORM_WIDTH), Constraint::Min(20)])
        .split(rows[0]);

    draw_form(frame, columns[0], state);
    draw_preview(frame, columns[1], state);
    draw_status_bar(
        frame,
        rows[1],
        state,
        "Tab field • Ctrl-s capture • Ctrl-t theme • Ctrl-p template • Esc back",
    );
}

fn draw_form(frame: &mut Frame, area: Rect, state: &StudioState) {
    let post = state.store().get();
    let focused = state.focus_index();

    let mut items: Vec<ListItem> = visible_fields(post.platform)
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let label_style = if index == focused {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let marker = if index == focused { "▸ " } else { "  " };
            let value = single_line(post.text(*field));
            ListItem::new(Line::from(vec![
                Span::styled(format!("{marker}{:<10}", field_label(*field)), label_style),
                Span::raw(value),
            ]))
        })
        .collect();

    items.push(ListItem::new(Line::default()));
    let verification = if post.verification.enabled {
        format!("shown ({})", post.verification.style)
    } else {
        "hidden".to_string()
    };
    for (label, value) in [
        ("Theme", post.theme.to_string()),
        ("Badge", verification),
        (
            "Avatar",
            attachment_label(state, ImageSlot::Avatar),
        ),
        (
            "Image",
            attachment_label(state, ImageSlot::PostImage),
        ),
    ] {
        items.push(ListItem::new(Line::from(vec![
            Span::styled(
                format!("  {label:<10}"),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(value, Style::default().fg(Color::DarkGray)),
        ])));
    }

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} post ", post.platform)),
    );
    frame.render_widget(list, area);
}

fn attachment_label(state: &StudioState, slot: ImageSlot) -> String {
    match state.store().media().get(slot) {
        Some(asset) => format!("{}×{}", asset.width(), asset.height()),
        None => "none".to_string(),
    }
}

fn draw_preview(frame: &mut Frame, area: Rect, state: &StudioState) {
    let post = state.store().get();
    let block = Block::default().borders(Borders::ALL).title(" preview ");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width < 12 || inner.height < 4 {
        return;
    }

    let palette = themes::palette(post.platform, post.theme);
    let post_card = PostCard::from_state(post);
    let composed = card::compose(&post_card, &palette, state.store().media(), inner.width);
    let card_area = Rect {
        height: composed.height().min(inner.height),
        ..inner
    };
    card::paint(&composed, &palette, card_area, frame.buffer_mut());
}

fn draw_status_bar(frame: &mut Frame, area: Rect, state: &StudioState, hints: &str) {
    let mut spans = Vec::new();
    if state.capturing {
        spans.push(Span::styled(
            "● capturing ",
            Style::default().fg(Color::Yellow),
        ));
    }
    match state.status_message() {
        Some(message) => spans.push(Span::raw(message.to_string())),
        None => spans.push(Span::styled(
            hints.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_prompt(frame: &mut Frame, title: &str, value: &str) {
    let area = centered_rect(60, 3, frame.size());
    frame.render_widget(Clear, area);
    let input = Paragraph::new(format!("{value}█"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} ")),
        )
        .alignment(Alignment::Left);
    frame.render_widget(input, area);
}

fn centered_rect(width: u16, height: u16, container: Rect) -> Rect {
    let width = width.min(container.width);
    let height = height.min(container.height);
    Rect {
        x: container.x + (container.width - width) / 2,
        y: container.y + (container.height - height) / 2,
        width,
        height,
    }
}

fn single_line(value: &str) -> String {
    match value.split('\n').next() {
        Some(first) if value.contains('\n') => format!("{first}…"),
        Some(first) => first.to_string(),
        None => String::new(),
    }
}

fn field_label(field: TextField) -> &'static str {
    match field {
        TextField::DisplayName => "Name",
        TextField::Handle => "Handle",
        TextField::Headline => "Headline",
        TextField::Location => "Location",
        TextField::Content => "Content",
        TextField::TimeLabel => "Time",
        TextField::DateLabel => "Date",
        TextField::Views => "Views",
        TextField::Likes => "Likes",
        TextField::Reposts => "Reposts",
        TextField::Comments => "Comments",
        TextField::Bookmarks => "Bookmarks",
    }
}
