use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::capture::{CardSurface, ImageOverlay};
use crate::config::themes::{self, Palette};
use crate::media::{ImageSlot, MediaStore};
use crate::post::{Counters, PostState, Verification};
use crate::richtext::{tokenize, TokenKind};

/// Inner padding between the card border column and its text, per side.
const PADDING: u16 = 2;
/// Rows reserved for an attached (or, on Instagram, pending) post image.
const IMAGE_REGION_ROWS: u16 = 8;

/// A post card ready to draw. One variant per platform; each carries only
/// the fields its renderer shows, so adding a platform is an exhaustive-match
/// exercise rather than a copy-paste one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCard {
    Twitter(TwitterCard),
    LinkedIn(LinkedInCard),
    Instagram(InstagramCard),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwitterCard {
    pub display_name: String,
    pub handle: String,
    pub verification: Verification,
    pub content: String,
    pub time_label: String,
    pub date_label: String,
    pub counters: Counters,
    pub has_post_image: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedInCard {
    pub display_name: String,
    pub headline: String,
    pub verification: Verification,
    pub content: String,
    pub time_label: String,
    pub likes: String,
    pub comments: String,
    pub reposts: String,
    pub has_post_image: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstagramCard {
    pub username: String,
    pub location: String,
    pub verification: Verification,
    pub content: String,
    pub date_label: String,
    pub likes: String,
    pub has_post_image: bool,
}

impl PostCard {
    pub fn from_state(state: &PostState) -> Self {
        use crate::post::Platform;
        let has_post_image = state.post_image_ref.is_some();
        match state.platform {
            Platform::Twitter => PostCard::Twitter(TwitterCard {
                display_name: state.display_name.clone(),
                handle: state.handle.clone(),
                verification: state.verification,
                content: state.content.clone(),
                time_label: state.time_label.clone(),
                date_label: state.date_label.clone(),
                counters: state.counters.clone(),
                has_post_image,
            }),
            Platform::LinkedIn => PostCard::LinkedIn(LinkedInCard {
                display_name: state.display_name.clone(),
                headline: state.headline.clone(),
                verification: state.verification,
                content: state.content.clone(),
                time_label: state.time_label.clone(),
                likes: state.counters.likes.clone(),
                comments: state.counters.comments.clone(),
                reposts: state.counters.reposts.clone(),
                has_post_image,
            }),
            Platform::Instagram => PostCard::Instagram(InstagramCard {
                username: state.handle.trim_start_matches('@').to_string(),
                location: state.location.clone(),
                verification: state.verification,
                content: state.content.clone(),
                date_label: state.date_label.clone(),
                likes: state.counters.likes.clone(),
                has_post_image,
            }),
        }
    }
}

/// One row of a composed card.
enum Row {
    Text(Line<'static>),
    /// Part of the post-image region; replaced by real pixels at capture time.
    ImageRegion(Line<'static>),
}

pub struct ComposedCard {
    rows: Vec<Row>,
}

impl ComposedCard {
    pub fn height(&self) -> u16 {
        // One padding row above and below; saturates rather than wrapping
        // when the body is absurdly long.
        u16::try_from(self.rows.len())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
    }
}

/// Lays the card out at the given total width. The result is painted
/// identically into the live preview and the off-screen capture surface.
pub fn compose(card: &PostCard, palette: &Palette, media: &MediaStore, width: u16) -> ComposedCard {
    let inner = width.saturating_sub(PADDING * 2).max(10);
    let rows = match card {
        PostCard::Twitter(card) => compose_twitter(card, palette, media, inner),
        PostCard::LinkedIn(card) => compose_linkedin(card, palette, media, inner),
        PostCard::Instagram(card) => compose_instagram(card, palette, media, inner),
    };
    ComposedCard { rows }
}

/// Paints a composed card into `area` and reports the post-image overlay
/// rectangle, if the card has one, in buffer coordinates.
pub fn paint(composed: &ComposedCard, palette: &Palette, area: Rect, buf: &mut Buffer) -> Option<Rect> {
    buf.set_style(area, Style::default().bg(palette.background.into()));

    let mut overlay: Option<(u16, u16)> = None; // first row, row count
    let x = area.x + PADDING;
    let max_width = area.width.saturating_sub(PADDING * 2);
    for (idx, row) in composed.rows.iter().enumerate() {
        let y = area.y + 1 + idx as u16;
        if y >= area.y + area.height {
            break;
        }
        let line = match row {
            Row::Text(line) => line,
            Row::ImageRegion(line) => {
                match &mut overlay {
                    Some((_, rows)) => *rows += 1,
                    None => overlay = Some((y, 1)),
                }
                line
            }
        };
        buf.set_line(x, y, line, max_width);
    }

    overlay.map(|(start, rows)| Rect::new(x, start, max_width, rows))
}

/// Renders the card into a fresh off-screen surface for the capture adapter.
/// Attached post images become pixel overlays so the export shows the real
/// image instead of the terminal placeholder.
pub fn render_offscreen(state: &PostState, media: &MediaStore, width: u16) -> CardSurface {
    let palette = themes::palette(state.platform, state.theme);
    let card = PostCard::from_state(state);
    let composed = compose(&card, &palette, media, width);
    let area = Rect::new(0, 0, width, composed.height());
    let mut buffer = Buffer::empty(area);
    let overlay_rect = paint(&composed, &palette, area, &mut buffer);

    let mut overlays = Vec::new();
    if let (Some(rect), Some(asset)) = (overlay_rect, media.get(ImageSlot::PostImage)) {
        overlays.push(ImageOverlay {
            area: rect,
            pixels: asset.pixels.clone(),
        });
    }

    CardSurface { buffer, overlays }
}

fn compose_twitter(
    card: &TwitterCard,
    palette: &Palette,
    media: &MediaStore,
    width: u16,
) -> Vec<Row> {
    let name_style = Style::default()
        .fg(palette.foreground.into())
        .add_modifier(Modifier::BOLD);
    let sub = Style::default().fg(palette.subtext.into());

    let mut header = vec![Span::styled(card.display_name.clone(), name_style)];
    push_badge(&mut header, card.verification);
    header.push(Span::styled(
        format!(" {} · {}", card.handle, card.time_label),
        sub,
    ));

    let mut rows = vec![Row::Text(Line::from(header)), blank()];
    rows.extend(content_rows(&card.content, palette, width));

    if card.has_post_image {
        rows.push(blank());
        rows.extend(image_region_rows(media, palette, width));
    }

    rows.push(blank());
    rows.push(Row::Text(Line::from(vec![
        Span::styled(
            format!("{} · {} · ", card.time_label, card.date_label),
            sub,
        ),
        Span::styled(
            card.counters.views.clone(),
            Style::default()
                .fg(palette.foreground.into())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" Views", sub),
    ])));
    rows.push(separator(palette, width));
    rows.push(Row::Text(Line::from(Span::styled(
        format!(
            "💬 {}    🔁 {}    ❤ {}    🔖 {}    ↗",
            card.counters.comments, card.counters.reposts, card.counters.likes, card.counters.bookmarks
        ),
        sub,
    ))));
    rows
}

fn compose_linkedin(
    card: &LinkedInCard,
    palette: &Palette,
    media: &MediaStore,
    width: u16,
) -> Vec<Row> {
    let name_style = Style::default()
        .fg(palette.foreground.into())
        .add_modifier(Modifier::BOLD);
    let sub = Style::default().fg(palette.subtext.into());

    let mut header = vec![Span::styled(card.display_name.clone(), name_style)];
    push_badge(&mut header, card.verification);

    let mut rows = vec![
        Row::Text(Line::from(header)),
        Row::Text(Line::from(Span::styled(card.headline.clone(), sub))),
        Row::Text(Line::from(Span::styled(
            format!("{} • 🌐", card.time_label),
            sub,
        ))),
        blank(),
    ];
    rows.extend(content_rows(&card.content, palette, width));

    if card.has_post_image {
        rows.push(blank());
        rows.extend(image_region_rows(media, palette, width));
    }

    rows.push(blank());
    rows.push(Row::Text(Line::from(Span::styled(
        format!(
            "👍❤ {}        {} comments • {} reposts",
            card.likes, card.comments, card.reposts
        ),
        sub,
    ))));
    rows.push(separator(palette, width));
    rows.push(Row::Text(Line::from(Span::styled(
        "👍 Like    💬 Comment    🔁 Repost    ➤ Send",
        sub,
    ))));
    rows
}

fn compose_instagram(
    card: &InstagramCard,
    palette: &Palette,
    media: &MediaStore,
    width: u16,
) -> Vec<Row> {
    let name_style = Style::default()
        .fg(palette.foreground.into())
        .add_modifier(Modifier::BOLD);
    let sub = Style::default().fg(palette.subtext.into());

    let mut header = vec![Span::styled(card.username.clone(), name_style)];
    push_badge(&mut header, card.verification);

    let mut rows = vec![Row::Text(Line::from(header))];
    if !card.location.is_empty() {
        rows.push(Row::Text(Line::from(Span::styled(card.location.clone(), sub))));
    }
    rows.push(blank());

    // The image frame is always present on Instagram, even before an image
    // is attached.
    rows.extend(image_region_rows(media, palette, width));
    rows.push(blank());

    rows.push(Row::Text(Line::from(Span::styled(
        "❤  💬  ➤                🔖",
        Style::default().fg(palette.foreground.into()),
    ))));
    rows.push(Row::Text(Line::from(Span::styled(
        format!("{} likes", card.likes),
        name_style,
    ))));

    let mut caption_rows = caption_rows(card, palette, width);
    rows.append(&mut caption_rows);

    rows.push(Row::Text(Line::from(Span::styled(
        card.date_label.to_uppercase(),
        sub,
    ))));
    rows
}

fn caption_rows(card: &InstagramCard, palette: &Palette, width: u16) -> Vec<Row> {
    // Caption leads with the username in bold, then flows like regular
    // content.
    let mut rows = content_rows(&card.content, palette, width);
    let username = Span::styled(
        format!("{} ", card.username),
        Style::default()
            .fg(palette.foreground.into())
            .add_modifier(Modifier::BOLD),
    );
    match rows.first_mut() {
        Some(Row::Text(first)) => {
            let mut spans = vec![username];
            spans.extend(first.spans.clone());
            *first = Line::from(spans);
        }
        _ => rows.insert(0, Row::Text(Line::from(username))),
    }
    rows
}

fn content_rows(content: &str, palette: &Palette, width: u16) -> Vec<Row> {
    let base = Style::default().fg(palette.foreground.into());
    let tag = Style::default().fg(palette.accent.into());
    wrap_content(content, width as usize, base, tag)
        .into_iter()
        .map(Row::Text)
        .collect()
}

fn image_region_rows(media: &MediaStore, palette: &Palette, width: u16) -> Vec<Row> {
    let border = Style::default().fg(palette.border.into());
    let sub = Style::default().fg(palette.subtext.into());
    let inner = width.saturating_sub(2) as usize;

    let label = match media.get(ImageSlot::PostImage) {
        Some(asset) => format!("🖼 {}×{}", asset.width(), asset.height()),
        None => "No image selected".to_string(),
    };

    let mut rows = Vec::with_capacity(IMAGE_REGION_ROWS as usize);
    rows.push(Row::ImageRegion(Line::from(Span::styled(
        format!("┌{}┐", "─".repeat(inner)),
        border,
    ))));
    let label_row = IMAGE_REGION_ROWS / 2;
    for row in 1..IMAGE_REGION_ROWS - 1 {
        let body = if row == label_row {
            center(&label, inner)
        } else {
            " ".repeat(inner)
        };
        rows.push(Row::ImageRegion(Line::from(vec![
            Span::styled("│", border),
            Span::styled(body, sub),
            Span::styled("│", border),
        ])));
    }
    rows.push(Row::ImageRegion(Line::from(Span::styled(
        format!("└{}┘", "─".repeat(inner)),
        border,
    ))));
    rows
}

fn push_badge(spans: &mut Vec<Span<'static>>, verification: Verification) {
    if !verification.enabled {
        return;
    }
    if let Some(color) = themes::badge_color(verification.style) {
        spans.push(Span::styled(" ✔", Style::default().fg(color.into())));
    }
}

fn blank() -> Row {
    Row::Text(Line::default())
}

fn separator(palette: &Palette, width: u16) -> Row {
    Row::Text(Line::from(Span::styled(
        "─".repeat(width as usize),
        Style::default().fg(palette.border.into()),
    )))
}

fn center(text: &str, width: usize) -> String {
    let text_width = text.width();
    if text_width >= width {
        return text.to_string();
    }
    let left = (width - text_width) / 2;
    let right = width - text_width - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// Greedy word wrap over tokenizer output. Tag tokens keep the accent style
/// across line breaks; tokens wider than the wrap width are split on
/// grapheme boundaries.
pub fn wrap_content(
    content: &str,
    width: usize,
    base: Style,
    tag: Style,
) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;

    let mut flush = |current: &mut Vec<Span<'static>>, current_width: &mut usize| {
        lines.push(Line::from(std::mem::take(current)));
        *current_width = 0;
    };

    for token in tokenize(content) {
        let style = match token.kind {
            TokenKind::Plain => base,
            TokenKind::Tag => tag,
        };
        if token.kind == TokenKind::Plain && token.text.chars().all(char::is_whitespace) {
            // Newlines inside a whitespace run each force a break; remaining
            // spaces collapse at a line start.
            let mut spaces = 0usize;
            for ch in token.text.chars() {
                if ch == '\n' {
                    spaces = 0;
                    flush(&mut current, &mut current_width);
                } else if ch != '\r' {
                    spaces += 1;
                }
            }
            if spaces > 0 && current_width > 0 {
                let fitted = spaces.min(width.saturating_sub(current_width));
                if fitted > 0 {
                    current.push(Span::styled(" ".repeat(fitted), base));
                    current_width += fitted;
                }
            }
            continue;
        }

        for chunk in split_to_width(&token.text, width) {
            let chunk_width = chunk.width();
            if current_width > 0 && current_width + chunk_width > width {
                flush(&mut current, &mut current_width);
            }
            current_width += chunk_width;
            current.push(Span::styled(chunk, style));
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

fn split_to_width(text: &str, width: usize) -> Vec<String> {
    if text.width() <= width {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut chunk_width = 0usize;
    for grapheme in text.graphemes(true) {
        let grapheme_width = grapheme.width();
        if chunk_width + grapheme_width > width && !chunk.is_empty() {
            chunks.push(std::mem::take(&mut chunk));
            chunk_width = 0;
        }
        chunk.push_str(grapheme);
        chunk_width += grapheme_width;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::{Platform, PostState};

    fn line_width(line: &Line<'_>) -> usize {
        line.spans.iter().map(|span| span.content.width()).sum()
    }

    #[test]
    fn dispatch_matches_platform() {
        let state = PostState::default();
        assert!(matches!(PostCard::from_state(&state), PostCard::Twitter(_)));

        let mut state = PostState::default();
        state.platform = Platform::LinkedIn;
        assert!(matches!(PostCard::from_state(&state), PostCard::LinkedIn(_)));

        state.platform = Platform::Instagram;
        assert!(matches!(PostCard::from_state(&state), PostCard::Instagram(_)));
    }

    #[test]
    fn instagram_username_drops_at_sigil() {
        let mut state = PostState::default();
        state.platform = Platform::Instagram;
        state.handle = "@someone".to_string();
        match PostCard::from_state(&state) {
            PostCard::Instagram(card) => assert_eq!(card.username, "someone"),
            other => panic!("unexpected card {other:?}"),
        }
    }

    #[test]
    fn wrapped_lines_respect_width() {
        let base = Style::default();
        let lines = wrap_content(
            "a few words that need wrapping at a narrow width #tag",
            12,
            base,
            base,
        );
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line_width(line) <= 12, "line too wide: {line:?}");
        }
    }

    #[test]
    fn oversized_token_is_hard_split() {
        let base = Style::default();
        let lines = wrap_content("https://example.com/a/very/long/path/segment", 10, base, base);
        assert!(lines.len() >= 4);
        for line in &lines {
            assert!(line_width(line) <= 10);
        }
    }

    #[test]
    fn newlines_force_breaks() {
        let base = Style::default();
        let lines = wrap_content("one\n\ntwo", 20, base, base);
        assert_eq!(lines.len(), 3);
        assert_eq!(line_width(&lines[1]), 0);
    }

    #[test]
    fn instagram_card_always_has_image_region() {
        let mut state = PostState::default();
        state.platform = Platform::Instagram;
        state.post_image_ref = None;
        let media = MediaStore::default();
        let palette = themes::palette(state.platform, state.theme);
        let card = PostCard::from_state(&state);
        let composed = compose(&card, &palette, &media, 50);
        let area = Rect::new(0, 0, 50, composed.height());
        let mut buffer = Buffer::empty(area);
        let overlay = paint(&composed, &palette, area, &mut buffer);
        assert!(overlay.is_some(), "expected image frame without attachment");
    }

    #[test]
    fn twitter_card_has_no_image_region_without_attachment() {
        let state = PostState::default();
        let media = MediaStore::default();
        let palette = themes::palette(state.platform, state.theme);
        let card = PostCard::from_state(&state);
        let composed = compose(&card, &palette, &media, 50);
        let area = Rect::new(0, 0, 50, composed.height());
        let mut buffer = Buffer::empty(area);
        assert!(paint(&composed, &palette, area, &mut buffer).is_none());
    }

    #[test]
    fn height_saturates_on_extreme_content() {
        let mut state = PostState::default();
        state.content = "\n".repeat(70_000);
        let media = MediaStore::default();
        let palette = themes::palette(state.platform, state.theme);
        let composed = compose(&PostCard::from_state(&state), &palette, &media, 50);
        assert_eq!(composed.height(), u16::MAX);
    }

    #[test]
    fn offscreen_surface_matches_composed_height() {
        let state = PostState::default();
        let media = MediaStore::default();
        let surface = render_offscreen(&state, &media, 60);
        let palette = themes::palette(state.platform, state.theme);
        let composed = compose(&PostCard::from_state(&state), &palette, &media, 60);
        assert_eq!(surface.buffer.area.height, composed.height());
        assert_eq!(surface.buffer.area.width, 60);
        assert!(surface.overlays.is_empty());
    }
}
