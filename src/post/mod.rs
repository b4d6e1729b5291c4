use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use unicode_segmentation::UnicodeSegmentation;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::media::{ImageAsset, ImageSlot, MediaStore};

/// Which post-card template is active. Cross-platform fields persist in the
/// state even while a template hides them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Platform {
    Twitter,
    LinkedIn,
    Instagram,
}

impl Platform {
    pub fn next(self) -> Self {
        match self {
            Platform::Twitter => Platform::LinkedIn,
            Platform::LinkedIn => Platform::Instagram,
            Platform::Instagram => Platform::Twitter,
        }
    }

    /// Default theme picked when this template is selected, matching the
    /// platform's usual presentation.
    pub fn default_theme(self) -> Theme {
        match self {
            Platform::Twitter => Theme::Dark,
            Platform::LinkedIn | Platform::Instagram => Theme::Light,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Color of the "verified" check mark shown next to the display name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BadgeStyle {
    Blue,
    Gold,
    Grey,
    Pink,
    None,
}

impl BadgeStyle {
    pub fn next(self) -> Self {
        match self {
            BadgeStyle::Blue => BadgeStyle::Gold,
            BadgeStyle::Gold => BadgeStyle::Grey,
            BadgeStyle::Grey => BadgeStyle::Pink,
            BadgeStyle::Pink => BadgeStyle::None,
            BadgeStyle::None => BadgeStyle::Blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub enabled: bool,
    pub style: BadgeStyle,
}

impl Default for Verification {
    fn default() -> Self {
        Self {
            enabled: true,
            style: BadgeStyle::Blue,
        }
    }
}

/// Engagement counters are opaque display strings. "1.4M" and "over 9000"
/// are equally valid; nothing ever parses them back into numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counters {
    pub views: String,
    pub likes: String,
    pub reposts: String,
    pub comments: String,
    pub bookmarks: String,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            views: "1.4M".to_string(),
            likes: "1,240".to_string(),
            reposts: "22".to_string(),
            comments: "48".to_string(),
            bookmarks: "2.5K".to_string(),
        }
    }
}

/// Addressable text fields for the key-value setter. Every field accepts any
/// string; the store performs no validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TextField {
    DisplayName,
    Handle,
    Headline,
    Location,
    Content,
    TimeLabel,
    DateLabel,
    Views,
    Likes,
    Reposts,
    Comments,
    Bookmarks,
}

/// One immutable snapshot of the editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostState {
    pub display_name: String,
    pub handle: String,
    pub headline: String,
    pub location: String,
    pub content: String,
    pub time_label: String,
    pub date_label: String,
    pub counters: Counters,
    pub avatar_ref: Option<String>,
    pub post_image_ref: Option<String>,
    pub verification: Verification,
    pub platform: Platform,
    pub theme: Theme,
}

impl Default for PostState {
    fn default() -> Self {
        Self {
            display_name: "Alex Morgan".to_string(),
            handle: "@alexmorgan".to_string(),
            headline: "Product Designer".to_string(),
            location: "San Francisco, CA".to_string(),
            content: "Just shipped a huge update! 🚀 The team has been working hard on this one. \
                      #design #shipping"
                .to_string(),
            time_label: "2h".to_string(),
            date_label: String::new(),
            counters: Counters::default(),
            avatar_ref: None,
            post_image_ref: None,
            verification: Verification::default(),
            platform: Platform::Twitter,
            theme: Theme::Dark,
        }
    }
}

impl PostState {
    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::DisplayName => &self.display_name,
            TextField::Handle => &self.handle,
            TextField::Headline => &self.headline,
            TextField::Location => &self.location,
            TextField::Content => &self.content,
            TextField::TimeLabel => &self.time_label,
            TextField::DateLabel => &self.date_label,
            TextField::Views => &self.counters.views,
            TextField::Likes => &self.counters.likes,
            TextField::Reposts => &self.counters.reposts,
            TextField::Comments => &self.counters.comments,
            TextField::Bookmarks => &self.counters.bookmarks,
        }
    }

    /// Returns a new snapshot with one field replaced and every other field
    /// carried over untouched.
    pub fn with_text(&self, field: TextField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let slot = match field {
            TextField::DisplayName => &mut next.display_name,
            TextField::Handle => &mut next.handle,
            TextField::Headline => &mut next.headline,
            TextField::Location => &mut next.location,
            TextField::Content => &mut next.content,
            TextField::TimeLabel => &mut next.time_label,
            TextField::DateLabel => &mut next.date_label,
            TextField::Views => &mut next.counters.views,
            TextField::Likes => &mut next.counters.likes,
            TextField::Reposts => &mut next.counters.reposts,
            TextField::Comments => &mut next.counters.comments,
            TextField::Bookmarks => &mut next.counters.bookmarks,
        };
        *slot = value.into();
        next
    }

    pub fn with_image_ref(&self, slot: ImageSlot, uri: Option<String>) -> Self {
        let mut next = self.clone();
        match slot {
            ImageSlot::Avatar => next.avatar_ref = uri,
            ImageSlot::PostImage => next.post_image_ref = uri,
        }
        next
    }

    pub fn image_ref(&self, slot: ImageSlot) -> Option<&str> {
        match slot {
            ImageSlot::Avatar => self.avatar_ref.as_deref(),
            ImageSlot::PostImage => self.post_image_ref.as_deref(),
        }
    }

    /// Recomputes `time_label`/`date_label` from the given wall-clock value.
    pub fn with_timestamp_at(&self, now: OffsetDateTime) -> Self {
        let mut next = self.clone();
        next.time_label = format_time_label(now);
        next.date_label = format_date_label(now);
        next
    }
}

/// `<hour>:<minute AM/PM>`, e.g. `2:05 PM`.
pub fn format_time_label(now: OffsetDateTime) -> String {
    let format = format_description!("[hour repr:12 padding:none]:[minute] [period]");
    now.format(&format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

/// `<Mon> <day>, <year>`, e.g. `Jan 5, 2026`.
pub fn format_date_label(now: OffsetDateTime) -> String {
    let format = format_description!("[month repr:short] [day padding:none], [year]");
    now.format(&format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

fn wall_clock_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Owns the current snapshot plus the decoded image assets behind the
/// `avatar_ref`/`post_image_ref` URIs. Replacing or clearing an image
/// releases the previous asset deterministically.
#[derive(Debug, Default)]
pub struct PostStore {
    state: PostState,
    media: MediaStore,
}

impl PostStore {
    pub fn new() -> Self {
        let mut store = Self {
            state: PostState::default(),
            media: MediaStore::default(),
        };
        store.reset_timestamp();
        store
    }

    pub fn with_state(state: PostState) -> Self {
        Self {
            state,
            media: MediaStore::default(),
        }
    }

    pub fn get(&self) -> &PostState {
        &self.state
    }

    pub fn snapshot(&self) -> PostState {
        self.state.clone()
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    pub fn set_text(&mut self, field: TextField, value: impl Into<String>) {
        self.state = self.state.with_text(field, value);
    }

    pub fn push_char(&mut self, field: TextField, ch: char) {
        let mut value = self.state.text(field).to_string();
        value.push(ch);
        self.set_text(field, value);
    }

    /// Removes the last grapheme cluster so emoji and combining marks are
    /// erased whole.
    pub fn pop_char(&mut self, field: TextField) {
        let value = self.state.text(field);
        let trimmed = match value.grapheme_indices(true).last() {
            Some((offset, _)) => value[..offset].to_string(),
            None => return,
        };
        self.set_text(field, trimmed);
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.state.platform = platform;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.state.theme = theme;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.state.theme = self.state.theme.toggled();
        self.state.theme
    }

    pub fn toggle_verified(&mut self) -> bool {
        self.state.verification.enabled = !self.state.verification.enabled;
        self.state.verification.enabled
    }

    pub fn set_badge(&mut self, style: BadgeStyle) {
        self.state.verification.style = style;
    }

    pub fn cycle_badge(&mut self) -> BadgeStyle {
        self.state.verification.style = self.state.verification.style.next();
        self.state.verification.style
    }

    pub fn reset_timestamp(&mut self) {
        self.reset_timestamp_at(wall_clock_now());
    }

    pub fn reset_timestamp_at(&mut self, now: OffsetDateTime) {
        self.state = self.state.with_timestamp_at(now);
    }

    /// Reads and decodes the file at `path`, stores it as an inline data URI
    /// under the given slot, and releases whatever the slot held before. On
    /// failure the state is left untouched.
    pub fn attach_image(&mut self, slot: ImageSlot, path: &Path) -> Result<&ImageAsset> {
        let asset = self.media.attach(slot, path)?;
        let uri = asset.uri.clone();
        self.state = self.state.with_image_ref(slot, Some(uri));
        Ok(self
            .media
            .get(slot)
            .expect("asset stored by attach just above"))
    }

    pub fn clear_image(&mut self, slot: ImageSlot) {
        self.media.release(slot);
        self.state = self.state.with_image_ref(slot, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn with_text_leaves_original_snapshot_untouched() {
        let original = PostState::default();
        let before = original.clone();
        let updated = original.with_text(TextField::Content, "edited");
        assert_eq!(original, before);
        assert_eq!(updated.content, "edited");
        assert_eq!(updated.display_name, original.display_name);
    }

    #[test]
    fn with_text_is_idempotent() {
        let state = PostState::default();
        let once = state.with_text(TextField::Likes, "999");
        let twice = once.with_text(TextField::Likes, "999");
        assert_eq!(once, twice);
    }

    #[test]
    fn counters_accept_arbitrary_strings() {
        let state = PostState::default().with_text(TextField::Views, "over 9000 🚀");
        assert_eq!(state.counters.views, "over 9000 🚀");
    }

    #[test]
    fn timestamp_labels_are_deterministic_for_fixed_clock() {
        let now = datetime!(2026-01-05 14:05:00 UTC);
        let state = PostState::default().with_timestamp_at(now);
        assert_eq!(state.time_label, "2:05 PM");
        assert_eq!(state.date_label, "Jan 5, 2026");
    }

    #[test]
    fn timestamp_morning_uses_am() {
        let now = datetime!(2026-11-30 09:07:00 UTC);
        let state = PostState::default().with_timestamp_at(now);
        assert_eq!(state.time_label, "9:07 AM");
        assert_eq!(state.date_label, "Nov 30, 2026");
    }

    #[test]
    fn switching_platform_preserves_hidden_fields() {
        let mut store = PostStore::new();
        store.set_text(TextField::Headline, "Staff Engineer");
        store.set_platform(Platform::Twitter);
        // The Twitter card never shows a headline, but the field survives.
        assert_eq!(store.get().headline, "Staff Engineer");
        store.set_platform(Platform::LinkedIn);
        assert_eq!(store.get().headline, "Staff Engineer");
    }

    #[test]
    fn clear_image_resets_ref_to_none() {
        let mut store = PostStore::new();
        store.state = store.state.with_image_ref(
            ImageSlot::PostImage,
            Some("data:image/png;base64,AAAA".to_string()),
        );
        store.clear_image(ImageSlot::PostImage);
        assert_eq!(store.get().post_image_ref, None);
    }

    #[test]
    fn pop_char_erases_whole_graphemes() {
        let mut store = PostStore::new();
        store.set_text(TextField::Content, "ok 👩‍🚀");
        store.pop_char(TextField::Content);
        assert_eq!(store.get().content, "ok ");
        store.set_text(TextField::Content, "");
        store.pop_char(TextField::Content);
        assert_eq!(store.get().content, "");
    }

    #[test]
    fn badge_cycle_visits_every_style() {
        let mut style = BadgeStyle::Blue;
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(style);
            style = style.next();
        }
        assert_eq!(style, BadgeStyle::Blue);
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn platform_default_themes_match_presentation() {
        assert_eq!(Platform::Twitter.default_theme(), Theme::Dark);
        assert_eq!(Platform::LinkedIn.default_theme(), Theme::Light);
        assert_eq!(Platform::Instagram.default_theme(), Theme::Light);
    }
}
