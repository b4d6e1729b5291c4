use std::path::PathBuf;

use anyhow::Result;
use strum::IntoEnumIterator;

use crate::media::ImageSlot;
use crate::post::{Platform, PostState, PostStore, TextField};

/// Top-level screens. Esc in the editor returns to the picker rather than
/// quitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    TemplatePicker,
    Editor,
}

/// Modal input states layered over the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayState {
    AttachImage(AttachDraft),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachDraft {
    pub slot: ImageSlot,
    pub path: String,
}

/// Fields editable on the currently selected template, in focus order.
/// Hidden fields stay in the store untouched; they come back when their
/// platform is selected again.
pub fn visible_fields(platform: Platform) -> &'static [TextField] {
    match platform {
        Platform::Twitter => &[
            TextField::DisplayName,
            TextField::Handle,
            TextField::Content,
            TextField::TimeLabel,
            TextField::DateLabel,
            TextField::Views,
            TextField::Likes,
            TextField::Reposts,
            TextField::Comments,
            TextField::Bookmarks,
        ],
        Platform::LinkedIn => &[
            TextField::DisplayName,
            TextField::Headline,
            TextField::Content,
            TextField::TimeLabel,
            TextField::Likes,
            TextField::Reposts,
            TextField::Comments,
        ],
        Platform::Instagram => &[
            TextField::Handle,
            TextField::Location,
            TextField::Content,
            TextField::DateLabel,
            TextField::Likes,
        ],
    }
}

pub struct StudioState {
    screen: Screen,
    store: PostStore,
    picker_index: usize,
    focus: usize,
    overlay: Option<OverlayState>,
    status_message: Option<String>,
    /// Mirrors the capture runtime so the renderer can show progress without
    /// reaching into it.
    pub capturing: bool,
}

impl StudioState {
    pub fn new(seed: PostState) -> Self {
        let picker_index = Platform::iter()
            .position(|platform| platform == seed.platform)
            .unwrap_or(0);
        let mut store = PostStore::with_state(seed);
        store.reset_timestamp();
        Self {
            screen: Screen::TemplatePicker,
            store,
            picker_index,
            focus: 0,
            overlay: None,
            status_message: None,
            capturing: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PostStore {
        &mut self.store
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status_message(&mut self, message: Option<impl Into<String>>) {
        self.status_message = message.map(Into::into);
    }

    // --- template picker ---

    pub fn picker_index(&self) -> usize {
        self.picker_index
    }

    pub fn picker_selection(&self) -> Platform {
        Platform::iter()
            .nth(self.picker_index)
            .unwrap_or(Platform::Twitter)
    }

    pub fn picker_move(&mut self, delta: isize) {
        let count = Platform::iter().count() as isize;
        let index = self.picker_index as isize + delta;
        self.picker_index = index.rem_euclid(count) as usize;
    }

    /// Applies the picked template and enters the editor. The theme follows
    /// the platform default; everything else carries over.
    pub fn choose_template(&mut self) {
        let platform = self.picker_selection();
        self.store.set_platform(platform);
        self.store.set_theme(platform.default_theme());
        self.focus = 0;
        self.screen = Screen::Editor;
    }

    pub fn back_to_picker(&mut self) {
        self.overlay = None;
        self.screen = Screen::TemplatePicker;
    }

    // --- editor focus ---

    pub fn focused_field(&self) -> TextField {
        let fields = visible_fields(self.store.get().platform);
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn focus_index(&self) -> usize {
        let fields = visible_fields(self.store.get().platform);
        self.focus.min(fields.len() - 1)
    }

    pub fn cycle_focus(&mut self, delta: isize) {
        let count = visible_fields(self.store.get().platform).len() as isize;
        let index = self.focus_index() as isize + delta;
        self.focus = index.rem_euclid(count) as usize;
    }

    pub fn cycle_platform(&mut self) -> Platform {
        let platform = self.store.get().platform.next();
        self.store.set_platform(platform);
        self.store.set_theme(platform.default_theme());
        // The old focus may point past the new template's field list.
        self.focus = self.focus_index();
        self.picker_index = Platform::iter()
            .position(|p| p == platform)
            .unwrap_or(0);
        platform
    }

    pub fn type_char(&mut self, ch: char) {
        let field = self.focused_field();
        self.store.push_char(field, ch);
    }

    pub fn erase_char(&mut self) {
        let field = self.focused_field();
        self.store.pop_char(field);
    }

    /// Line breaks only make sense in the post body.
    pub fn insert_newline(&mut self) {
        if self.focused_field() == TextField::Content {
            self.store.push_char(TextField::Content, '\n');
        }
    }

    // --- attach overlay ---

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn open_attach(&mut self, slot: ImageSlot) {
        self.overlay = Some(OverlayState::AttachImage(AttachDraft {
            slot,
            path: String::new(),
        }));
    }

    pub fn attach_draft_mut(&mut self) -> Option<&mut AttachDraft> {
        match self.overlay.as_mut() {
            Some(OverlayState::AttachImage(draft)) => Some(draft),
            None => None,
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    /// Loads the file named in the attach overlay into its slot. Keeps the
    /// overlay open on failure so the path can be corrected.
    pub fn submit_attach(&mut self) -> Result<PathBuf> {
        let Some(OverlayState::AttachImage(draft)) = self.overlay.clone() else {
            anyhow::bail!("no attach prompt open");
        };
        let path = PathBuf::from(draft.path.trim());
        self.store.attach_image(draft.slot, &path)?;
        self.overlay = None;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> StudioState {
        StudioState::new(PostState::default())
    }

    #[test]
    fn picker_wraps_in_both_directions() {
        let mut state = state();
        assert_eq!(state.picker_selection(), Platform::Twitter);
        state.picker_move(-1);
        assert_eq!(state.picker_selection(), Platform::Instagram);
        state.picker_move(1);
        state.picker_move(1);
        assert_eq!(state.picker_selection(), Platform::LinkedIn);
    }

    #[test]
    fn choosing_a_template_applies_its_default_theme() {
        let mut state = state();
        state.picker_move(1); // LinkedIn
        state.choose_template();
        assert_eq!(state.screen(), Screen::Editor);
        assert_eq!(state.store().get().platform, Platform::LinkedIn);
        assert_eq!(
            state.store().get().theme,
            Platform::LinkedIn.default_theme()
        );
    }

    #[test]
    fn focus_cycles_only_over_visible_fields() {
        let mut state = state();
        state.choose_template();
        let fields = visible_fields(Platform::Twitter);
        for expected in fields {
            assert_eq!(state.focused_field(), *expected);
            state.cycle_focus(1);
        }
        // A full cycle lands back on the first field.
        assert_eq!(state.focused_field(), fields[0]);
        state.cycle_focus(-1);
        assert_eq!(state.focused_field(), *fields.last().unwrap());
    }

    #[test]
    fn platform_switch_clamps_focus() {
        let mut state = state();
        state.choose_template();
        for _ in 0..visible_fields(Platform::Twitter).len() - 1 {
            state.cycle_focus(1);
        }
        state.cycle_platform(); // LinkedIn has fewer fields
        let fields = visible_fields(Platform::LinkedIn);
        assert!(fields.contains(&state.focused_field()));
    }

    #[test]
    fn typing_lands_in_the_focused_field() {
        let mut state = state();
        state.choose_template();
        state.store_mut().set_text(TextField::DisplayName, "");
        for ch in "Sam".chars() {
            state.type_char(ch);
        }
        assert_eq!(state.store().get().display_name, "Sam");
        state.erase_char();
        assert_eq!(state.store().get().display_name, "Sa");
    }

    #[test]
    fn newline_is_content_only() {
        let mut state = state();
        state.choose_template();
        state.store_mut().set_text(TextField::DisplayName, "name");
        state.insert_newline();
        assert_eq!(state.store().get().display_name, "name");
        while state.focused_field() != TextField::Content {
            state.cycle_focus(1);
        }
        state.store_mut().set_text(TextField::Content, "line");
        state.insert_newline();
        assert_eq!(state.store().get().content, "line\n");
    }

    #[test]
    fn attach_overlay_keeps_failed_path_editable() {
        let mut state = state();
        state.choose_template();
        state.open_attach(ImageSlot::PostImage);
        if let Some(draft) = state.attach_draft_mut() {
            draft.path.push_str("/definitely/not/here.png");
        }
        assert!(state.submit_attach().is_err());
        assert!(state.overlay().is_some());
        state.close_overlay();
        assert!(state.overlay().is_none());
    }
}
