use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use time::OffsetDateTime;

use crate::capture::{
    export_filename, CaptureEvent, CaptureRuntime, FileDownloader, RasterOptions,
};
use crate::card;
use crate::config::themes;
use crate::config::{AppConfig, ConfigPaths};
use crate::media::ImageSlot;
use crate::ui;

pub mod state;

pub use state::{AttachDraft, OverlayState, Screen, StudioState};

enum Action {
    Quit,
    BackToPicker,
    NextField,
    PrevField,
    CyclePlatform,
    ToggleTheme,
    ToggleVerified,
    CycleBadge,
    ResetTimestamp,
    Capture,
    AttachAvatar,
    AttachPostImage,
    ClearPostImage,
}

pub struct App {
    pub config: Arc<AppConfig>,
    paths: ConfigPaths,
    state: StudioState,
    capture: CaptureRuntime,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, paths: ConfigPaths) -> Self {
        let state = StudioState::new(config.seed_state());
        Self {
            config,
            paths,
            state,
            capture: CaptureRuntime::new(),
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| ui::draw_app(frame, &self.state))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // no-op: next draw will naturally adapt to the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        if let Some(event) = self.capture.poll() {
            match event {
                CaptureEvent::Finished { path } => {
                    self.state
                        .set_status_message(Some(format!("Saved {}", path.display())));
                }
                CaptureEvent::Failed { message } => {
                    self.state
                        .set_status_message(Some(format!("Capture failed: {message}")));
                }
            }
        }
        self.state.capturing = self.capture.in_flight();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        match self.state.screen() {
            Screen::TemplatePicker => self.handle_picker_key(key),
            Screen::Editor => self.handle_editor_key(key),
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.picker_move(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.picker_move(-1),
            KeyCode::Enter => {
                self.state.choose_template();
                self.state.set_status_message(Some(
                    "Tab next field • Ctrl-s capture • Esc back to templates",
                ));
            }
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            let action = match key.code {
                KeyCode::Char('c') => Some(Action::Quit),
                KeyCode::Char('s') => Some(Action::Capture),
                KeyCode::Char('t') => Some(Action::ToggleTheme),
                KeyCode::Char('p') => Some(Action::CyclePlatform),
                KeyCode::Char('v') => Some(Action::ToggleVerified),
                KeyCode::Char('b') => Some(Action::CycleBadge),
                KeyCode::Char('r') => Some(Action::ResetTimestamp),
                KeyCode::Char('a') => Some(Action::AttachAvatar),
                KeyCode::Char('g') => Some(Action::AttachPostImage),
                KeyCode::Char('x') => Some(Action::ClearPostImage),
                _ => None,
            };
            if let Some(action) = action {
                self.handle_action(action);
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.handle_action(Action::BackToPicker),
            KeyCode::Tab => self.handle_action(Action::NextField),
            KeyCode::BackTab => self.handle_action(Action::PrevField),
            KeyCode::Enter => self.state.insert_newline(),
            KeyCode::Backspace => self.state.erase_char(),
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                self.state.type_char(ch);
            }
            _ => {}
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::BackToPicker => {
                self.state.back_to_picker();
                self.state
                    .set_status_message(Some("Pick a template: j/k move • Enter open • q quit"));
            }
            Action::NextField => self.state.cycle_focus(1),
            Action::PrevField => self.state.cycle_focus(-1),
            Action::CyclePlatform => {
                let platform = self.state.cycle_platform();
                self.state
                    .set_status_message(Some(format!("Template: {platform}")));
            }
            Action::ToggleTheme => {
                let theme = self.state.store_mut().toggle_theme();
                self.state
                    .set_status_message(Some(format!("Theme: {theme}")));
            }
            Action::ToggleVerified => {
                let enabled = self.state.store_mut().toggle_verified();
                let message = if enabled {
                    "Verified badge shown"
                } else {
                    "Verified badge hidden"
                };
                self.state.set_status_message(Some(message));
            }
            Action::CycleBadge => {
                let style = self.state.store_mut().cycle_badge();
                self.state
                    .set_status_message(Some(format!("Badge: {style}")));
            }
            Action::ResetTimestamp => {
                self.state.store_mut().reset_timestamp();
                self.state.set_status_message(Some("Timestamp set to now"));
            }
            Action::Capture => self.start_capture(),
            Action::AttachAvatar => {
                self.state.open_attach(ImageSlot::Avatar);
                self.state
                    .set_status_message(Some("Avatar image: type a path • Enter load • Esc cancel"));
            }
            Action::AttachPostImage => {
                self.state.open_attach(ImageSlot::PostImage);
                self.state
                    .set_status_message(Some("Post image: type a path • Enter load • Esc cancel"));
            }
            Action::ClearPostImage => {
                self.state.store_mut().clear_image(ImageSlot::PostImage);
                self.state.set_status_message(Some("Post image removed"));
            }
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        match self.state.overlay() {
            Some(OverlayState::AttachImage(_)) => {
                match key.code {
                    KeyCode::Esc => {
                        self.state.close_overlay();
                        self.state.set_status_message(Some("Attach canceled"));
                    }
                    KeyCode::Enter => match self.state.submit_attach() {
                        Ok(path) => {
                            self.state
                                .set_status_message(Some(format!("Attached {}", path.display())));
                        }
                        Err(err) => {
                            tracing::warn!(?err, "failed to attach image");
                            self.state
                                .set_status_message(Some(format!("Attach failed: {err:#}")));
                        }
                    },
                    KeyCode::Backspace => {
                        if let Some(draft) = self.state.attach_draft_mut() {
                            draft.path.pop();
                        }
                    }
                    KeyCode::Char(ch)
                        if !key.modifiers.intersects(
                            KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                        ) =>
                    {
                        if let Some(draft) = self.state.attach_draft_mut() {
                            draft.path.push(ch);
                        }
                    }
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    /// Renders the current card off screen and hands it to the capture
    /// worker. Ignored while a capture is already running.
    fn start_capture(&mut self) {
        let snapshot = self.state.store().snapshot();
        let surface = card::render_offscreen(
            &snapshot,
            self.state.store().media(),
            self.config.capture.card_width,
        );
        let options = RasterOptions {
            background: themes::capture_background(snapshot.platform, snapshot.theme),
            scale: self.config.capture.scale,
        };
        let output_dir = self.config.capture.resolve_output_dir(&self.paths);
        let filename = export_filename(snapshot.platform, OffsetDateTime::now_utc());

        let started = self.capture.request(
            surface,
            options,
            Box::new(FileDownloader::new(output_dir)),
            filename,
        );
        if started {
            self.state.capturing = true;
            self.state.set_status_message(Some("Capturing…"));
        } else {
            self.state
                .set_status_message(Some("A capture is already running"));
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
