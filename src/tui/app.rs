//! Main TUI application
//!
//! Event-driven application that coordinates:
//! - Terminal rendering with ratatui
//! - User input handling
//! - Chat events drained from the ingestion queue

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::{debug, info, warn};

use super::event::{AppEvent, EventLoop, InputEvent, UserCommand};
use super::theme::{ColorMode, Theme};
use super::widgets::ChatPane;
use crate::config::Config;
use crate::error::{Result, TuiError};
use crate::session::{ChannelId, ChatEvent, Ingested, SessionCoordinator};
use crate::source::EventReceiver;

/// Most chat events applied between two redraws
pub const INGEST_BATCH: usize = 256;

/// Modal dialog state
#[derive(Debug, Clone)]
pub enum Modal {
    /// No modal open
    None,
    /// Text input modal
    Input {
        title: String,
        prompt: String,
        value: String,
        on_submit: InputAction,
    },
    /// Confirmation modal
    Confirm {
        title: String,
        message: String,
        on_confirm: ConfirmAction,
    },
    /// Help modal
    Help,
    /// Error modal
    Error { message: String },
}

/// Action to perform when input modal is submitted
#[derive(Debug, Clone)]
pub enum InputAction {
    AddChannel,
    SendMessage { channel: ChannelId },
}

/// Action to perform when confirm modal is confirmed
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    RemoveChannel { channel: ChannelId },
}

/// Application UI state
#[derive(Debug)]
pub struct AppUiState {
    /// Current modal
    pub modal: Modal,
    /// Status message
    pub status_message: Option<String>,
    /// Should quit
    pub should_quit: bool,
}

impl Default for AppUiState {
    fn default() -> Self {
        Self {
            modal: Modal::None,
            status_message: None,
            should_quit: false,
        }
    }
}

/// Main TUI application
pub struct App {
    /// Configuration, updated when the channel list changes
    config: Config,
    /// Where the channel list is persisted (default location when unset)
    config_path: Option<PathBuf>,
    /// Off when the config file could not be loaded, so it is never clobbered
    persist: bool,
    /// Channels, buffers and layout
    coordinator: SessionCoordinator,
    /// Consumer side of the ingestion queue
    ingest: EventReceiver,
    /// Whether the ingestion queue can still deliver
    ingest_open: bool,
    theme: Theme,
    /// UI state
    ui_state: AppUiState,
    /// Event loop
    event_loop: EventLoop,
}

impl App {
    /// Create a new application
    pub fn new(config: Config, coordinator: SessionCoordinator, ingest: EventReceiver) -> Self {
        let mode = config.color_mode.unwrap_or_else(ColorMode::detect);
        Self {
            config,
            config_path: None,
            persist: true,
            coordinator,
            ingest,
            ingest_open: true,
            theme: Theme::for_color_mode(mode),
            ui_state: AppUiState::default(),
            event_loop: EventLoop::new(),
        }
    }

    /// Persist channel changes to a specific config file
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Enable or disable writing the channel list back
    pub fn with_persistence(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    /// Run the application until the user quits, then disconnect
    pub async fn run(&mut self) -> Result<()> {
        let tick_rate = Duration::from_millis(1000 / u64::from(self.config.ui_refresh_fps.max(1)));
        self.event_loop.start(tick_rate);
        self.watch_interrupt();

        let mut terminal = self.setup_terminal()?;
        let size = terminal
            .size()
            .map_err(|e| TuiError::InitFailed(e.to_string()))?;
        self.resize(size.width, size.height);

        info!("Entering main loop");
        let result = self.main_loop(&mut terminal).await;
        info!("Main loop exited with result: {:?}", result.is_ok());

        self.restore_terminal(&mut terminal)?;
        self.shutdown().await;
        result
    }

    /// Post a quit event on SIGINT delivered outside of raw mode key handling
    fn watch_interrupt(&self) {
        let sender = self.event_loop.sender();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = sender.send(AppEvent::Quit).await;
            }
        });
    }

    /// Setup terminal for TUI
    fn setup_terminal(&self) -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode().map_err(|e| TuiError::InitFailed(e.to_string()))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| TuiError::InitFailed(e.to_string()))?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).map_err(|e| TuiError::InitFailed(e.to_string()))?;

        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(&self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode().map_err(|e| TuiError::RestoreFailed(e.to_string()))?;

        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| TuiError::RestoreFailed(e.to_string()))?;

        terminal
            .show_cursor()
            .map_err(|e| TuiError::RestoreFailed(e.to_string()))?;

        info!("Terminal restore complete");
        Ok(())
    }

    /// Stop intake and close the connection within the configured bound
    async fn shutdown(&mut self) {
        self.ingest.close();
        let timeout = self.config.shutdown_timeout();
        match self.coordinator.disconnect(timeout).await {
            Ok(()) => info!("Disconnected from chat server"),
            Err(e) => warn!("Disconnect did not complete cleanly: {}", e),
        }
    }

    /// Main event loop
    async fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut redraw = true;

        loop {
            if redraw || self.coordinator.take_dirty() {
                terminal
                    .draw(|f| self.render(f))
                    .map_err(|e| TuiError::RenderError(e.to_string()))?;
                redraw = false;
            }

            tokio::select! {
                event = self.event_loop.next() => match event {
                    Some(AppEvent::Tick) => {}
                    Some(event) => {
                        self.handle_event(event).await;
                        redraw = true;
                    }
                    None => self.ui_state.should_quit = true,
                },
                chat = self.ingest.recv(), if self.ingest_open => match chat {
                    Some(first) => self.ingest_batch(first),
                    None => {
                        warn!("Ingestion queue closed; no more chat messages will arrive");
                        self.ingest_open = false;
                    }
                },
            }

            if self.ui_state.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Apply one event plus whatever is already queued behind it, up to a batch
    fn ingest_batch(&mut self, first: ChatEvent) {
        let mut discovered = self.ingest_one(first);
        for event in self.ingest.drain(INGEST_BATCH - 1) {
            discovered |= self.ingest_one(event);
        }
        if discovered {
            self.persist_channels();
        }
    }

    fn ingest_one(&mut self, event: ChatEvent) -> bool {
        matches!(
            self.coordinator.ingest(event),
            Ingested::Appended {
                discovered: true,
                ..
            }
        )
    }

    async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(input) => self.handle_input(input).await,
            AppEvent::Tick => {}
            AppEvent::Quit => self.ui_state.should_quit = true,
        }
    }

    /// Panes get every row except the status bar
    fn resize(&mut self, width: u16, height: u16) {
        self.coordinator.resize(width, height.saturating_sub(1));
    }

    /// Write the tracked channel list back to the config file
    fn persist_channels(&mut self) {
        self.config.set_channels(self.coordinator.channel_names());
        if !self.persist {
            debug!("Channel list not saved, persistence is off for this session");
            return;
        }
        let saved = match &self.config_path {
            Some(path) => Config::save_channels_to(path, &self.config.channels),
            None => Config::save_channels(&self.config.channels),
        };
        if let Err(e) = saved {
            warn!("Failed to save channel list: {}", e);
        }
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let body = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };

        let layout = self.coordinator.layout().clone();
        {
            let theme = &self.theme;
            let mut visible = self.coordinator.visible_panes_mut();
            let panes: Vec<ChatPane<'_>> = visible
                .iter_mut()
                .map(|(id, pane)| {
                    let pane = &mut **pane;
                    ChatPane::new(id, &pane.buffer, &mut pane.view, theme)
                })
                .collect();
            frame.render_widget(layout.arrange(panes, body), body);
        }

        self.render_status_bar(frame, area);
        self.render_modal(frame, area);
    }

    /// Render modal overlay
    fn render_modal(&self, frame: &mut Frame, area: Rect) {
        match &self.ui_state.modal {
            Modal::None => {}

            Modal::Input {
                title,
                prompt,
                value,
                ..
            } => {
                let modal_area = centered_rect(60, 20, area);
                frame.render_widget(Clear, modal_area);

                let block = Block::default()
                    .title(format!(" {} ", title))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.modal_info));

                let inner = block.inner(modal_area);
                frame.render_widget(block, modal_area);

                let text = format!("{}\n\n> {}_", prompt, value);
                frame.render_widget(Paragraph::new(text), inner);
            }

            Modal::Confirm { title, message, .. } => {
                let modal_area = centered_rect(50, 15, area);
                frame.render_widget(Clear, modal_area);

                let block = Block::default()
                    .title(format!(" {} ", title))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.modal_warning));

                let inner = block.inner(modal_area);
                frame.render_widget(block, modal_area);

                let text = format!("{}\n\n[Enter] Confirm  [Esc] Cancel", message);
                frame.render_widget(Paragraph::new(text), inner);
            }

            Modal::Error { message } => {
                let modal_area = centered_rect(60, 20, area);
                frame.render_widget(Clear, modal_area);

                let block = Block::default()
                    .title(" Error ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.modal_error));

                let inner = block.inner(modal_area);
                frame.render_widget(block, modal_area);

                let text = format!("{}\n\nPress any key to close.", message);
                frame.render_widget(Paragraph::new(text), inner);
            }

            Modal::Help => {
                let modal_area = centered_rect(70, 80, area);
                frame.render_widget(Clear, modal_area);

                let block = Block::default()
                    .title(" Help ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.modal_info));

                let inner = block.inner(modal_area);
                frame.render_widget(block, modal_area);

                let help_text = r#"
Panes:
  Tab/Shift-Tab   Focus next/previous pane
  h/l, Left/Right Focus previous/next pane

Scrolling (focused pane):
  j/k, Up/Down    One message
  Ctrl+u/d        Half page up/down
  PgUp/PgDn       Half page up/down
  G, End          Back to latest

Channels:
  a               Add channel
  d               Remove focused channel
  m, Enter        Send a message (/me for actions)

Other:
  ?               Show this help
  q, Ctrl+c       Quit

Press any key to close this help.
"#;

                frame.render_widget(Paragraph::new(help_text), inner);
            }
        }
    }

    /// Render status bar
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if area.height < 2 {
            return;
        }

        let status_area = Rect {
            x: area.x,
            y: area.y + area.height - 1,
            width: area.width,
            height: 1,
        };

        let status = match &self.ui_state.status_message {
            Some(msg) => msg.clone(),
            None => self.status_line(),
        };

        let style = if self.focused_scrolled() {
            self.theme.status_scrolled()
        } else {
            self.theme.status_bar()
        };
        let paragraph = Paragraph::new(status).style(style);
        frame.render_widget(paragraph, status_area);
    }

    /// Whether the focused pane is anchored away from the newest message
    fn focused_scrolled(&self) -> bool {
        self.coordinator
            .focused_channel()
            .and_then(|channel| self.coordinator.pane(channel))
            .is_some_and(|p| !p.view.is_following())
    }

    fn status_line(&self) -> String {
        let tracked = self.coordinator.channel_count();
        let visible = self.coordinator.visible_channels().len();

        let mut status = format!("Channels: {} ({} visible)", tracked, visible);
        if let Some(channel) = self.coordinator.focused_channel() {
            status.push_str(&format!(" | Focus: {}", channel));
            if self.focused_scrolled() {
                status.push_str(" [scrolled, G to follow]");
            }
        }
        let dropped = self.coordinator.dropped_events();
        if dropped > 0 {
            status.push_str(&format!(" | Dropped: {}", dropped));
        }
        if !self.ingest_open {
            status.push_str(" | offline");
        }
        if !self.persist {
            status.push_str(" | config not loaded, changes not saved");
        }
        status.push_str(" | ?: help  a: add  q: quit");
        status
    }

    /// Handle input events
    async fn handle_input(&mut self, input: InputEvent) {
        match input {
            InputEvent::Key(key) => {
                // Any key press clears a stale status message
                self.ui_state.status_message = None;

                if !matches!(self.ui_state.modal, Modal::None) {
                    self.handle_modal_key(key).await;
                    return;
                }

                if let Some(cmd) = UserCommand::from_key(key) {
                    self.handle_command(cmd).await;
                }
            }
            InputEvent::Resize(width, height) => {
                self.resize(width, height);
            }
        }
    }

    /// Handle modal key input
    async fn handle_modal_key(&mut self, key: crossterm::event::KeyEvent) {
        use crossterm::event::KeyCode;

        match &mut self.ui_state.modal {
            Modal::Input {
                value, on_submit, ..
            } => match key.code {
                KeyCode::Enter => {
                    let action = on_submit.clone();
                    let value = std::mem::take(value);
                    self.ui_state.modal = Modal::None;
                    self.handle_input_submit(action, value).await;
                }
                KeyCode::Esc => {
                    self.ui_state.modal = Modal::None;
                }
                KeyCode::Backspace => {
                    value.pop();
                }
                KeyCode::Char(c) => {
                    value.push(c);
                }
                _ => {}
            },

            Modal::Confirm { on_confirm, .. } => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    let action = on_confirm.clone();
                    self.ui_state.modal = Modal::None;
                    self.handle_confirm(action).await;
                }
                KeyCode::Esc | KeyCode::Char('n') => {
                    self.ui_state.modal = Modal::None;
                }
                _ => {}
            },

            Modal::Help | Modal::Error { .. } => {
                // Any key closes help/error
                self.ui_state.modal = Modal::None;
            }

            Modal::None => {}
        }
    }

    /// Handle a user command
    async fn handle_command(&mut self, cmd: UserCommand) {
        match cmd {
            UserCommand::FocusNext => self.coordinator.focus_next(),
            UserCommand::FocusPrev => self.coordinator.focus_prev(),
            UserCommand::ScrollUp => {
                if let Some(pane) = self.coordinator.focused_pane_mut() {
                    pane.scroll_up(1);
                }
            }
            UserCommand::ScrollDown => {
                if let Some(pane) = self.coordinator.focused_pane_mut() {
                    pane.scroll_down(1);
                }
            }
            UserCommand::PageUp => {
                if let Some(pane) = self.coordinator.focused_pane_mut() {
                    pane.page_up();
                }
            }
            UserCommand::PageDown => {
                if let Some(pane) = self.coordinator.focused_pane_mut() {
                    pane.page_down();
                }
            }
            UserCommand::ScrollToBottom => {
                if let Some(pane) = self.coordinator.focused_pane_mut() {
                    pane.view.scroll_to_bottom();
                }
            }
            UserCommand::AddChannel => {
                self.ui_state.modal = Modal::Input {
                    title: "Add Channel".to_string(),
                    prompt: "Channel name (with or without #):".to_string(),
                    value: String::new(),
                    on_submit: InputAction::AddChannel,
                };
            }
            UserCommand::RemoveChannel => match self.coordinator.focused_channel() {
                Some(channel) => {
                    self.ui_state.modal = Modal::Confirm {
                        title: "Remove Channel".to_string(),
                        message: format!("Leave {} and discard its history?", channel),
                        on_confirm: ConfirmAction::RemoveChannel {
                            channel: channel.clone(),
                        },
                    };
                }
                None => self.ui_state.status_message = Some("No channel to remove".to_string()),
            },
            UserCommand::Compose => match self.coordinator.focused_channel() {
                Some(channel) => {
                    self.ui_state.modal = Modal::Input {
                        title: format!("Message {}", channel),
                        prompt: "Message (/me for an action):".to_string(),
                        value: String::new(),
                        on_submit: InputAction::SendMessage {
                            channel: channel.clone(),
                        },
                    };
                }
                None => {
                    self.ui_state.status_message =
                        Some("Add a channel first (press a)".to_string());
                }
            },
            UserCommand::ShowHelp => {
                self.ui_state.modal = Modal::Help;
            }
            UserCommand::Quit => {
                self.ui_state.should_quit = true;
            }
        }
    }

    /// Handle input modal submission
    async fn handle_input_submit(&mut self, action: InputAction, value: String) {
        match action {
            InputAction::AddChannel => match self.coordinator.add_channel(&value).await {
                Ok((channel, already_present)) => {
                    if already_present {
                        self.ui_state.status_message =
                            Some(format!("{} is already open", channel));
                    } else {
                        self.ui_state.status_message = Some(format!("Joined {}", channel));
                        self.persist_channels();
                    }
                }
                Err(e) => {
                    self.ui_state.modal = Modal::Error {
                        message: format!("Cannot add channel: {}", e),
                    };
                }
            },
            InputAction::SendMessage { channel } => {
                if let Err(e) = self.coordinator.send_text(channel.as_str(), &value).await {
                    self.ui_state.modal = Modal::Error {
                        message: format!("Cannot send message: {}", e),
                    };
                }
            }
        }
    }

    /// Handle confirmation
    async fn handle_confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::RemoveChannel { channel } => {
                if self.coordinator.remove_channel(channel.as_str()).await {
                    debug!("Removed {} on request", channel);
                    self.ui_state.status_message = Some(format!("Left {}", channel));
                    self.persist_channels();
                }
            }
        }
    }
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    use crate::source::{OfflineSource, ingest_queue};

    fn test_app(dir: &TempDir) -> App {
        let config = Config {
            color_mode: Some(ColorMode::Basic),
            ..Config::default()
        };
        let coordinator = SessionCoordinator::new(
            Arc::new(OfflineSource::new("me")),
            config.max_buffer,
            config.min_pane_width,
        );
        let (_tx, rx) = ingest_queue(8);
        App::new(config, coordinator, rx)
            .with_config_path(Some(dir.path().join("config.toml")))
    }

    fn screen(app: &mut App, width: u16, height: u16) -> Vec<String> {
        app.resize(width, height);
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| (0..width).map(|x| buffer[(x, y)].symbol()).collect())
            .collect()
    }

    async fn type_keys(app: &mut App, text: &str) {
        for c in text.chars() {
            let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
            app.handle_input(InputEvent::Key(key)).await;
        }
    }

    async fn press(app: &mut App, code: KeyCode) {
        app.handle_input(InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .await;
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(50, 50, area);

        // Should be roughly centered
        assert!(centered.x > 0);
        assert!(centered.y > 0);
        assert!(centered.width < area.width);
        assert!(centered.height < area.height);
    }

    #[test]
    fn test_app_ui_state_default() {
        let state = AppUiState::default();
        assert!(matches!(state.modal, Modal::None));
        assert!(state.status_message.is_none());
        assert!(!state.should_quit);
    }

    #[test]
    fn test_empty_session_shows_placeholder() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        let rows = screen(&mut app, 60, 10);

        assert!(rows.iter().any(|r| r.contains("No chat panels available")));
        assert!(rows[9].contains("Channels: 0 (0 visible)"));
    }

    #[tokio::test]
    async fn test_add_channel_through_modal_persists() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        type_keys(&mut app, "a").await;
        assert!(matches!(app.ui_state.modal, Modal::Input { .. }));
        type_keys(&mut app, "#Foo").await;
        press(&mut app, KeyCode::Enter).await;

        assert!(matches!(app.ui_state.modal, Modal::None));
        assert_eq!(app.coordinator().channel_names(), vec!["foo"]);

        let saved = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(saved.channels, vec!["foo"]);

        let rows = screen(&mut app, 60, 10);
        assert!(rows[0].contains("#foo"));
    }

    #[tokio::test]
    async fn test_remove_requires_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.coordinator.add_channel("foo").await.unwrap();

        type_keys(&mut app, "d").await;
        press(&mut app, KeyCode::Esc).await;
        assert_eq!(app.coordinator().channel_count(), 1);

        type_keys(&mut app, "d").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.coordinator().channel_count(), 0);
        assert_eq!(app.coordinator().buffer_count(), 0);
    }

    #[test]
    fn test_ingest_batch_discovers_channels() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.ingest_batch(ChatEvent::new("bar", "bob", "hi"));
        assert_eq!(app.coordinator().channel_names(), vec!["bar"]);

        let saved = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(saved.channels, vec!["bar"]);
    }

    #[tokio::test]
    async fn test_scrolled_pane_holds_still_while_messages_arrive() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.coordinator = SessionCoordinator::new(Arc::new(OfflineSource::new("me")), 20, 40);

        for i in 0..20 {
            app.coordinator.ingest(ChatEvent::new("foo", "bot", format!("msg {:02}", i)));
        }
        // 10 rows: status bar, two borders, seven messages
        let rows = screen(&mut app, 80, 10);
        assert!(rows[1].contains("msg 13"));
        assert!(rows[7].contains("msg 19"));

        type_keys(&mut app, "k").await;
        let scrolled = screen(&mut app, 80, 10);
        assert!(scrolled[1].contains("msg 12"));
        assert!(scrolled[7].contains("msg 18"));

        // At capacity every arrival evicts the oldest message
        for i in 20..25 {
            app.coordinator.ingest(ChatEvent::new("foo", "bot", format!("msg {:02}", i)));
        }
        let pane = app.coordinator().pane(&ChannelId::new("foo")).unwrap();
        assert_eq!(pane.buffer.len(), 20);
        assert_eq!(pane.view.anchor(), Some(7));

        let after = screen(&mut app, 80, 10);
        assert_eq!(after[1..8].to_vec(), scrolled[1..8].to_vec());
        assert!(!after.iter().any(|r| r.contains("msg 24")));
        assert!(after[9].contains("[scrolled, G to follow]"));
        assert!(app.focused_scrolled());

        type_keys(&mut app, "G").await;
        let following = screen(&mut app, 80, 10);
        assert!(following[7].contains("msg 24"));
        assert!(following[1].contains("msg 18"));
        assert!(!app.focused_scrolled());
    }

    #[tokio::test]
    async fn test_unloaded_config_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let original = "max_buffer = \"lots\"\nusername = \"lurker\"\n";
        std::fs::write(&path, original).unwrap();
        assert!(Config::load_from(&path).is_err());

        let mut app = test_app(&dir).with_persistence(false);
        type_keys(&mut app, "a").await;
        type_keys(&mut app, "foo").await;
        press(&mut app, KeyCode::Enter).await;
        app.ingest_batch(ChatEvent::new("bar", "bob", "hi"));

        assert_eq!(app.coordinator().channel_names(), vec!["foo", "bar"]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);

        app.ui_state.status_message = None;
        let rows = screen(&mut app, 120, 10);
        assert!(rows[9].contains("changes not saved"));
    }

    #[tokio::test]
    async fn test_quit_key_sets_flag() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        type_keys(&mut app, "q").await;
        assert!(app.ui_state.should_quit);
    }
}
