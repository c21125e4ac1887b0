//! Event handling for the TUI
//!
//! Provides an async event stream that combines:
//! - Terminal input events (keyboard, resize)
//! - Render ticks
//!
//! Chat traffic arrives separately through the ingestion queue.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyModifiers};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

/// Application events
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Terminal input event
    Input(InputEvent),
    /// Render tick
    Tick,
    /// Request to quit the application
    Quit,
}

/// Input events from the terminal
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Key press
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
}

/// User commands triggered by input outside of modals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Focus the next visible pane
    FocusNext,
    /// Focus the previous visible pane
    FocusPrev,
    /// Scroll focused pane one message towards older history
    ScrollUp,
    /// Scroll focused pane one message towards newer history
    ScrollDown,
    /// Half page towards older history
    PageUp,
    /// Half page towards newer history
    PageDown,
    /// Return focused pane to the latest message
    ScrollToBottom,
    /// Prompt for a channel to add
    AddChannel,
    /// Confirm removal of the focused channel
    RemoveChannel,
    /// Prompt for a message to the focused channel
    Compose,
    /// Show help
    ShowHelp,
    /// Quit application
    Quit,
}

impl UserCommand {
    /// Convert a key event to a user command
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        match (key.code, key.modifiers) {
            // Focus
            (KeyCode::Tab, KeyModifiers::NONE) => Some(UserCommand::FocusNext),
            (KeyCode::BackTab, _) | (KeyCode::Tab, KeyModifiers::SHIFT) => {
                Some(UserCommand::FocusPrev)
            }
            (KeyCode::Right, _) | (KeyCode::Char('l'), KeyModifiers::NONE) => {
                Some(UserCommand::FocusNext)
            }
            (KeyCode::Left, _) | (KeyCode::Char('h'), KeyModifiers::NONE) => {
                Some(UserCommand::FocusPrev)
            }

            // Scrolling
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                Some(UserCommand::ScrollUp)
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                Some(UserCommand::ScrollDown)
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => Some(UserCommand::PageUp),
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => Some(UserCommand::PageDown),
            (KeyCode::PageUp, _) => Some(UserCommand::PageUp),
            (KeyCode::PageDown, _) => Some(UserCommand::PageDown),
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => Some(UserCommand::ScrollToBottom),

            // Channel management
            (KeyCode::Char('a'), KeyModifiers::NONE) => Some(UserCommand::AddChannel),
            (KeyCode::Char('d'), KeyModifiers::NONE) => Some(UserCommand::RemoveChannel),
            (KeyCode::Char('m'), KeyModifiers::NONE) | (KeyCode::Enter, _) => {
                Some(UserCommand::Compose)
            }

            // Help and quit
            (KeyCode::Char('?'), _) => Some(UserCommand::ShowHelp),
            (KeyCode::Char('q'), KeyModifiers::NONE) => Some(UserCommand::Quit),
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(UserCommand::Quit),

            _ => None,
        }
    }
}

/// Event loop handle
pub struct EventLoop {
    /// Sender for events
    tx: mpsc::Sender<AppEvent>,
    /// Receiver for events
    rx: mpsc::Receiver<AppEvent>,
}

impl EventLoop {
    /// Create a new event loop
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(256);
        Self { tx, rx }
    }

    /// Get a sender for posting events
    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.tx.clone()
    }

    /// Start the event loop
    ///
    /// This spawns background tasks for:
    /// - Terminal input
    /// - Render ticks
    pub fn start(&mut self, tick_rate: Duration) {
        let tx = self.tx.clone();

        // Terminal input task - single long-running reader
        tokio::spawn(async move {
            let mut reader = EventStream::new();

            loop {
                let event = reader.next().fuse().await;

                match event {
                    Some(Ok(event)) => {
                        let app_event = match event {
                            CrosstermEvent::Key(key) => AppEvent::Input(InputEvent::Key(key)),
                            CrosstermEvent::Resize(w, h) => {
                                AppEvent::Input(InputEvent::Resize(w, h))
                            }
                            _ => continue,
                        };

                        if tx.send(app_event).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("Error reading terminal event: {}", e);
                        continue;
                    }
                    None => break,
                }
            }
        });

        // Render tick task
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_rate);

            loop {
                interval.tick().await;
                if tx.send(AppEvent::Tick).await.is_err() {
                    break;
                }
            }
        });
    }

    /// Receive the next event
    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Option<UserCommand> {
        UserCommand::from_key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_key_to_command() {
        assert_eq!(
            key(KeyCode::Char('k'), KeyModifiers::NONE),
            Some(UserCommand::ScrollUp)
        );
        assert_eq!(
            key(KeyCode::Down, KeyModifiers::NONE),
            Some(UserCommand::ScrollDown)
        );
        assert_eq!(
            key(KeyCode::Tab, KeyModifiers::NONE),
            Some(UserCommand::FocusNext)
        );
        assert_eq!(
            key(KeyCode::BackTab, KeyModifiers::SHIFT),
            Some(UserCommand::FocusPrev)
        );
        assert_eq!(
            key(KeyCode::Char('G'), KeyModifiers::SHIFT),
            Some(UserCommand::ScrollToBottom)
        );
        assert_eq!(
            key(KeyCode::Char('q'), KeyModifiers::NONE),
            Some(UserCommand::Quit)
        );
    }

    #[test]
    fn test_control_keys_differ_from_plain() {
        assert_eq!(
            key(KeyCode::Char('d'), KeyModifiers::NONE),
            Some(UserCommand::RemoveChannel)
        );
        assert_eq!(
            key(KeyCode::Char('d'), KeyModifiers::CONTROL),
            Some(UserCommand::PageDown)
        );
        assert_eq!(
            key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(UserCommand::Quit)
        );
        assert_eq!(key(KeyCode::Char('x'), KeyModifiers::NONE), None);
    }

    #[tokio::test]
    async fn test_posted_events_are_received() {
        let mut events = EventLoop::new();
        events.sender().send(AppEvent::Quit).await.unwrap();
        assert!(matches!(events.next().await, Some(AppEvent::Quit)));
    }
}
