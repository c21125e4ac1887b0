//! TUI widgets
//!
//! Custom ratatui widgets for the application:
//! - `ChatPane` - One channel's wrapped, scrollable history

mod chat_pane;

pub use chat_pane::*;
