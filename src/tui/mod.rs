//! Terminal UI module using ratatui
//!
//! Event-driven TUI with:
//! - Side-by-side chat panes, one per visible channel
//! - Status bar with channel and drop counts
//! - Modal overlays for input and confirmation

mod app;
mod event;
mod theme;
mod widgets;

pub use app::*;
pub use event::*;
pub use theme::*;
pub use widgets::*;
