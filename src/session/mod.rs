//! Pane/session management core
//!
//! - `ChannelRegistry` - Ordered, deduplicated set of joined channels
//! - `MessageBuffer` - Bounded per-channel history
//! - `LayoutEngine` - Terminal geometry to pane count and placement
//! - `SessionCoordinator` - Keeps the three in sync

mod buffer;
mod channel;
mod coordinator;
mod layout;
mod pane;

pub use buffer::*;
pub use channel::*;
pub use coordinator::*;
pub use layout::*;
pub use pane::*;
