//! Chatlurk - a terminal dashboard for watching several live chat channels
//!
//! Each tracked channel gets its own pane; panes are tiled side by side and
//! as many are shown as the terminal width allows.
//!
//! # Architecture
//!
//! - A network task reads chat traffic and pushes events into a bounded queue
//! - The render loop drains the queue in batches and owns all session state,
//!   so registry, buffers and layout are only ever touched from one task
//!
//! # Modules
//!
//! - [`session`] - Channel registry, message buffers, pane layout and coordination
//! - [`source`] - Message sources (Twitch IRC) and the ingestion queue
//! - [`tui`] - Event-driven terminal UI with ratatui
//! - [`config`] - Layered configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod session;
pub mod source;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{ChannelId, ChannelRegistry, ChatEvent, LayoutEngine, MessageBuffer, SessionCoordinator};
pub use source::{MessageSource, ingest_queue};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
