//! Error types for chatlurk
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `Display` and `Error` impls.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for chatlurk
#[derive(Error, Debug)]
pub enum Error {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Message source error: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TUI error: {0}")]
    Tui(#[from] TuiError),
}

/// Session (pane/channel management) errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid channel name '{0}'")]
    InvalidChannel(String),
}

/// Message source adapter errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Not connected to the chat server")]
    NotConnected,

    #[error("Failed to connect: {0}")]
    ConnectFailed(String),

    #[error("Chat server did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Failed to send to chat server: {0}")]
    SendFailed(String),

    #[error("Ingestion queue closed")]
    QueueClosed,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to create config directory: {0}")]
    DirectoryCreationFailed(PathBuf),
}

/// TUI-related errors
#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Failed to initialize terminal: {0}")]
    InitFailed(String),

    #[error("Failed to restore terminal: {0}")]
    RestoreFailed(String),

    #[error("Render error: {0}")]
    RenderError(String),
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
