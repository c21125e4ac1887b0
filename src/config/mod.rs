//! Configuration module
//!
//! Handles:
//! - User configuration (`config.toml` in the platform config directory)
//! - `CHATLURK_*` environment overrides
//! - Writing the channel list back when it changes

mod settings;

pub use settings::*;
