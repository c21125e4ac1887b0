//! Channel identity and the ordered registry of joined channels

use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker character chat platforms prefix channel names with on the wire
pub const CHANNEL_MARKER: char = '#';

/// Normalized channel identifier
///
/// Stored lower-cased and without the leading marker, so `#Foo`, `foo` and
/// `FOO` all compare equal. `Display` re-adds the marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Normalize a raw channel name
    ///
    /// Idempotent: `ChannelId::new(ChannelId::new(x).as_str()) == ChannelId::new(x)`,
    /// and also when fed the marked `Display` form.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let name = raw
            .as_ref()
            .trim_start_matches(|c: char| c == CHANNEL_MARKER || c.is_whitespace())
            .trim_end()
            .to_lowercase();
        Self(name)
    }

    /// Bare name without the marker
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name with the marker, as the IRC protocol expects it
    pub fn to_wire(&self) -> String {
        format!("{}{}", CHANNEL_MARKER, self.0)
    }

    /// A channel id is usable only if something remains after normalization
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && !self.0.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CHANNEL_MARKER, self.0)
    }
}

impl From<String> for ChannelId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for ChannelId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

/// Ordered, deduplicated set of joined channels
///
/// Insertion order decides the left-to-right pane order.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: Vec<ChannelId>,
}

impl ChannelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw channel name
    pub fn normalize(raw: &str) -> ChannelId {
        ChannelId::new(raw)
    }

    /// Append a channel if absent
    ///
    /// Returns the normalized id and whether it was already registered.
    pub fn add(&mut self, raw: &str) -> (ChannelId, bool) {
        let id = Self::normalize(raw);
        if self.contains(&id) {
            return (id, true);
        }
        self.channels.push(id.clone());
        (id, false)
    }

    /// Remove a channel, keeping the order of the rest
    pub fn remove(&mut self, raw: &str) -> bool {
        let id = Self::normalize(raw);
        match self.channels.iter().position(|c| *c == id) {
            Some(idx) => {
                self.channels.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the registered channels in order
    pub fn list(&self) -> Vec<ChannelId> {
        self.channels.clone()
    }

    pub fn contains(&self, id: &ChannelId) -> bool {
        self.channels.contains(id)
    }

    /// Position of a channel in pane order
    pub fn position(&self, id: &ChannelId) -> Option<usize> {
        self.channels.iter().position(|c| c == id)
    }

    pub fn get(&self, idx: usize) -> Option<&ChannelId> {
        self.channels.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
