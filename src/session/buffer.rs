//! Per-channel bounded message history

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use super::ChannelId;

/// Default number of messages kept per channel
pub const DEFAULT_MAX_BUFFER: usize = 500;

/// Author name used for locally generated notices
pub const SYSTEM_AUTHOR: &str = "SYSTEM";

/// A single chat line, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub channel: ChannelId,
    pub author: String,
    pub text: String,
    /// `/me` style message
    pub is_action: bool,
    /// Generated locally (moderation notices, adapter failures)
    pub is_system: bool,
    /// Platform tags attached to the message
    pub tags: HashMap<String, String>,
    pub received_at: DateTime<Utc>,
}

impl ChatEvent {
    /// Create a regular chat message
    pub fn new(
        channel: impl Into<ChannelId>,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            author: author.into(),
            text: text.into(),
            is_action: false,
            is_system: false,
            tags: HashMap::new(),
            received_at: Utc::now(),
        }
    }

    /// Create an action (`/me`) message
    pub fn action(
        channel: impl Into<ChannelId>,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            is_action: true,
            ..Self::new(channel, author, text)
        }
    }

    /// Create a system notice shown inline in a pane
    pub fn system(channel: impl Into<ChannelId>, text: impl Into<String>) -> Self {
        Self {
            is_action: true,
            is_system: true,
            ..Self::new(channel, SYSTEM_AUTHOR, text)
        }
    }

    /// Attach platform tags
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Insertion-ordered history for one channel with FIFO eviction
#[derive(Debug, Clone)]
pub struct MessageBuffer {
    events: VecDeque<ChatEvent>,
    capacity: usize,
}

impl MessageBuffer {
    /// Create an empty buffer holding at most `capacity` events
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_MAX_BUFFER)),
            capacity,
        }
    }

    /// Append to the tail, evicting from the head when over capacity
    ///
    /// Returns how many events were evicted.
    pub fn append(&mut self, event: ChatEvent) -> usize {
        self.events.push_back(event);
        self.evict_to_capacity()
    }

    /// Ordered copy of the current contents
    pub fn snapshot(&self) -> Vec<ChatEvent> {
        self.events.iter().cloned().collect()
    }

    /// Borrowing iterator over the contents, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ChatEvent> + ExactSizeIterator {
        self.events.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&ChatEvent> {
        self.events.get(idx)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, truncating from the head if currently over it
    ///
    /// Returns how many events were evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity.max(1);
        self.evict_to_capacity()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn evict_to_capacity(&mut self) -> usize {
        let excess = self.events.len().saturating_sub(self.capacity);
        self.events.drain(..excess);
        excess
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUFFER)
    }
}
