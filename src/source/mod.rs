//! Message sources and the bounded ingestion queue
//!
//! A message source is the network-facing side of the dashboard:
//! - `MessageSource` - join/leave/send operations the session calls
//! - `ingest_queue` - bounded, ordered hand-off from the producer task to the render loop
//! - `TwitchSource` - Twitch chat over IRC
//! - `OfflineSource` - stand-in used when no connection could be made

pub mod irc;
mod twitch;

pub use twitch::*;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::error::SourceError;
use crate::session::{ChannelId, ChatEvent};

/// Default capacity of the ingestion queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Operations the session coordinator needs from a chat connection
///
/// Failures are reported to the caller and never retried here.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Start receiving messages for a channel
    async fn join(&self, channel: &ChannelId) -> Result<(), SourceError>;

    /// Stop receiving messages for a channel
    async fn leave(&self, channel: &ChannelId) -> Result<(), SourceError>;

    /// Post a message to a channel
    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<(), SourceError>;

    /// Close the connection
    async fn disconnect(&self) -> Result<(), SourceError>;

    /// Name our own messages are shown under
    fn nick(&self) -> String;
}

/// Create a bounded ingestion queue
pub fn ingest_queue(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer side of the ingestion queue
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<ChatEvent>,
}

impl EventSender {
    /// Enqueue an event, waiting for room when the queue is full
    ///
    /// Events are never dropped or reordered. Fails once the consumer is gone.
    pub async fn deliver(&self, event: ChatEvent) -> Result<(), SourceError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| SourceError::QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the ingestion queue
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<ChatEvent>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every producer is gone
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        self.rx.recv().await
    }

    /// Take up to `max` events that are already queued, without waiting
    pub fn drain(&mut self, max: usize) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while events.len() < max {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Stop accepting events; producers blocked on a full queue are released
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Source used when the chat server is unreachable
///
/// Every network operation fails with `NotConnected`, which the session
/// turns into inline notices while keeping already buffered messages.
#[derive(Debug, Clone)]
pub struct OfflineSource {
    nick: String,
}

impl OfflineSource {
    pub fn new(nick: impl Into<String>) -> Self {
        Self { nick: nick.into() }
    }
}

#[async_trait]
impl MessageSource for OfflineSource {
    async fn join(&self, _channel: &ChannelId) -> Result<(), SourceError> {
        Err(SourceError::NotConnected)
    }

    async fn leave(&self, _channel: &ChannelId) -> Result<(), SourceError> {
        Err(SourceError::NotConnected)
    }

    async fn send_text(&self, _channel: &ChannelId, _text: &str) -> Result<(), SourceError> {
        Err(SourceError::NotConnected)
    }

    async fn disconnect(&self) -> Result<(), SourceError> {
        Ok(())
    }

    fn nick(&self) -> String {
        self.nick.clone()
    }
}
