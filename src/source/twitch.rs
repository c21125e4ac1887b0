//! Twitch chat over IRC
//!
//! One TCP connection per dashboard. A reader task parses incoming lines,
//! answers keep-alive pings and delivers chat events into the ingestion
//! queue, waiting whenever the queue is full.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::irc::{IrcMessage, format_action};
use super::{EventSender, MessageSource};
use crate::error::SourceError;
use crate::session::{ChannelId, ChatEvent};

/// Default Twitch chat endpoint
pub const DEFAULT_SERVER: &str = "irc.chat.twitch.tv:6667";

/// Default timeout for connecting and for individual writes
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

type SharedWriter = Arc<Mutex<Option<OwnedWriteHalf>>>;

/// Login details; anonymous read-only access when either part is missing
#[derive(Debug, Clone, Default)]
pub struct TwitchCredentials {
    pub username: Option<String>,
    pub oauth_token: Option<String>,
}

impl TwitchCredentials {
    pub fn new(username: Option<String>, oauth_token: Option<String>) -> Self {
        Self {
            username,
            oauth_token,
        }
    }

    fn is_authenticated(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self.oauth_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Message source backed by a Twitch IRC connection
pub struct TwitchSource {
    nick: String,
    authenticated: bool,
    writer: SharedWriter,
    joined: Arc<Mutex<HashSet<ChannelId>>>,
    reader: std::sync::Mutex<Option<JoinHandle<()>>>,
    io_timeout: Duration,
}

impl TwitchSource {
    /// Connect, log in and start delivering events to `events`
    #[instrument(skip(credentials, events))]
    pub async fn connect(
        server: &str,
        credentials: TwitchCredentials,
        events: EventSender,
        io_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let stream = timeout(io_timeout, TcpStream::connect(server))
            .await
            .map_err(|_| SourceError::Timeout(io_timeout))?
            .map_err(|e| SourceError::ConnectFailed(e.to_string()))?;
        let (read_half, write_half) = stream.into_split();
        let writer: SharedWriter = Arc::new(Mutex::new(Some(write_half)));

        let authenticated = credentials.is_authenticated();
        let nick = match (&credentials.username, authenticated) {
            (Some(username), true) => username.to_lowercase(),
            _ => anonymous_nick(),
        };

        write_line(&writer, "CAP REQ :twitch.tv/tags twitch.tv/commands", io_timeout).await?;
        if let (true, Some(token)) = (authenticated, credentials.oauth_token.as_deref()) {
            let token = if token.starts_with("oauth:") {
                token.to_string()
            } else {
                format!("oauth:{}", token)
            };
            write_line(&writer, &format!("PASS {}", token), io_timeout).await?;
        }
        write_line(&writer, &format!("NICK {}", nick), io_timeout).await?;

        info!(
            "Connected to {} as {}{}",
            server,
            nick,
            if authenticated { "" } else { " (read-only)" }
        );

        let joined = Arc::new(Mutex::new(HashSet::new()));
        let reader = tokio::spawn(read_loop(
            read_half,
            writer.clone(),
            joined.clone(),
            events,
            io_timeout,
        ));

        Ok(Self {
            nick,
            authenticated,
            writer,
            joined,
            reader: std::sync::Mutex::new(Some(reader)),
            io_timeout,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

#[async_trait]
impl MessageSource for TwitchSource {
    #[instrument(skip(self))]
    async fn join(&self, channel: &ChannelId) -> Result<(), SourceError> {
        let mut joined = self.joined.lock().await;
        if joined.contains(channel) {
            return Ok(());
        }
        write_line(&self.writer, &format!("JOIN {}", channel.to_wire()), self.io_timeout).await?;
        joined.insert(channel.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn leave(&self, channel: &ChannelId) -> Result<(), SourceError> {
        let mut joined = self.joined.lock().await;
        if !joined.remove(channel) {
            return Ok(());
        }
        write_line(&self.writer, &format!("PART {}", channel.to_wire()), self.io_timeout).await
    }

    #[instrument(skip(self, text))]
    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<(), SourceError> {
        if !self.authenticated {
            return Err(SourceError::SendFailed(
                "anonymous connections are read-only; set username and oauth_token".to_string(),
            ));
        }

        let text: String = text.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        let payload = match text.strip_prefix("/me ") {
            Some(action) => format_action(action),
            None => text,
        };
        write_line(
            &self.writer,
            &format!("PRIVMSG {} :{}", channel.to_wire(), payload),
            self.io_timeout,
        )
        .await
    }

    async fn disconnect(&self) -> Result<(), SourceError> {
        // Best effort: the server may already be gone
        let _ = write_line(&self.writer, "QUIT", self.io_timeout).await;
        self.writer.lock().await.take();

        let handle = self.reader.lock().ok().and_then(|mut reader| reader.take());
        if let Some(handle) = handle {
            handle.abort();
        }
        self.joined.lock().await.clear();

        info!("Disconnected from chat server");
        Ok(())
    }

    fn nick(&self) -> String {
        self.nick.clone()
    }
}

/// Read lines until the connection or the queue closes
async fn read_loop(
    read_half: OwnedReadHalf,
    writer: SharedWriter,
    joined: Arc<Mutex<HashSet<ChannelId>>>,
    events: EventSender,
    io_timeout: Duration,
) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Chat server closed the connection");
                break;
            }
            Err(e) => {
                warn!("Error reading from chat server: {}", e);
                break;
            }
        };

        let Some(msg) = IrcMessage::parse(&line) else {
            continue;
        };

        match msg.command.as_str() {
            "PING" => {
                let token = msg.param(0).unwrap_or("tmi.twitch.tv");
                if let Err(e) = write_line(&writer, &format!("PONG :{}", token), io_timeout).await {
                    warn!("Failed to answer PING: {}", e);
                }
                continue;
            }
            "RECONNECT" => {
                warn!("Chat server requested a reconnect");
                continue;
            }
            "NOTICE" if msg.param(0) == Some("*") => {
                warn!("Server notice: {}", msg.param(1).unwrap_or_default());
                continue;
            }
            _ => {}
        }

        if let Some(event) = msg.to_chat_event() {
            if events.deliver(event).await.is_err() {
                debug!("Ingestion queue closed, stopping reader");
                return;
            }
        }
    }

    // Tell every joined pane the feed stopped; buffered history stays
    writer.lock().await.take();
    let channels: Vec<ChannelId> = joined.lock().await.drain().collect();
    for channel in channels {
        let notice = ChatEvent::system(channel, "Disconnected from chat server");
        if events.deliver(notice).await.is_err() {
            break;
        }
    }
}

async fn write_line(writer: &SharedWriter, line: &str, io_timeout: Duration) -> Result<(), SourceError> {
    let mut guard = writer.lock().await;
    let stream = guard.as_mut().ok_or(SourceError::NotConnected)?;

    let mut bytes = Vec::with_capacity(line.len() + 2);
    bytes.extend_from_slice(line.as_bytes());
    bytes.extend_from_slice(b"\r\n");

    timeout(io_timeout, stream.write_all(&bytes))
        .await
        .map_err(|_| SourceError::Timeout(io_timeout))?
        .map_err(|e| SourceError::SendFailed(e.to_string()))
}

/// Twitch accepts any `justinfan<digits>` nick without a password
fn anonymous_nick() -> String {
    format!("justinfan{}", 10_000 + Utc::now().timestamp_subsec_micros() % 90_000)
}
