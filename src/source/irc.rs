//! IRC line parsing for Twitch chat
//!
//! Handles the IRCv3 message-tags extension Twitch uses to carry display
//! names, colors and timestamps.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::session::ChatEvent;

/// A parsed IRC line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    /// Middle parameters followed by the trailing one, if any
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse one line, without its CRLF terminator
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        let mut tags = HashMap::new();
        if let Some(tagged) = rest.strip_prefix('@') {
            let (raw_tags, remainder) = tagged.split_once(' ')?;
            tags = parse_tags(raw_tags);
            rest = remainder.trim_start();
        }

        let mut prefix = None;
        if let Some(prefixed) = rest.strip_prefix(':') {
            let (raw_prefix, remainder) = prefixed.split_once(' ')?;
            prefix = Some(raw_prefix.to_string());
            rest = remainder.trim_start();
        }

        let (middle, trailing) = match rest.split_once(" :") {
            Some((middle, trailing)) => (middle, Some(trailing)),
            None => (rest, None),
        };

        let mut words = middle.split(' ').filter(|w| !w.is_empty());
        let command = words.next()?.to_ascii_uppercase();
        let mut params: Vec<String> = words.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Some(Self {
            tags,
            prefix,
            command,
            params,
        })
    }

    pub fn param(&self, idx: usize) -> Option<&str> {
        self.params.get(idx).map(String::as_str)
    }

    /// Nick part of a `nick!user@host` prefix
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    /// Server-side send time, when tagged
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        let millis = self.tags.get("tmi-sent-ts")?.parse::<i64>().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    /// Convert a chat-relevant line into an event for a channel pane
    ///
    /// Returns `None` for protocol chatter (PING, numerics, JOIN echoes).
    pub fn to_chat_event(&self) -> Option<ChatEvent> {
        let event = match self.command.as_str() {
            "PRIVMSG" => {
                let channel = self.param(0)?;
                let text = self.param(1).unwrap_or_default();
                let author = self
                    .tags
                    .get("display-name")
                    .filter(|name| !name.is_empty())
                    .map(String::as_str)
                    .or_else(|| self.nick())
                    .unwrap_or("unknown");

                match parse_action(text) {
                    Some(action) => ChatEvent::action(channel, author, action),
                    None => ChatEvent::new(channel, author, text),
                }
            }
            "CLEARCHAT" => {
                let channel = self.param(0)?;
                if self.param(1).is_some() {
                    ChatEvent::system(channel, "A user message was cleared by a moderator")
                } else {
                    ChatEvent::system(channel, "Chat was cleared by a moderator")
                }
            }
            "USERNOTICE" => {
                let channel = self.param(0)?;
                let notice = self.tags.get("system-msg").filter(|m| !m.is_empty())?;
                ChatEvent::system(channel, notice.clone())
            }
            "NOTICE" => {
                let channel = self.param(0).filter(|c| c.starts_with('#'))?;
                ChatEvent::system(channel, self.param(1).unwrap_or_default())
            }
            _ => return None,
        };

        let mut event = event.with_tags(self.tags.clone());
        if let Some(sent_at) = self.sent_at() {
            event.received_at = sent_at;
        }
        Some(event)
    }
}

/// Unwrap a CTCP `ACTION` (`/me`) payload
pub fn parse_action(text: &str) -> Option<&str> {
    text.strip_prefix("\u{1}ACTION ")
        .map(|rest| rest.strip_suffix('\u{1}').unwrap_or(rest))
}

/// Wrap text as a CTCP `ACTION` payload
pub fn format_action(text: &str) -> String {
    format!("\u{1}ACTION {}\u{1}", text)
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), unescape_tag_value(value)),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privmsg_with_tags() {
        let line = "@badge-info=;color=#1E90FF;display-name=SomeUser;tmi-sent-ts=1700000000000 \
                    :someuser!someuser@someuser.tmi.twitch.tv PRIVMSG #channel :hello there :)\r\n";
        let msg = IrcMessage::parse(line).unwrap();

        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.nick(), Some("someuser"));
        assert_eq!(msg.params, vec!["#channel", "hello there :)"]);
        assert_eq!(msg.tags.get("color").unwrap(), "#1E90FF");
        assert_eq!(msg.tags.get("badge-info").unwrap(), "");

        let event = msg.to_chat_event().unwrap();
        assert_eq!(event.channel.as_str(), "channel");
        assert_eq!(event.author, "SomeUser");
        assert_eq!(event.text, "hello there :)");
        assert!(!event.is_action);
        assert_eq!(event.received_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_parse_ping() {
        let msg = IrcMessage::parse("PING :tmi.twitch.tv").unwrap();
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.param(0), Some("tmi.twitch.tv"));
        assert!(msg.prefix.is_none());
        assert!(msg.to_chat_event().is_none());
    }

    #[test]
    fn test_action_message() {
        let line = ":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :\u{1}ACTION waves\u{1}";
        let event = IrcMessage::parse(line).unwrap().to_chat_event().unwrap();
        assert!(event.is_action);
        assert_eq!(event.text, "waves");
        assert_eq!(event.author, "bob");
    }

    #[test]
    fn test_clearchat_notices() {
        let user = IrcMessage::parse(":tmi.twitch.tv CLEARCHAT #chan :troll").unwrap();
        let event = user.to_chat_event().unwrap();
        assert!(event.is_system);
        assert_eq!(event.text, "A user message was cleared by a moderator");

        let all = IrcMessage::parse(":tmi.twitch.tv CLEARCHAT #chan").unwrap();
        assert_eq!(
            all.to_chat_event().unwrap().text,
            "Chat was cleared by a moderator"
        );
    }

    #[test]
    fn test_usernotice_uses_system_msg() {
        let line = "@system-msg=viewer\\ssubscribed\\sfor\\s3\\smonths :tmi.twitch.tv USERNOTICE #chan";
        let event = IrcMessage::parse(line).unwrap().to_chat_event().unwrap();
        assert!(event.is_system);
        assert_eq!(event.text, "viewer subscribed for 3 months");
    }

    #[test]
    fn test_global_notice_is_ignored() {
        let line = ":tmi.twitch.tv NOTICE * :Login authentication failed";
        assert!(IrcMessage::parse(line).unwrap().to_chat_event().is_none());
    }

    #[test]
    fn test_unescape_tag_value() {
        assert_eq!(unescape_tag_value("a\\sb\\:c\\\\d"), "a b;c\\d");
        assert_eq!(unescape_tag_value("trailing\\"), "trailing");
    }

    #[test]
    fn test_action_roundtrip_helpers() {
        assert_eq!(parse_action(&format_action("dances")), Some("dances"));
        assert_eq!(parse_action("plain"), None);
    }

    #[test]
    fn test_rejects_empty_lines() {
        assert!(IrcMessage::parse("").is_none());
        assert!(IrcMessage::parse("@only-tags").is_none());
    }
}
