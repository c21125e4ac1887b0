//! Chat pane widget
//!
//! Draws one channel's history inside a bordered block. Messages are word
//! wrapped to the pane width; while the pane follows the latest message the
//! newest lines sit at the bottom, otherwise drawing starts at the anchored
//! message. What was actually drawn is fed back into the pane's view state.

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::session::{ChannelId, ChatEvent, MessageBuffer, PaneViewState};
use crate::tui::Theme;

/// Widget for a single channel pane
pub struct ChatPane<'a> {
    channel: &'a ChannelId,
    buffer: &'a MessageBuffer,
    view: &'a mut PaneViewState,
    theme: &'a Theme,
    show_timestamps: bool,
}

impl<'a> ChatPane<'a> {
    pub fn new(
        channel: &'a ChannelId,
        buffer: &'a MessageBuffer,
        view: &'a mut PaneViewState,
        theme: &'a Theme,
    ) -> Self {
        Self {
            channel,
            buffer,
            view,
            theme,
            show_timestamps: true,
        }
    }

    /// Prefix each message with its local `HH:MM` time
    pub fn show_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    fn block(&self) -> Block<'a> {
        let focused = self.view.focused;
        let mut title = format!(" {} ", self.channel);
        if !self.view.is_following() {
            title.push_str("[scrolled] ");
        }

        Block::default()
            .title(Span::styled(title, self.theme.title(focused)))
            .borders(Borders::ALL)
            .border_style(if focused {
                self.theme.border_focused()
            } else {
                self.theme.border_unfocused()
            })
    }

    fn lines_for(&self, event: &ChatEvent, width: usize) -> Vec<Line<'static>> {
        wrap_message(event, self.theme, width, self.show_timestamps)
    }
}

impl Widget for ChatPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();
        let inner = block.inner(area);
        block.render(area, buf);

        let width = usize::from(inner.width);
        let height = usize::from(inner.height);
        let len = self.buffer.len();
        if width == 0 || height == 0 || len == 0 {
            self.view.record_render(0, true);
            return;
        }

        let (first_drawn, reached_end, lines) = match self.view.anchor() {
            None => {
                // Newest first, until the body is full
                let mut chunks = Vec::new();
                let mut total = 0;
                let mut first = len;
                for (idx, event) in self.buffer.iter().enumerate().rev() {
                    let lines = self.lines_for(event, width);
                    total += lines.len();
                    chunks.push(lines);
                    first = idx;
                    if total >= height {
                        break;
                    }
                }
                let mut lines: Vec<Line<'static>> = chunks.into_iter().rev().flatten().collect();
                let overflow = lines.len().saturating_sub(height);
                lines.drain(..overflow);
                (first, true, lines)
            }
            Some(top) => {
                let top = top.min(len - 1);
                let mut lines = Vec::new();
                let mut last = top;
                for (idx, event) in self.buffer.iter().enumerate().skip(top) {
                    if lines.len() >= height {
                        break;
                    }
                    lines.extend(self.lines_for(event, width));
                    last = idx;
                }
                let reached_end = last == len - 1 && lines.len() <= height;
                lines.truncate(height);
                (top, reached_end, lines)
            }
        };

        self.view.record_render(first_drawn, reached_end);

        // Bottom-align while following so the newest line sits on the last row
        let mut body = inner;
        if self.view.is_following() && lines.len() < height {
            let pad = (height - lines.len()) as u16;
            body.y += pad;
            body.height -= pad;
        }
        Paragraph::new(lines).render(body, buf);
    }
}

/// Format one message and wrap it to `width` columns
///
/// Words are kept whole when they fit on a line; longer words are split at
/// character boundaries using display width, so wide glyphs never straddle
/// the pane edge.
pub fn wrap_message(
    event: &ChatEvent,
    theme: &Theme,
    width: usize,
    show_timestamps: bool,
) -> Vec<Line<'static>> {
    let mut segments: Vec<(String, Style)> = Vec::new();
    if show_timestamps {
        let time = event.received_at.with_timezone(&Local).format("%H:%M ");
        segments.push((time.to_string(), theme.timestamp()));
    }

    if event.is_system {
        segments.push((event.text.clone(), theme.system()));
    } else if event.is_action {
        segments.push((format!("* {} ", event.author), theme.action()));
        segments.push((event.text.clone(), theme.action()));
    } else {
        segments.push((event.author.clone(), theme.author()));
        segments.push((": ".to_string(), theme.text()));
        segments.push((event.text.clone(), theme.text()));
    }

    wrap_segments(&segments, width)
}

fn wrap_segments(segments: &[(String, Style)], width: usize) -> Vec<Line<'static>> {
    let mut wrapper = Wrapper::new(width.max(1));
    for (text, style) in segments {
        for (token, is_space) in tokens(text) {
            wrapper.push_token(token, is_space, *style);
        }
    }
    wrapper.finish()
}

/// Split text into alternating runs of whitespace and non-whitespace
fn tokens(text: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != is_space => {
                out.push((&text[start..idx], prev));
                start = idx;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }
    if let Some(prev) = in_space {
        out.push((&text[start..], prev));
    }
    out
}

struct Wrapper {
    width: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    used: usize,
    /// Whitespace held back until the next word is placed
    pending: Option<(String, usize, Style)>,
}

impl Wrapper {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: Vec::new(),
            used: 0,
            pending: None,
        }
    }

    fn push_token(&mut self, token: &str, is_space: bool, style: Style) {
        let token_width = token.width();

        if is_space {
            // Whitespace never starts a wrapped line
            if self.used == 0 && !self.lines.is_empty() {
                return;
            }
            match &mut self.pending {
                Some((text, width, _)) => {
                    text.push_str(token);
                    *width += token_width;
                }
                None => self.pending = Some((token.to_string(), token_width, style)),
            }
            return;
        }

        let pending_width = self.pending.as_ref().map_or(0, |(_, width, _)| *width);
        if self.used + pending_width + token_width <= self.width {
            self.flush_pending();
            self.push_span(token.to_string(), token_width, style);
            return;
        }
        if token_width <= self.width {
            self.break_line();
            self.push_span(token.to_string(), token_width, style);
            return;
        }
        if self.used + pending_width < self.width {
            self.flush_pending();
        } else if self.used > 0 {
            self.break_line();
        } else {
            self.pending = None;
        }

        let mut piece = String::new();
        let mut piece_width = 0;
        for ch in token.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if self.used + piece_width + ch_width > self.width && self.used + piece_width > 0 {
                let full = std::mem::take(&mut piece);
                self.push_span(full, piece_width, style);
                piece_width = 0;
                self.break_line();
            }
            piece.push(ch);
            piece_width += ch_width;
        }
        if !piece.is_empty() {
            self.push_span(piece, piece_width, style);
        }
    }

    fn push_span(&mut self, text: String, width: usize, style: Style) {
        if text.is_empty() {
            return;
        }
        self.current.push(Span::styled(text, style));
        self.used += width;
    }

    fn flush_pending(&mut self) {
        if let Some((text, width, style)) = self.pending.take() {
            self.push_span(text, width, style);
        }
    }

    /// Start a new line, dropping any held-back whitespace
    fn break_line(&mut self) {
        self.pending = None;
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
        self.used = 0;
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol())
            .collect::<String>()
    }

    fn filled(n: usize) -> MessageBuffer {
        let mut buffer = MessageBuffer::new(50);
        for i in 0..n {
            buffer.append(ChatEvent::new("chan", "u", format!("m{}", i)));
        }
        buffer
    }

    #[test]
    fn test_wrap_keeps_words_whole() {
        let theme = Theme::basic();
        let event = ChatEvent::new("chan", "bob", "hello wide world");
        let lines: Vec<_> = wrap_message(&event, &theme, 12, false)
            .iter()
            .map(line_text)
            .collect();
        assert_eq!(lines, vec!["bob: hello", "wide world"]);
    }

    #[test]
    fn test_wrap_splits_long_words_by_display_width() {
        let theme = Theme::basic();
        let event = ChatEvent::system("chan", "日本語テキスト");
        let lines: Vec<_> = wrap_message(&event, &theme, 5, false)
            .iter()
            .map(line_text)
            .collect();
        assert_eq!(lines, vec!["日本", "語テ", "キス", "ト"]);
        for line in &lines {
            assert!(line.width() <= 5);
        }
    }

    #[test]
    fn test_action_format() {
        let theme = Theme::basic();
        let event = ChatEvent::action("chan", "bob", "waves");
        let lines = wrap_message(&event, &theme, 40, false);
        assert_eq!(line_text(&lines[0]), "* bob waves");
    }

    #[test]
    fn test_following_pane_shows_newest_at_bottom() {
        let theme = Theme::basic();
        let channel = ChannelId::new("chan");
        let buffer = filled(10);
        let mut view = PaneViewState::new();
        let area = Rect::new(0, 0, 20, 5);
        let mut buf = Buffer::empty(area);

        ChatPane::new(&channel, &buffer, &mut view, &theme)
            .show_timestamps(false)
            .render(area, &mut buf);

        assert!(row(&buf, 0).contains("#chan"));
        assert!(row(&buf, 1).contains("u: m7"));
        assert!(row(&buf, 3).contains("u: m9"));
        assert_eq!(view.anchor(), None);
    }

    #[test]
    fn test_short_history_is_bottom_aligned() {
        let theme = Theme::basic();
        let channel = ChannelId::new("chan");
        let buffer = filled(1);
        let mut view = PaneViewState::new();
        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);

        ChatPane::new(&channel, &buffer, &mut view, &theme)
            .show_timestamps(false)
            .render(area, &mut buf);

        assert!(row(&buf, 4).contains("u: m0"));
        assert!(!row(&buf, 1).contains("m0"));
    }

    #[test]
    fn test_scrolled_pane_draws_from_anchor() {
        let theme = Theme::basic();
        let channel = ChannelId::new("chan");
        let buffer = filled(10);
        let mut view = PaneViewState::new();
        let area = Rect::new(0, 0, 30, 5);

        // First render establishes what is on screen, then scroll up one
        let mut buf = Buffer::empty(area);
        ChatPane::new(&channel, &buffer, &mut view, &theme)
            .show_timestamps(false)
            .render(area, &mut buf);
        view.scroll_up(1, buffer.len());
        assert_eq!(view.anchor(), Some(6));

        let mut buf = Buffer::empty(area);
        ChatPane::new(&channel, &buffer, &mut view, &theme)
            .show_timestamps(false)
            .render(area, &mut buf);

        assert!(row(&buf, 0).contains("[scrolled]"));
        assert!(row(&buf, 1).contains("u: m6"));
        assert!(row(&buf, 3).contains("u: m8"));
    }

    #[test]
    fn test_empty_buffer_renders_frame_only() {
        let theme = Theme::basic();
        let channel = ChannelId::new("quiet");
        let buffer = MessageBuffer::new(5);
        let mut view = PaneViewState::new();
        let area = Rect::new(0, 0, 20, 4);
        let mut buf = Buffer::empty(area);

        ChatPane::new(&channel, &buffer, &mut view, &theme).render(area, &mut buf);

        assert!(row(&buf, 0).contains("#quiet"));
        assert_eq!(row(&buf, 1).trim_matches(|c| c == '│' || c == ' '), "");
    }
}
