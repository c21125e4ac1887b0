//! Session coordinator - owns channels, their histories and the pane layout
//!
//! Every mutation runs to completion on the render loop's task, so the
//! renderer always sees a consistent registry, buffer map and geometry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ratatui::layout::Rect;
use tracing::{debug, info, instrument, warn};

use super::{
    ChannelId, ChannelRegistry, ChatEvent, LayoutEngine, LayoutState, MessageBuffer,
    PaneViewState,
};
use crate::error::{Result, SessionError, SourceError};
use crate::source::MessageSource;

/// A channel's history together with its view state
#[derive(Debug, Clone)]
pub struct ChannelPane {
    pub buffer: MessageBuffer,
    pub view: PaneViewState,
}

impl ChannelPane {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: MessageBuffer::new(capacity),
            view: PaneViewState::new(),
        }
    }

    /// Append and keep the view consistent with head eviction
    fn push(&mut self, event: ChatEvent) -> usize {
        let evicted = self.buffer.append(event);
        self.view.on_append(evicted);
        evicted
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.view.scroll_up(n, self.buffer.len());
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.view.scroll_down(n, self.buffer.len());
    }

    pub fn page_up(&mut self) {
        self.view.page_up(self.buffer.len());
    }

    pub fn page_down(&mut self) {
        self.view.page_down(self.buffer.len());
    }
}

/// Outcome of [`SessionCoordinator::ingest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingested {
    Appended {
        channel: ChannelId,
        /// The channel was not tracked before this event
        discovered: bool,
        evicted: usize,
    },
    /// The event carried no usable channel
    Dropped,
}

/// Coordinates the channel registry, per-channel buffers and layout
pub struct SessionCoordinator {
    registry: ChannelRegistry,
    panes: HashMap<ChannelId, ChannelPane>,
    layout: LayoutEngine,
    source: Arc<dyn MessageSource>,
    /// Capacity given to buffers when they are created
    max_buffer: usize,
    focused: Option<ChannelId>,
    dropped_events: u64,
    /// Set by any change the renderer should pick up
    dirty: bool,
}

impl SessionCoordinator {
    /// Create an empty session
    pub fn new(source: Arc<dyn MessageSource>, max_buffer: usize, min_pane_width: u16) -> Self {
        Self {
            registry: ChannelRegistry::new(),
            panes: HashMap::new(),
            layout: LayoutEngine::new(min_pane_width),
            source,
            max_buffer,
            focused: None,
            dropped_events: 0,
            dirty: true,
        }
    }

    /// Route an inbound event to its channel's buffer
    ///
    /// Unknown channels are tracked on first sight. Never blocks and never
    /// touches the message source.
    pub fn ingest(&mut self, event: ChatEvent) -> Ingested {
        let channel = event.channel.clone();
        if !channel.is_valid() {
            self.dropped_events += 1;
            warn!(
                "Dropping event without a usable channel from '{}' ({} dropped so far)",
                event.author, self.dropped_events
            );
            return Ingested::Dropped;
        }

        let discovered = !self.panes.contains_key(&channel);
        if discovered {
            info!("Auto-discovered channel {}", channel);
            self.track(&channel);
        }

        let evicted = match self.panes.get_mut(&channel) {
            Some(pane) => pane.push(event),
            None => 0,
        };
        if evicted > 0 {
            debug!("Evicted {} old messages from {}", evicted, channel);
        }
        self.dirty = true;

        Ingested::Appended {
            channel,
            discovered,
            evicted,
        }
    }

    /// Register a channel, ask the source to join it and make its pane visible
    ///
    /// Adding a channel that is already tracked changes nothing locally, but
    /// the join is still requested so a failed join can be retried.
    #[instrument(skip(self))]
    pub async fn add_channel(&mut self, raw: &str) -> Result<(ChannelId, bool)> {
        let id = ChannelId::new(raw);
        if !id.is_valid() {
            return Err(SessionError::InvalidChannel(raw.to_string()).into());
        }

        let already_present = self.registry.contains(&id) && self.panes.contains_key(&id);
        if !already_present {
            self.track(&id);
            info!("Added channel {}", id);
        }

        if let Err(e) = self.source.join(&id).await {
            self.report_failure(&id, "join", e);
        }

        self.dirty = true;
        Ok((id, already_present))
    }

    /// Leave a channel and drop its history
    ///
    /// Returns whether the channel was tracked; unknown channels are a no-op.
    #[instrument(skip(self))]
    pub async fn remove_channel(&mut self, raw: &str) -> bool {
        let id = ChannelId::new(raw);
        if !self.registry.contains(&id) {
            debug!("Ignoring removal of untracked channel {}", id);
            return false;
        }

        if let Err(e) = self.source.leave(&id).await {
            warn!("Failed to leave {}: {}", id, e);
        }

        self.registry.remove(id.as_str());
        self.panes.remove(&id);
        self.apply_geometry();
        self.repair_focus();
        self.dirty = true;

        info!("Removed channel {}", id);
        true
    }

    /// Post a message to a channel
    ///
    /// Successful sends are echoed into the pane; failures show up as an
    /// inline notice. Blank messages are ignored.
    #[instrument(skip(self, text))]
    pub async fn send_text(&mut self, raw: &str, text: &str) -> Result<()> {
        let id = ChannelId::new(raw);
        if !id.is_valid() {
            return Err(SessionError::InvalidChannel(raw.to_string()).into());
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        match self.source.send_text(&id, text).await {
            Ok(()) => {
                let nick = self.source.nick();
                let echo = match text.strip_prefix("/me ") {
                    Some(action) => ChatEvent::action(id, nick, action),
                    None => ChatEvent::new(id, nick, text),
                };
                self.ingest(echo);
            }
            Err(e) => self.report_failure(&id, "send to", e),
        }
        Ok(())
    }

    /// Apply new terminal dimensions to the layout and every pane
    pub fn resize(&mut self, width: u16, height: u16) {
        self.layout.update_size(width, height);
        self.apply_geometry();
        self.repair_focus();
        self.dirty = true;
        debug!(
            "Resized to {}x{}, {} visible panes",
            width,
            height,
            self.layout.visible_pane_count()
        );
    }

    /// Channels that currently get a pane, in registry order
    pub fn visible_channels(&self) -> Vec<ChannelId> {
        let count = self.registry.len().min(self.layout.visible_pane_count());
        self.registry.iter().take(count).cloned().collect()
    }

    /// Every tracked channel, in registry order
    pub fn channels(&self) -> Vec<ChannelId> {
        self.registry.list()
    }

    /// Tracked channel names for persisting
    pub fn channel_names(&self) -> Vec<String> {
        self.registry.iter().map(|c| c.as_str().to_string()).collect()
    }

    pub fn channel_count(&self) -> usize {
        self.registry.len()
    }

    pub fn pane(&self, channel: &ChannelId) -> Option<&ChannelPane> {
        self.panes.get(channel)
    }

    pub fn pane_mut(&mut self, channel: &ChannelId) -> Option<&mut ChannelPane> {
        self.dirty = true;
        self.panes.get_mut(channel)
    }

    /// Number of buffers currently held
    pub fn buffer_count(&self) -> usize {
        self.panes.len()
    }

    /// Visible panes with their histories, for rendering
    pub fn visible_panes_mut(&mut self) -> Vec<(ChannelId, &mut ChannelPane)> {
        let visible = self.visible_channels();
        let mut panes: Vec<_> = self
            .panes
            .iter_mut()
            .filter_map(|(id, pane)| {
                visible
                    .iter()
                    .position(|v| v == id)
                    .map(|pos| (pos, id.clone(), pane))
            })
            .collect();
        panes.sort_by_key(|(pos, _, _)| *pos);
        panes.into_iter().map(|(_, id, pane)| (id, pane)).collect()
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn layout_state(&self) -> LayoutState {
        self.layout.state()
    }

    pub fn focused_channel(&self) -> Option<&ChannelId> {
        self.focused.as_ref()
    }

    pub fn focused_pane_mut(&mut self) -> Option<&mut ChannelPane> {
        let id = self.focused.clone()?;
        self.pane_mut(&id)
    }

    /// Move focus one visible pane to the right, wrapping around
    pub fn focus_next(&mut self) {
        self.shift_focus(1);
    }

    /// Move focus one visible pane to the left, wrapping around
    pub fn focus_prev(&mut self) {
        let len = self.visible_channels().len();
        self.shift_focus(len.saturating_sub(1));
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// Whether anything changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Close the source connection, waiting at most `timeout`
    ///
    /// Buffered messages stay available afterwards.
    pub async fn disconnect(&self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.source.disconnect()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SourceError::Timeout(timeout).into()),
        }
    }

    /// Register a channel and give it an empty pane
    fn track(&mut self, id: &ChannelId) {
        self.registry.add(id.as_str());
        self.panes
            .entry(id.clone())
            .or_insert_with(|| ChannelPane::new(self.max_buffer));
        self.apply_geometry();
        self.repair_focus();
    }

    /// Show an adapter failure inside the affected pane
    fn report_failure(&mut self, id: &ChannelId, action: &str, error: SourceError) {
        warn!("Failed to {} {}: {}", action, id, error);
        let notice = ChatEvent::system(id.clone(), format!("Failed to {} {}: {}", action, id, error));
        self.ingest(notice);
    }

    /// Push the current layout's pane dimensions into every pane's view state
    fn apply_geometry(&mut self) {
        let state = self.layout.state();
        let area = Rect::new(0, 0, state.terminal_width, state.terminal_height);
        let visible = self.visible_channels();
        let rects = LayoutEngine::pane_rects(visible.len(), area);

        // Off-screen panes get the width they would have if scrolled in
        let count = u16::try_from(state.visible_pane_count).unwrap_or(u16::MAX);
        let hidden_width = state.terminal_width / count.max(1);
        for (id, pane) in self.panes.iter_mut() {
            match visible.iter().position(|v| v == id) {
                Some(pos) => pane.view.set_size(rects[pos].width, rects[pos].height),
                None => pane.view.set_size(hidden_width, state.terminal_height),
            }
        }
    }

    /// Keep focus on a visible pane
    fn repair_focus(&mut self) {
        let visible = self.visible_channels();
        let keep = self
            .focused
            .as_ref()
            .is_some_and(|f| visible.contains(f));
        if !keep {
            self.focused = visible.first().cloned();
        }
        self.sync_focus_flags();
    }

    fn shift_focus(&mut self, step: usize) {
        let visible = self.visible_channels();
        if visible.is_empty() {
            return;
        }
        let current = self
            .focused
            .as_ref()
            .and_then(|f| visible.iter().position(|v| v == f))
            .unwrap_or(0);
        self.focused = Some(visible[(current + step) % visible.len()].clone());
        self.sync_focus_flags();
        self.dirty = true;
    }

    fn sync_focus_flags(&mut self) {
        for (id, pane) in self.panes.iter_mut() {
            pane.view.set_focused(self.focused.as_ref() == Some(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::OfflineSource;

    fn coordinator() -> SessionCoordinator {
        SessionCoordinator::new(Arc::new(OfflineSource::new("me")), 3, 40)
    }

    #[test]
    fn test_ingest_auto_discovers_once() {
        let mut session = coordinator();

        let first = session.ingest(ChatEvent::new("#Foo", "a", "hi"));
        assert!(matches!(first, Ingested::Appended { discovered: true, .. }));

        let second = session.ingest(ChatEvent::new("foo", "b", "hey"));
        assert!(matches!(second, Ingested::Appended { discovered: false, .. }));

        assert_eq!(session.channel_count(), 1);
        assert_eq!(session.buffer_count(), 1);
        assert_eq!(session.pane(&ChannelId::new("foo")).unwrap().buffer.len(), 2);
    }

    #[test]
    fn test_ingest_drops_missing_channel() {
        let mut session = coordinator();
        assert_eq!(session.ingest(ChatEvent::new("#", "a", "hi")), Ingested::Dropped);
        assert_eq!(session.ingest(ChatEvent::new("", "a", "hi")), Ingested::Dropped);
        assert_eq!(session.dropped_events(), 2);
        assert_eq!(session.channel_count(), 0);
    }

    #[test]
    fn test_ingest_reports_eviction() {
        let mut session = coordinator();
        for text in ["A", "B", "C"] {
            session.ingest(ChatEvent::new("foo", "a", text));
        }
        let outcome = session.ingest(ChatEvent::new("foo", "a", "D"));
        assert!(matches!(outcome, Ingested::Appended { evicted: 1, .. }));
    }

    #[test]
    fn test_resize_sizes_visible_panes() {
        let mut session = coordinator();
        for name in ["a", "b", "c"] {
            session.ingest(ChatEvent::new(name, "u", "x"));
        }

        session.resize(100, 30);
        assert_eq!(session.visible_channels().len(), 2);

        let a = session.pane(&ChannelId::new("a")).unwrap();
        let b = session.pane(&ChannelId::new("b")).unwrap();
        assert_eq!((a.view.width, a.view.height), (50, 30));
        assert_eq!((b.view.width, b.view.height), (50, 30));

        session.resize(0, 0);
        assert_eq!(session.visible_channels().len(), 1);
    }

    #[test]
    fn test_focus_cycles_visible_panes() {
        let mut session = coordinator();
        session.resize(120, 20);
        for name in ["a", "b", "c", "d"] {
            session.ingest(ChatEvent::new(name, "u", "x"));
        }

        assert_eq!(session.focused_channel().unwrap().as_str(), "a");
        session.focus_next();
        assert_eq!(session.focused_channel().unwrap().as_str(), "b");
        session.focus_prev();
        session.focus_prev();
        assert_eq!(session.focused_channel().unwrap().as_str(), "c");
        assert!(session.pane(&ChannelId::new("c")).unwrap().view.focused);
        assert!(!session.pane(&ChannelId::new("a")).unwrap().view.focused);

        // Shrinking the window pulls focus back into view
        session.resize(40, 20);
        assert_eq!(session.focused_channel().unwrap().as_str(), "a");
    }

    #[test]
    fn test_take_dirty() {
        let mut session = coordinator();
        assert!(session.take_dirty());
        assert!(!session.take_dirty());
        session.ingest(ChatEvent::new("a", "u", "x"));
        assert!(session.take_dirty());
    }
}
