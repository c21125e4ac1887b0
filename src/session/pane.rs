//! Per-pane view state: geometry, focus and scroll position
//!
//! Scroll positions are counted in messages, not wrapped lines, so they stay
//! meaningful across resizes. While following, the pane shows the newest
//! messages; once the user scrolls up, the pane is anchored at a message index
//! and new messages accumulate below it without moving the window.

/// View state of a single channel pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneViewState {
    /// Outer width including borders
    pub width: u16,
    /// Outer height including borders
    pub height: u16,
    pub focused: bool,
    /// Pinned to the newest message
    follow: bool,
    /// First visible message while not following
    top: usize,
    /// First message drawn by the last render
    rendered_top: usize,
    /// Whether the last render reached the newest message
    rendered_end: bool,
}

impl Default for PaneViewState {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            focused: false,
            follow: true,
            top: 0,
            rendered_top: 0,
            rendered_end: true,
        }
    }
}

impl PaneViewState {
    /// Create a state that follows the latest message
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Anchor message index, `None` while following
    pub fn anchor(&self) -> Option<usize> {
        (!self.follow).then_some(self.top)
    }

    /// Keep the anchored window on the same messages after head eviction
    pub fn on_append(&mut self, evicted: usize) {
        if !self.follow {
            self.top = self.top.saturating_sub(evicted);
            self.rendered_top = self.rendered_top.saturating_sub(evicted);
        }
    }

    /// Scroll towards older messages
    pub fn scroll_up(&mut self, n: usize, len: usize) {
        if len == 0 {
            return;
        }
        if self.follow {
            self.top = self.rendered_top.min(len - 1);
            self.follow = false;
        }
        self.top = self.top.saturating_sub(n);
    }

    /// Scroll towards newer messages, returning to follow mode at the end
    pub fn scroll_down(&mut self, n: usize, len: usize) {
        if self.follow {
            return;
        }
        if self.rendered_end || self.top + n >= len {
            self.scroll_to_bottom();
        } else {
            self.top += n;
        }
    }

    /// Half of the visible body, at least one message
    pub fn half_page(&self) -> usize {
        (usize::from(self.height.saturating_sub(2)) / 2).max(1)
    }

    pub fn page_up(&mut self, len: usize) {
        self.scroll_up(self.half_page(), len);
    }

    pub fn page_down(&mut self, len: usize) {
        self.scroll_down(self.half_page(), len);
    }

    /// Return to following the latest message
    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
        self.top = 0;
    }

    /// Called by the renderer with what it actually drew
    pub fn record_render(&mut self, first_drawn: usize, reached_end: bool) {
        self.rendered_top = first_drawn;
        self.rendered_end = reached_end;
    }
}
