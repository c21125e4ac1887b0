//! Pane tiling: how many panes fit the terminal and where each one goes

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    widgets::{Paragraph, Widget},
};

/// Default minimum width of a readable chat pane
pub const DEFAULT_MIN_PANE_WIDTH: u16 = 40;

/// Text shown when there is nothing to tile
pub const PLACEHOLDER_TEXT: &str = "No chat panels available";

/// Derived layout parameters, recomputed on every resize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutState {
    pub terminal_width: u16,
    pub terminal_height: u16,
    pub min_pane_width: u16,
    pub visible_pane_count: usize,
}

/// Computes pane count and geometry from terminal dimensions
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    state: LayoutState,
}

impl LayoutEngine {
    /// Create an engine; a zero minimum width is treated as one column
    pub fn new(min_pane_width: u16) -> Self {
        Self {
            state: LayoutState {
                terminal_width: 0,
                terminal_height: 0,
                min_pane_width: min_pane_width.max(1),
                visible_pane_count: 1,
            },
        }
    }

    /// Recompute the visible pane count for new terminal dimensions
    ///
    /// Never yields fewer than one pane, even for zero width.
    pub fn update_size(&mut self, width: u16, height: u16) {
        self.state.terminal_width = width;
        self.state.terminal_height = height;
        self.state.visible_pane_count =
            usize::from(width / self.state.min_pane_width).max(1);
    }

    /// Pane count from the last `update_size`
    pub fn visible_pane_count(&self) -> usize {
        self.state.visible_pane_count
    }

    pub fn min_pane_width(&self) -> u16 {
        self.state.min_pane_width
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    /// Split `area` into `count` side-by-side columns of equal width
    ///
    /// Integer division; the last column absorbs the remainder. Every column
    /// gets the full height.
    pub fn pane_rects(count: usize, area: Rect) -> Vec<Rect> {
        if count == 0 {
            return Vec::new();
        }
        let count_u16 = u16::try_from(count).unwrap_or(u16::MAX);
        let base = area.width / count_u16;

        (0..count_u16)
            .map(|i| {
                let x = area.x + base * i;
                let width = if i + 1 == count_u16 {
                    area.width - base * i
                } else {
                    base
                };
                Rect::new(x, area.y, width, area.height)
            })
            .collect()
    }

    /// Tile as many of `panes` as fit, left to right
    ///
    /// With no panes the result renders a placeholder instead of an empty region.
    pub fn arrange<W>(&self, panes: Vec<W>, area: Rect) -> Arrangement<W> {
        let num_visible = panes.len().min(self.state.visible_pane_count);
        if num_visible == 0 {
            return Arrangement::Placeholder;
        }

        let rects = Self::pane_rects(num_visible, area);
        Arrangement::Panes(rects.into_iter().zip(panes).collect())
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PANE_WIDTH)
    }
}

/// Result of [`LayoutEngine::arrange`], renderable as a single widget
#[derive(Debug)]
pub enum Arrangement<W> {
    /// Nothing to show
    Placeholder,
    /// Panes with their assigned regions
    Panes(Vec<(Rect, W)>),
}

impl<W> Arrangement<W> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Regions assigned to each pane, in order
    pub fn rects(&self) -> Vec<Rect> {
        match self {
            Self::Placeholder => Vec::new(),
            Self::Panes(panes) => panes.iter().map(|(rect, _)| *rect).collect(),
        }
    }
}

impl<W: Widget> Widget for Arrangement<W> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self {
            Self::Placeholder => {
                if area.height == 0 {
                    return;
                }
                let line = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
                Paragraph::new(PLACEHOLDER_TEXT)
                    .alignment(Alignment::Center)
                    .render(line, buf);
            }
            Self::Panes(panes) => {
                for (rect, pane) in panes {
                    pane.render(rect.intersection(area), buf);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ratatui::text::Text;

    #[test]
    fn test_visible_count_scenario() {
        let mut engine = LayoutEngine::new(40);
        engine.update_size(200, 50);
        assert_eq!(engine.visible_pane_count(), 5);

        engine.update_size(79, 50);
        assert_eq!(engine.visible_pane_count(), 1);
    }

    #[test]
    fn test_degenerate_sizes() {
        let mut engine = LayoutEngine::new(40);
        engine.update_size(0, 0);
        assert_eq!(engine.visible_pane_count(), 1);

        let mut engine = LayoutEngine::new(0);
        assert_eq!(engine.min_pane_width(), 1);
        engine.update_size(3, 1);
        assert_eq!(engine.visible_pane_count(), 3);
    }

    #[test]
    fn test_pane_rects_remainder_to_last() {
        let rects = LayoutEngine::pane_rects(3, Rect::new(0, 0, 100, 20));
        assert_eq!(rects[0], Rect::new(0, 0, 33, 20));
        assert_eq!(rects[1], Rect::new(33, 0, 33, 20));
        assert_eq!(rects[2], Rect::new(66, 0, 34, 20));
    }

    #[test]
    fn test_arrange_limits_to_visible() {
        let mut engine = LayoutEngine::new(40);
        engine.update_size(120, 10);

        let arrangement = engine.arrange(vec!["a", "b", "c", "d"], Rect::new(0, 0, 120, 10));
        let rects = arrangement.rects();
        assert_eq!(rects.len(), 3);
        assert!(rects.iter().all(|r| r.width == 40 && r.height == 10));
    }

    #[test]
    fn test_arrange_empty_renders_placeholder() {
        let mut engine = LayoutEngine::new(40);
        engine.update_size(60, 5);

        let area = Rect::new(0, 0, 60, 5);
        let arrangement = engine.arrange(Vec::<Text<'static>>::new(), area);
        assert!(arrangement.is_placeholder());

        let mut buf = Buffer::empty(area);
        arrangement.render(area, &mut buf);
        let row: String = (0..area.width)
            .map(|x| buf[(x, 2)].symbol().to_string())
            .collect();
        assert!(row.contains(PLACEHOLDER_TEXT));
    }

    #[test]
    fn test_arrange_renders_panes_in_order() {
        let mut engine = LayoutEngine::new(4);
        engine.update_size(8, 1);

        let area = Rect::new(0, 0, 8, 1);
        let arrangement = engine.arrange(vec![Text::raw("left"), Text::raw("rite")], area);
        let mut buf = Buffer::empty(area);
        arrangement.render(area, &mut buf);

        let row: String = (0..8).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert_eq!(row, "leftrite");
    }

    proptest! {
        #[test]
        fn prop_never_zero_panes(width in 0u16..=u16::MAX, min in 0u16..200) {
            let mut engine = LayoutEngine::new(min);
            engine.update_size(width, 24);
            prop_assert!(engine.visible_pane_count() >= 1);
        }

        #[test]
        fn prop_rects_cover_width(count in 1usize..12, width in 0u16..500) {
            let rects = LayoutEngine::pane_rects(count, Rect::new(0, 0, width, 10));
            prop_assert_eq!(rects.len(), count);
            let total: u32 = rects.iter().map(|r| u32::from(r.width)).sum();
            prop_assert_eq!(total, u32::from(width));
        }

        #[test]
        fn prop_placeholder_for_any_size(width in 0u16..300, height in 0u16..100) {
            let mut engine = LayoutEngine::default();
            engine.update_size(width, height);
            let arrangement = engine.arrange(Vec::<Text<'static>>::new(), Rect::new(0, 0, width, height));
            prop_assert!(arrangement.is_placeholder());
        }
    }
}
