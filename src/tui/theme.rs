//! TUI Theme configuration
//!
//! Centralized theme system for consistent styling across the UI.
//! Supports multiple color depths for terminal compatibility.

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// Terminal color capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Basic 16 ANSI colors (maximum compatibility)
    Basic,
    /// 256 color palette
    #[default]
    Indexed,
    /// True color (24-bit RGB)
    TrueColor,
}

impl ColorMode {
    /// Detect the best color mode for the current terminal
    pub fn detect() -> Self {
        // Check COLORTERM first (most reliable for true color)
        if let Ok(colorterm) = std::env::var("COLORTERM") {
            if colorterm == "truecolor" || colorterm == "24bit" {
                return Self::TrueColor;
            }
        }

        if let Ok(term) = std::env::var("TERM") {
            if term.contains("kitty") || term.contains("alacritty") {
                return Self::TrueColor;
            }
            if term.contains("256color") {
                return Self::Indexed;
            }
        }

        Self::Basic
    }
}

/// Theme configuration for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    // Pane borders and titles
    pub border_focused: Color,
    pub border_unfocused: Color,
    pub title_focused: Color,

    // Chat lines
    pub timestamp: Color,
    pub author: Color,
    pub action: Color,
    pub system: Color,
    pub text_primary: Color,
    pub text_secondary: Color,

    // Modal borders
    pub modal_info: Color,
    pub modal_warning: Color,
    pub modal_error: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_scrolled: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_color_mode(ColorMode::detect())
    }
}

impl Theme {
    /// Create a theme for the specified color mode
    pub fn for_color_mode(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Basic => Self::basic(),
            ColorMode::Indexed => Self::indexed(),
            ColorMode::TrueColor => Self::truecolor(),
        }
    }

    /// Basic 16-color theme (maximum compatibility)
    pub fn basic() -> Self {
        Self {
            border_focused: Color::Cyan,
            border_unfocused: Color::DarkGray,
            title_focused: Color::White,

            timestamp: Color::DarkGray,
            author: Color::Green,
            action: Color::Magenta,
            system: Color::Yellow,
            text_primary: Color::Reset,
            text_secondary: Color::DarkGray,

            modal_info: Color::Cyan,
            modal_warning: Color::Yellow,
            modal_error: Color::Red,

            status_bar_bg: Color::Blue,
            status_bar_fg: Color::White,
            status_scrolled: Color::Yellow,
        }
    }

    /// 256-color theme (good balance of compatibility and aesthetics)
    pub fn indexed() -> Self {
        Self {
            border_focused: Color::Indexed(117),  // Pastel sky blue
            border_unfocused: Color::Indexed(243),
            title_focused: Color::Indexed(255),

            timestamp: Color::Indexed(245),
            author: Color::Indexed(156),          // Pastel mint green
            action: Color::Indexed(183),          // Pastel orchid
            system: Color::Indexed(222),          // Pastel peach
            text_primary: Color::Reset,
            text_secondary: Color::Indexed(250),

            modal_info: Color::Indexed(117),
            modal_warning: Color::Indexed(222),
            modal_error: Color::Indexed(210),     // Pastel coral

            status_bar_bg: Color::Indexed(236),
            status_bar_fg: Color::Indexed(252),
            status_scrolled: Color::Indexed(222),
        }
    }

    /// True color theme (richest visual experience)
    pub fn truecolor() -> Self {
        Self {
            border_focused: Color::Rgb(137, 180, 250),   // Pastel sky blue
            border_unfocused: Color::Rgb(88, 91, 112),
            title_focused: Color::Rgb(245, 245, 250),

            timestamp: Color::Rgb(127, 132, 156),
            author: Color::Rgb(166, 227, 161),           // Pastel mint
            action: Color::Rgb(203, 166, 247),           // Pastel mauve
            system: Color::Rgb(249, 226, 175),           // Pastel peach
            text_primary: Color::Rgb(245, 245, 250),
            text_secondary: Color::Rgb(166, 173, 200),

            modal_info: Color::Rgb(137, 180, 250),
            modal_warning: Color::Rgb(249, 226, 175),
            modal_error: Color::Rgb(243, 139, 168),      // Pastel rose

            status_bar_bg: Color::Rgb(49, 50, 68),
            status_bar_fg: Color::Rgb(205, 214, 244),
            status_scrolled: Color::Rgb(249, 226, 175),
        }
    }

    /// Style for focused pane borders
    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    /// Style for unfocused pane borders
    pub fn border_unfocused(&self) -> Style {
        Style::default().fg(self.border_unfocused)
    }

    /// Style for a pane title
    pub fn title(&self, focused: bool) -> Style {
        if focused {
            Style::default()
                .fg(self.title_focused)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.text_secondary)
        }
    }

    pub fn timestamp(&self) -> Style {
        Style::default().fg(self.timestamp)
    }

    pub fn author(&self) -> Style {
        Style::default().fg(self.author).add_modifier(Modifier::BOLD)
    }

    /// Style for `/me` messages
    pub fn action(&self) -> Style {
        Style::default()
            .fg(self.action)
            .add_modifier(Modifier::ITALIC)
    }

    /// Style for locally generated notices
    pub fn system(&self) -> Style {
        Style::default().fg(self.system).add_modifier(Modifier::ITALIC)
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.text_primary)
    }

    /// Style for status bar
    pub fn status_bar(&self) -> Style {
        Style::default().bg(self.status_bar_bg).fg(self.status_bar_fg)
    }

    /// Status bar while the focused pane is scrolled away from the latest message
    pub fn status_scrolled(&self) -> Style {
        Style::default()
            .bg(self.status_bar_bg)
            .fg(self.status_scrolled)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_theme() {
        let theme = Theme::basic();
        assert_eq!(theme.border_focused, Color::Cyan);
        assert_eq!(theme.system, Color::Yellow);
    }

    #[test]
    fn test_indexed_theme() {
        let theme = Theme::indexed();
        assert_eq!(theme.border_focused, Color::Indexed(117));
        assert_eq!(theme.author, Color::Indexed(156));
    }

    #[test]
    fn test_theme_styles() {
        let theme = Theme::basic();
        assert_eq!(theme.border_focused().fg, Some(Color::Cyan));
        assert!(theme.system().add_modifier.contains(Modifier::ITALIC));
        assert!(theme.title(true).add_modifier.contains(Modifier::BOLD));
        assert_eq!(theme.title(false).fg, Some(Color::DarkGray));
        assert_eq!(theme.status_scrolled().fg, Some(Color::Yellow));
        assert_eq!(theme.status_scrolled().bg, theme.status_bar().bg);
    }

    #[test]
    fn test_color_mode_for_theme() {
        let basic = Theme::for_color_mode(ColorMode::Basic);
        let indexed = Theme::for_color_mode(ColorMode::Indexed);
        let truecolor = Theme::for_color_mode(ColorMode::TrueColor);

        assert_eq!(basic.border_focused, Color::Cyan);
        assert_eq!(indexed.border_focused, Color::Indexed(117));
        assert_eq!(truecolor.border_focused, Color::Rgb(137, 180, 250));
    }

    #[test]
    fn test_color_mode_config_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: ColorMode,
        }
        let parsed: Wrapper = toml::from_str("mode = \"truecolor\"").unwrap();
        assert_eq!(parsed.mode, ColorMode::TrueColor);
    }
}
