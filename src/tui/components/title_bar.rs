//! # TitleBar Component
//!
//! Top status line: current tab, its stack depth, and the latest status
//! message.
//!
//! ## Conditional Formatting
//!
//! 1. **Status message**: `"tabnav | Home (depth 2) | Host recreated"`
//! 2. **Default**: `"tabnav | Home (depth 2)"`
//! 3. **Commands waiting for a host**: a `" | 3 queued"` suffix on either
//!    of the above

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;

/// Top status bar. All fields are props.
pub struct TitleBar {
    pub tab_title: String,
    pub depth: usize,
    pub status_message: String,
    /// Commands queued while no host is bound.
    pub queued: usize,
}

impl TitleBar {
    pub fn new(tab_title: String, depth: usize, status_message: String, queued: usize) -> Self {
        Self {
            tab_title,
            depth,
            status_message,
            queued,
        }
    }

    fn text(&self) -> String {
        let mut text = format!("tabnav | {} (depth {})", self.tab_title, self.depth);
        if !self.status_message.is_empty() {
            text.push_str(" | ");
            text.push_str(&self.status_message);
        }
        if self.queued > 0 {
            text.push_str(&format!(" | {} queued", self.queued));
        }
        text
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Span::raw(self.text()), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(title_bar: &mut TitleBar) -> String {
        let backend = TestBackend::new(80, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_title_bar_with_status_message() {
        let mut title_bar = TitleBar::new("Home".to_string(), 2, "Host recreated".to_string(), 0);
        let text = rendered(&mut title_bar);
        assert!(text.contains("tabnav | Home (depth 2) | Host recreated"));
        assert!(!text.contains("queued"));
    }

    #[test]
    fn test_title_bar_default_no_status() {
        let mut title_bar = TitleBar::new("Search".to_string(), 1, String::new(), 0);
        let text = rendered(&mut title_bar);
        assert!(text.contains("tabnav | Search (depth 1)"));
        assert_eq!(text.matches('|').count(), 1);
    }

    #[test]
    fn test_title_bar_shows_queued_commands() {
        let mut title_bar = TitleBar::new("Home".to_string(), 1, String::new(), 3);
        assert!(rendered(&mut title_bar).contains("| 3 queued"));
    }
}
