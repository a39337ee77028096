//! # TabStrip Component
//!
//! The on-screen tab bar. Shows what the [`DemoTabBar`](crate::app::DemoTabBar)
//! was last told to select, so it lags the navigator while no host is
//! bound.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Tabs};

use crate::tui::component::Component;

pub struct TabStrip {
    pub titles: Vec<String>,
    pub selected: Option<usize>,
}

impl TabStrip {
    pub fn new(titles: Vec<String>, selected: Option<usize>) -> Self {
        Self { titles, selected }
    }
}

impl Component for TabStrip {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        // Number each tab with the key that selects it
        let titles: Vec<String> = self
            .titles
            .iter()
            .enumerate()
            .map(|(i, title)| format!("{} {}", i + 1, title))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.selected)
            .block(Block::bordered().title("Tabs"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            );
        frame.render_widget(tabs, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_tab_strip_numbers_titles() {
        let backend = TestBackend::new(60, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut strip = TabStrip::new(vec!["Home".to_string(), "Search".to_string()], Some(1));
        terminal.draw(|f| strip.render(f, f.area())).unwrap();

        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("1 Home"));
        assert!(text.contains("2 Search"));
    }
}
