//! # ViewStack Component
//!
//! Lists the current tab's back-stack, top first, next to what the host is
//! doing with each view.
//!
//! ```text
//! ┌ Home stack (3) ───────────────────┐
//! │ ▶ [Player]     modal     visible  │
//! │   Episode 2              detached │
//! │   Home         retained  hidden   │
//! └───────────────────────────────────┘
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem};

use crate::host::Visibility;
use crate::tui::component::Component;

/// One stack entry as shown on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRow {
    pub title: String,
    pub modal: bool,
    pub detachable: bool,
    /// `None` while the entry's command has not reached the host.
    pub visibility: Option<Visibility>,
}

pub struct ViewStack {
    pub tab_title: String,
    /// Bottom-to-top, as the navigator reports it.
    pub rows: Vec<StackRow>,
}

impl ViewStack {
    pub fn new(tab_title: String, rows: Vec<StackRow>) -> Self {
        Self { tab_title, rows }
    }
}

fn visibility_label(visibility: Option<Visibility>) -> (&'static str, Style) {
    match visibility {
        Some(Visibility::Visible) => ("visible", Style::default().fg(Color::Green)),
        Some(Visibility::Hidden) => ("hidden", Style::default().fg(Color::Yellow)),
        Some(Visibility::Detached) => ("detached", Style::default().fg(Color::DarkGray)),
        None => ("pending", Style::default().fg(Color::Magenta)),
    }
}

impl Component for ViewStack {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .rev()
            .enumerate()
            .map(|(i, row)| {
                let marker = if i == 0 { "▶ " } else { "  " };
                let flag = match (row.modal, row.detachable) {
                    (true, _) => "modal",
                    (false, false) => "retained",
                    (false, true) => "",
                };
                let (label, style) = visibility_label(row.visibility);
                let title_style = if i == 0 {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(format!("{:<24}", row.title), title_style),
                    Span::styled(format!("{flag:<10}"), Style::default().fg(Color::Cyan)),
                    Span::styled(label, style),
                ]))
            })
            .collect();

        let title = format!("{} stack ({})", self.tab_title, self.rows.len());
        frame.render_widget(List::new(items).block(Block::bordered().title(title)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn row(title: &str, visibility: Option<Visibility>) -> StackRow {
        StackRow {
            title: title.to_string(),
            modal: false,
            detachable: true,
            visibility,
        }
    }

    #[test]
    fn test_view_stack_lists_top_first() {
        let backend = TestBackend::new(60, 6);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut stack = ViewStack::new(
            "Home".to_string(),
            vec![
                row("Home", Some(Visibility::Detached)),
                row("Episode", None),
            ],
        );
        terminal.draw(|f| stack.render(f, f.area())).unwrap();

        let buffer = terminal.backend().buffer();
        let line = |y: u16| {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
        };
        assert!(line(0).contains("Home stack (2)"));
        assert!(line(1).contains("▶ Episode"));
        assert!(line(1).contains("pending"));
        assert!(line(2).contains("detached"));
    }
}
