//! # EventLog Component
//!
//! The most recent info events, newest at the bottom. Lines arrive from the
//! observer task already formatted.

use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};

use crate::tui::component::Component;

pub const DEFAULT_LOG_LINES: usize = 200;

pub struct EventLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LINES)
    }
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Component for EventLog {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let skip = self.lines.len().saturating_sub(height);
        let lines: Vec<Line> = self
            .lines
            .iter()
            .skip(skip)
            .map(|line| Line::raw(line.as_str()))
            .collect();
        let block = Block::bordered().title(format!("Info events ({})", self.lines.len()));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
