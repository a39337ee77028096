use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// TUI-specific input events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuiEvent {
    Quit,
    ForceQuit, // Ctrl+C
    Resize,

    /// Digit keys, zero-based.
    SelectTab(usize),
    Push,
    PushModal,
    PushOnTop,
    Back,
    ResetTab,
    ClearAll,
    RecreateHost,
}

/// Translate a key press. Key releases and repeats are ignored.
pub fn map_key(key: KeyEvent) -> Option<TuiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::ForceQuit),
        (_, KeyCode::Char(c @ '1'..='9')) => {
            Some(TuiEvent::SelectTab(c as usize - '1' as usize))
        }
        (_, KeyCode::Enter) => Some(TuiEvent::Push),
        (_, KeyCode::Char('m')) => Some(TuiEvent::PushModal),
        (_, KeyCode::Char('o')) => Some(TuiEvent::PushOnTop),
        (_, KeyCode::Backspace) => Some(TuiEvent::Back),
        (_, KeyCode::Char('r')) => Some(TuiEvent::ResetTab),
        (_, KeyCode::Char('c')) => Some(TuiEvent::ClearAll),
        (_, KeyCode::Char('k')) => Some(TuiEvent::RecreateHost),
        (_, KeyCode::Char('q')) | (_, KeyCode::Esc) => Some(TuiEvent::Quit),
        _ => None,
    }
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(std::time::Duration::ZERO)
}

pub fn poll_event_timeout(timeout: std::time::Duration) -> Option<TuiEvent> {
    // A terminal read error ends up as "no event"; the loop keeps running
    if !event::poll(timeout).unwrap_or(false) {
        return None;
    }
    match event::read().ok()? {
        Event::Key(key_event) => {
            log::debug!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
            map_key(key_event)
        }
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}
