//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the navigator
//! state, and translates key presses into navigation intents on
//! [`App`].
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! Nothing animates, so the loop sleeps up to 250ms waiting for input and
//! only redraws after a key press, a resize, or a new info event from the
//! observer task.

mod component;
mod components;
mod event;
mod ui;

use log::{info, warn};
use std::io::stdout;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::app::{App, TabIndex};
use crate::core::command::InfoEvent;
use crate::script::{OutputFormat, format_event};
use crate::tui::components::EventLog;
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of the navigator)
pub struct TuiState {
    pub event_log: EventLog,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            event_log: EventLog::default(),
        }
    }
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(stdout(), Hide)?;
        info!("Terminal modes enabled (hidden cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), Show);
    }
}

/// Forward formatted info events to the event loop.
fn spawn_info_forwarder(
    mut events: broadcast::Receiver<InfoEvent<TabIndex>>,
    tab_ids: Vec<String>,
    tx: mpsc::Sender<String>,
) {
    tokio::spawn(async move {
        loop {
            let line = match events.recv().await {
                Ok(event) => {
                    let event = event.map_tab(|tab| {
                        tab_ids.get(tab).cloned().unwrap_or_else(|| tab.to_string())
                    });
                    format_event(&event, OutputFormat::Text)
                }
                Err(RecvError::Lagged(skipped)) => format!("... {skipped} events skipped"),
                Err(RecvError::Closed) => return,
            };
            if tx.send(line).is_err() {
                warn!("Failed to forward info event: receiver dropped");
                return;
            }
        }
    });
}

/// Apply one key press. Returns `true` when the user asked to quit.
fn handle_event(app: &mut App, event: TuiEvent) -> bool {
    match event {
        TuiEvent::Quit | TuiEvent::ForceQuit => return true,
        TuiEvent::Resize => {}
        TuiEvent::SelectTab(tab) => {
            if tab < app.config.tabs.len() {
                app.tap_tab(tab);
            }
        }
        TuiEvent::Push => {
            app.push_page(None);
        }
        TuiEvent::PushModal => {
            app.push_modal(None);
        }
        TuiEvent::PushOnTop => {
            app.push_on_top(None);
        }
        TuiEvent::Back => {
            app.back();
        }
        TuiEvent::ResetTab => {
            if let Some(tab) = app.navigator.current_tab() {
                app.reset_tab(tab, false);
            }
        }
        TuiEvent::ClearAll => app.clear(),
        TuiEvent::RecreateHost => {
            if let Err(e) = app.restart_host(true) {
                warn!("Host restart failed: {}", e);
                app.status_message = format!("Restart failed: {e}");
            }
        }
    }
    false
}

pub fn run(mut app: App) -> std::io::Result<()> {
    let mut tui = TuiState::new();

    // Subscribe before the host is bound so the first root is logged too
    let (tx, rx) = mpsc::channel();
    let tab_ids = app.config.tabs.iter().map(|t| t.id.clone()).collect();
    spawn_info_forwarder(app.navigator.subscribe_info(), tab_ids, tx);
    if let Err(e) = app.attach_host() {
        warn!("Host binding failed: {}", e);
        app.status_message = format!("Host binding failed: {e}");
    }

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();
    let mut needs_redraw = true; // Force first frame

    loop {
        while let Ok(line) = rx.try_recv() {
            tui.event_log.push(line);
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        let first_event = poll_event_timeout(Duration::from_millis(250));
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if handle_event(&mut app, event) {
                should_quit = true;
                break;
            }
        }
        if should_quit {
            break;
        }
    }

    info!("Quitting with {} info events logged", tui.event_log.len());
    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{NavConfig, resolve};

    fn app() -> App {
        let config = resolve(&NavConfig::default(), Some("home"), Some("info")).unwrap();
        let mut app = App::new(config).unwrap();
        app.attach_host().unwrap();
        app
    }

    #[test]
    fn test_handle_event_quit() {
        let mut app = app();
        assert!(handle_event(&mut app, TuiEvent::Quit));
        assert!(handle_event(&mut app, TuiEvent::ForceQuit));
        assert!(!handle_event(&mut app, TuiEvent::Push));
    }

    #[test]
    fn test_select_out_of_range_tab_is_ignored() {
        let mut app = app();
        handle_event(&mut app, TuiEvent::SelectTab(8));
        assert_eq!(app.navigator.current_tab(), Some(0));
        handle_event(&mut app, TuiEvent::SelectTab(1));
        assert_eq!(app.navigator.current_tab(), Some(1));
    }

    #[test]
    fn test_reset_pops_current_tab_to_root() {
        let mut app = app();
        handle_event(&mut app, TuiEvent::Push);
        handle_event(&mut app, TuiEvent::PushModal);
        assert_eq!(app.navigator.current_stack_size(), 3);
        handle_event(&mut app, TuiEvent::ResetTab);
        assert_eq!(app.navigator.current_stack_size(), 1);
    }

    #[tokio::test]
    async fn test_forwarder_formats_events() {
        let config = resolve(&NavConfig::default(), Some("home"), Some("info")).unwrap();
        let mut app = App::new(config).unwrap();
        let (tx, rx) = mpsc::channel();
        spawn_info_forwarder(
            app.navigator.subscribe_info(),
            vec!["home".to_string()],
            tx,
        );
        app.attach_host().unwrap();
        drop(app);

        // The forwarder ends once the navigator is gone
        let mut lines = Vec::new();
        for _ in 0..100 {
            tokio::task::yield_now().await;
            lines.extend(rx.try_iter());
            if lines.len() >= 2 {
                break;
            }
        }
        assert_eq!(lines[0], "tab switched   -> home");
        assert!(lines[1].starts_with("view added"));
    }
}
