//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;

use crate::core::channel::WorkReceiver;
use crate::core::command::{Command, Envelope};
use crate::core::entry::{RootFactory, RootView};
use crate::core::navigator::Navigator;
use crate::host::TabBar;

/// Test tabs. `Library` has a root factory but is never configured, so it
/// stands in for "a tab the navigator does not know".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Home,
    Search,
    Library,
}

pub fn root_factories() -> HashMap<Tab, RootFactory<String>> {
    let mut roots: HashMap<Tab, RootFactory<String>> = HashMap::new();
    roots.insert(Tab::Home, Box::new(|| RootView::new("home-root".to_string())));
    roots.insert(Tab::Search, Box::new(|| RootView::new("search-root".to_string())));
    roots.insert(Tab::Library, Box::new(|| RootView::new("library-root".to_string())));
    roots
}

/// A navigator with tabs Home and Search, initialized on Home, plus the
/// receiver its commands go to.
pub fn test_navigator() -> (Navigator<Tab, String>, WorkReceiver<Envelope<Tab, String>>) {
    let mut nav = Navigator::default();
    let rx = nav.command_receiver();
    nav.initialize(&[Tab::Home, Tab::Search], root_factories(), Tab::Home)
        .expect("test tabs are valid");
    (nav, rx)
}

/// Take every queued command, discarding its info events.
pub fn drain_commands(rx: &mut WorkReceiver<Envelope<Tab, String>>) -> Vec<Command<String>> {
    rx.drain().into_iter().map(|envelope| envelope.command).collect()
}

/// Take every queued command, publishing its info events as if the host
/// had committed it.
pub fn commit_all(rx: &mut WorkReceiver<Envelope<Tab, String>>) -> Vec<Command<String>> {
    rx.drain()
        .into_iter()
        .map(|Envelope { command, ticket }| {
            ticket.commit();
            command
        })
        .collect()
}

/// Tab bar that records every programmatic selection.
#[derive(Debug, Default)]
pub struct RecordingTabBar {
    pub tabs: Vec<Tab>,
    pub selected: Vec<Tab>,
}

impl RecordingTabBar {
    pub fn new(tabs: &[Tab]) -> Self {
        Self {
            tabs: tabs.to_vec(),
            selected: Vec::new(),
        }
    }
}

impl TabBar<Tab> for RecordingTabBar {
    fn tabs(&self) -> Vec<Tab> {
        self.tabs.clone()
    }

    fn set_selected(&mut self, tab: Tab) {
        self.selected.push(tab);
    }
}
