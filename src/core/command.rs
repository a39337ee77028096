//! # Reconciliation Commands and Info Events
//!
//! Navigator intents become `Command`s, queued in the order the intents were
//! issued. Every intent produces at most one, except `clear_all` (a `Clear`
//! then the new root) and switching to a tab whose top is a modal (the main
//! view beneath it, then the modal). Each command describes how the View
//! Host's set of views has to change and is paired with the `InfoEvent`s that
//! describe the change to observers.
//!
//! ```text
//! Navigator ──► Envelope { command, ticket } ──► WorkQueue ──► Reconciler
//!                                                                 │ host commit OK
//!                                                                 ▼
//!                                              ticket.commit() ──► broadcast ──► observers
//! ```
//!
//! The ticket is the only way events reach observers, and it is only
//! committed after the host transaction succeeds. A ticket dropped without
//! being committed publishes nothing.

use log::debug;
use serde::Serialize;
use tokio::sync::broadcast;

use super::entry::{EntryTag, ViewEntry, ViewId};

/// Tagged instruction describing how the View Host's visible set must change.
#[derive(Debug, Clone, PartialEq)]
pub enum Command<C> {
    /// Add the entry and hide its siblings.
    AddAndShow(ViewEntry<C>),
    /// Add the entry above whatever is showing, leaving siblings untouched.
    AddOnTop(ViewEntry<C>),
    /// Show a previously hidden or detached entry and hide its siblings.
    ShowExisting(EntryTag),
    /// Remove one entry and show another in the same transaction.
    ShowAndRemove { show: EntryTag, remove: EntryTag },
    /// Remove every listed entry.
    Clear(Vec<EntryTag>),
    RemoveAllAndAdd {
        remove: Vec<EntryTag>,
        add: ViewEntry<C>,
    },
    RemoveAllAndShowExisting {
        remove: Vec<EntryTag>,
        show: EntryTag,
    },
    /// Remove host items left over from a previous process.
    RemoveUnknown(Vec<ViewId>),
}

impl<C> Command<C> {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddAndShow(_) => "AddAndShow",
            Command::AddOnTop(_) => "AddOnTop",
            Command::ShowExisting(_) => "ShowExisting",
            Command::ShowAndRemove { .. } => "ShowAndRemove",
            Command::Clear(_) => "Clear",
            Command::RemoveAllAndAdd { .. } => "RemoveAllAndAdd",
            Command::RemoveAllAndShowExisting { .. } => "RemoveAllAndShowExisting",
            Command::RemoveUnknown(_) => "RemoveUnknown",
        }
    }

    /// The entry this command leaves showing, if it shows one.
    pub fn shown(&self) -> Option<EntryTag> {
        match self {
            Command::AddAndShow(entry) | Command::AddOnTop(entry) => Some(entry.tag),
            Command::RemoveAllAndAdd { add, .. } => Some(add.tag),
            Command::ShowExisting(tag)
            | Command::ShowAndRemove { show: tag, .. }
            | Command::RemoveAllAndShowExisting { show: tag, .. } => Some(*tag),
            Command::Clear(_) | Command::RemoveUnknown(_) => None,
        }
    }

    /// Observer events implied by this command, in emission order.
    pub fn info_events<T>(&self) -> Vec<InfoEvent<T>> {
        match self {
            Command::AddAndShow(entry) | Command::AddOnTop(entry) => {
                vec![InfoEvent::ViewAdded { entry: entry.tag }]
            }
            Command::RemoveAllAndAdd { remove, add } => remove
                .iter()
                .map(|tag| InfoEvent::ViewRemoved {
                    removed: tag.id,
                    next_shown: Some(add.tag.id),
                })
                .chain(std::iter::once(InfoEvent::ViewAdded { entry: add.tag }))
                .collect(),
            Command::ShowAndRemove { show, remove } => vec![InfoEvent::ViewRemoved {
                removed: remove.id,
                next_shown: Some(show.id),
            }],
            Command::RemoveAllAndShowExisting { remove, show } => remove
                .iter()
                .map(|tag| InfoEvent::ViewRemoved {
                    removed: tag.id,
                    next_shown: Some(show.id),
                })
                .collect(),
            Command::Clear(all) => all
                .iter()
                .map(|tag| InfoEvent::ViewRemoved {
                    removed: tag.id,
                    next_shown: None,
                })
                .collect(),
            // Tab switches already cover ShowExisting; drift cleanup is silent
            Command::ShowExisting(_) | Command::RemoveUnknown(_) => Vec::new(),
        }
    }
}

/// Observer-facing record of a navigation change. Used for analytics, never
/// for control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InfoEvent<T> {
    TabSwitched { from: Option<T>, to: T },
    ViewAdded { entry: EntryTag },
    ViewRemoved {
        removed: ViewId,
        next_shown: Option<ViewId>,
    },
}

impl<T> InfoEvent<T> {
    /// Rewrite the tab ids, e.g. from indices to display names.
    pub fn map_tab<U>(self, mut f: impl FnMut(T) -> U) -> InfoEvent<U> {
        match self {
            InfoEvent::TabSwitched { from, to } => InfoEvent::TabSwitched {
                from: from.map(&mut f),
                to: f(to),
            },
            InfoEvent::ViewAdded { entry } => InfoEvent::ViewAdded { entry },
            InfoEvent::ViewRemoved {
                removed,
                next_shown,
            } => InfoEvent::ViewRemoved {
                removed,
                next_shown,
            },
        }
    }
}

/// Releases a command's info events once the host has applied it.
#[derive(Debug)]
pub struct CommitTicket<T> {
    events: Vec<InfoEvent<T>>,
    publisher: broadcast::Sender<InfoEvent<T>>,
}

impl<T: Clone> CommitTicket<T> {
    pub fn new(events: Vec<InfoEvent<T>>, publisher: broadcast::Sender<InfoEvent<T>>) -> Self {
        Self { events, publisher }
    }

    pub fn events(&self) -> &[InfoEvent<T>] {
        &self.events
    }

    /// Publish the events, in order. Returns how many were published.
    pub fn commit(self) -> usize {
        let count = self.events.len();
        for event in self.events {
            // No subscribers is fine: analytics is optional
            if self.publisher.send(event).is_err() {
                debug!("Info event dropped: no subscribers");
            }
        }
        count
    }
}

/// A command paired with the ticket that flushes its events.
#[derive(Debug)]
pub struct Envelope<T, C> {
    pub command: Command<C>,
    pub ticket: CommitTicket<T>,
}
