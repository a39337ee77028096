//! # View Entries
//!
//! Identity model for everything the navigator pushes onto a tab stack.
//!
//! ```text
//! NewView<C>   ── push ──►  EntryTag { id, detachable, modal }   (on the stack)
//!                           ViewEntry<C> { tag, content }         (in the add command)
//! RootFactory<C> ─ call ─►  RootView<C> { content, detachable }
//! ```
//!
//! Stacks only ever hold `EntryTag`s. Content travels to the View Host once,
//! inside the command that adds it; after that the entry is referred to by id.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process-unique identity of one view entry. Generated at creation, never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(Uuid);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity and flags of a view entry. Immutable for the life of the entry;
/// only its stack position changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryTag {
    pub id: ViewId,
    /// The view's visual state may be torn down while hidden and rebuilt
    /// when shown again, instead of only being hidden.
    pub detachable: bool,
    /// Rendered in the overlay container. Exempt from the tab-affinity rule
    /// when popped.
    pub modal: bool,
}

impl EntryTag {
    pub fn new(detachable: bool, modal: bool) -> Self {
        Self {
            id: ViewId::new(),
            detachable,
            modal,
        }
    }
}

/// A view to be pushed. Built with the chaining helpers:
///
/// ```rust,ignore
/// navigator.push(NewView::new(episode).modal());
/// navigator.push(NewView::new(player).retained().on_top());
/// ```
#[derive(Debug, Clone)]
pub struct NewView<C> {
    pub content: C,
    pub detachable: bool,
    pub modal: bool,
    /// Add above the current view without hiding it.
    pub on_top: bool,
}

impl<C> NewView<C> {
    pub fn new(content: C) -> Self {
        Self {
            content,
            detachable: true,
            modal: false,
            on_top: false,
        }
    }

    pub fn modal(mut self) -> Self {
        self.modal = true;
        self
    }

    pub fn on_top(mut self) -> Self {
        self.on_top = true;
        self
    }

    /// Keep the view's visual state alive while hidden (not detachable).
    pub fn retained(mut self) -> Self {
        self.detachable = false;
        self
    }
}

/// An entry together with its content, as handed to the View Host.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry<C> {
    pub tag: EntryTag,
    pub content: C,
}

/// What a tab's root factory produces.
#[derive(Debug, Clone)]
pub struct RootView<C> {
    pub content: C,
    pub detachable: bool,
}

impl<C> RootView<C> {
    pub fn new(content: C) -> Self {
        Self {
            content,
            detachable: true,
        }
    }

    pub fn retained(content: C) -> Self {
        Self {
            content,
            detachable: false,
        }
    }
}

impl<C> From<RootView<C>> for NewView<C> {
    fn from(root: RootView<C>) -> Self {
        NewView {
            content: root.content,
            detachable: root.detachable,
            modal: false,
            on_top: false,
        }
    }
}

/// Lazily builds a tab's root view. Invoked the first time the tab is shown
/// and on every recreating reset.
pub type RootFactory<C> = Box<dyn Fn() -> RootView<C> + Send + Sync>;
