//! # View Host Adapter
//!
//! Everything that touches the external rendering system lives here. The
//! core navigator only produces commands; this module applies them.
//!
//! ```text
//!  Navigator ──commands──► HostBinding ──► Reconciler ──Transaction──► ViewHost
//!      ▲                       │
//!      └──── select_tab ◄──────┴──── TabBar (user taps)
//! ```
//!
//! ## Modules
//!
//! - [`reconciler`]: maps each command to one atomic [`Transaction`]
//! - [`binding`]: attaches/detaches the reconciler on host start/stop and
//!   keeps the tab bar in step with the navigator
//! - [`memory`]: an in-memory [`ViewHost`] used by the headless runner,
//!   the terminal front-end and the tests

pub mod binding;
pub mod memory;
pub mod reconciler;

pub use binding::{HostBinding, SelectionSource, TabBar};
pub use memory::InMemoryHost;
pub use reconciler::Reconciler;

use std::fmt;

use crate::core::entry::{EntryTag, ViewId};

/// Which container a view is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Main,
    /// Overlay container for modal views.
    Modal,
}

impl Container {
    pub fn for_tag(tag: &EntryTag) -> Self {
        if tag.modal {
            Container::Modal
        } else {
            Container::Main
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    /// Hidden in place; visual state kept.
    Hidden,
    /// Visual state torn down; rebuilt on attach.
    Detached,
}

/// One item the host currently knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostItem {
    pub id: ViewId,
    pub container: Container,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostOp<C> {
    Add {
        id: ViewId,
        container: Container,
        content: C,
    },
    Remove(ViewId),
    Show(ViewId),
    Hide(ViewId),
    Attach(ViewId),
    Detach(ViewId),
}

/// Host mutations that must be applied all together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction<C> {
    ops: Vec<HostOp<C>>,
}

impl<C> Default for Transaction<C> {
    fn default() -> Self {
        Self { ops: Vec::new() }
    }
}

impl<C> Transaction<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: ViewId, container: Container, content: C) -> &mut Self {
        self.ops.push(HostOp::Add {
            id,
            container,
            content,
        });
        self
    }

    pub fn remove(&mut self, id: ViewId) -> &mut Self {
        self.ops.push(HostOp::Remove(id));
        self
    }

    pub fn show(&mut self, id: ViewId) -> &mut Self {
        self.ops.push(HostOp::Show(id));
        self
    }

    pub fn hide(&mut self, id: ViewId) -> &mut Self {
        self.ops.push(HostOp::Hide(id));
        self
    }

    pub fn attach(&mut self, id: ViewId) -> &mut Self {
        self.ops.push(HostOp::Attach(id));
        self
    }

    pub fn detach(&mut self, id: ViewId) -> &mut Self {
        self.ops.push(HostOp::Detach(id));
        self
    }

    pub fn ops(&self) -> &[HostOp<C>] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<HostOp<C>> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// The external rendering system.
pub trait ViewHost<C> {
    /// Every item the host currently holds, in the order they were added.
    fn items(&self) -> Vec<HostItem>;

    fn find(&self, id: ViewId) -> Option<HostItem> {
        self.items().into_iter().find(|item| item.id == id)
    }

    /// Apply the whole transaction atomically.
    fn commit(&mut self, transaction: Transaction<C>) -> Result<(), HostError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host has no item with this id.
    Missing(ViewId),
    /// The host already has an item with this id.
    Duplicate(ViewId),
    /// The host refused the transaction for its own reasons.
    Rejected(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Missing(id) => write!(f, "host has no view {id}"),
            HostError::Duplicate(id) => write!(f, "host already has view {id}"),
            HostError::Rejected(reason) => write!(f, "host rejected transaction: {reason}"),
        }
    }
}

impl std::error::Error for HostError {}
