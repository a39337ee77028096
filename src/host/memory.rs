//! In-memory [`ViewHost`]. Keeps items in insertion order and applies each
//! transaction to a scratch copy first, so a failing op leaves the host
//! untouched.

use log::debug;

use super::{Container, HostError, HostItem, HostOp, Transaction, ViewHost, Visibility};
use crate::core::entry::ViewId;

#[derive(Debug, Clone)]
pub struct InMemoryHost<C> {
    items: Vec<(HostItem, C)>,
    commits: usize,
    reject_next: Option<String>,
}

impl<C> Default for InMemoryHost<C> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            commits: 0,
            reject_next: None,
        }
    }
}

impl<C: Clone> InMemoryHost<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an item in place without a transaction, the way a platform
    /// restores views from a previous process.
    pub fn restore(&mut self, id: ViewId, container: Container, content: C) {
        self.items.push((
            HostItem {
                id,
                container,
                visibility: Visibility::Visible,
            },
            content,
        ));
    }

    /// Make the next commit fail with `reason`.
    pub fn reject_next_commit(&mut self, reason: impl Into<String>) {
        self.reject_next = Some(reason.into());
    }

    pub fn content(&self, id: ViewId) -> Option<&C> {
        self.items
            .iter()
            .find(|(item, _)| item.id == id)
            .map(|(_, content)| content)
    }

    pub fn visibility(&self, id: ViewId) -> Option<Visibility> {
        self.find(id).map(|item| item.visibility)
    }

    /// Visible items in `container`, oldest first.
    pub fn visible(&self, container: Container) -> Vec<ViewId> {
        self.items
            .iter()
            .filter(|(item, _)| item.container == container && item.visibility == Visibility::Visible)
            .map(|(item, _)| item.id)
            .collect()
    }

    /// Content of the view the user is looking at: the newest visible modal,
    /// else the newest visible main view.
    pub fn front(&self) -> Option<(ViewId, &C)> {
        let newest = |container: Container| {
            self.items.iter().rev().find(|(item, _)| {
                item.container == container && item.visibility == Visibility::Visible
            })
        };
        newest(Container::Modal)
            .or_else(|| newest(Container::Main))
            .map(|(item, content)| (item.id, content))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

fn set_visibility<C>(
    items: &mut [(HostItem, C)],
    id: ViewId,
    visibility: Visibility,
) -> Result<(), HostError> {
    let (item, _) = items
        .iter_mut()
        .find(|(item, _)| item.id == id)
        .ok_or(HostError::Missing(id))?;
    item.visibility = visibility;
    Ok(())
}

impl<C: Clone> ViewHost<C> for InMemoryHost<C> {
    fn items(&self) -> Vec<HostItem> {
        self.items.iter().map(|(item, _)| *item).collect()
    }

    fn commit(&mut self, transaction: Transaction<C>) -> Result<(), HostError> {
        if let Some(reason) = self.reject_next.take() {
            return Err(HostError::Rejected(reason));
        }

        let mut scratch = self.items.clone();
        for op in transaction.into_ops() {
            match op {
                HostOp::Add {
                    id,
                    container,
                    content,
                } => {
                    if scratch.iter().any(|(item, _)| item.id == id) {
                        return Err(HostError::Duplicate(id));
                    }
                    scratch.push((
                        HostItem {
                            id,
                            container,
                            visibility: Visibility::Visible,
                        },
                        content,
                    ));
                }
                HostOp::Remove(id) => {
                    let idx = scratch
                        .iter()
                        .position(|(item, _)| item.id == id)
                        .ok_or(HostError::Missing(id))?;
                    scratch.remove(idx);
                }
                HostOp::Show(id) | HostOp::Attach(id) => {
                    set_visibility(&mut scratch, id, Visibility::Visible)?
                }
                HostOp::Hide(id) => set_visibility(&mut scratch, id, Visibility::Hidden)?,
                HostOp::Detach(id) => set_visibility(&mut scratch, id, Visibility::Detached)?,
            }
        }

        self.items = scratch;
        self.commits += 1;
        debug!("Host committed transaction #{} ({} items)", self.commits, self.items.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_applies_all_ops() {
        let mut host = InMemoryHost::new();
        let (a, b) = (ViewId::new(), ViewId::new());
        let mut tx = Transaction::new();
        tx.add(a, Container::Main, "a").add(b, Container::Main, "b").detach(a);
        host.commit(tx).unwrap();

        assert_eq!(host.visibility(a), Some(Visibility::Detached));
        assert_eq!(host.visible(Container::Main), vec![b]);
        assert_eq!(host.front(), Some((b, &"b")));
        assert_eq!(host.commit_count(), 1);
    }

    #[test]
    fn test_failed_op_rolls_back_whole_transaction() {
        let mut host = InMemoryHost::new();
        let a = ViewId::new();
        let mut tx = Transaction::new();
        tx.add(a, Container::Main, "a").remove(ViewId::new());
        assert!(matches!(host.commit(tx), Err(HostError::Missing(_))));
        assert!(host.is_empty());
        assert_eq!(host.commit_count(), 0);
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        let mut host = InMemoryHost::new();
        let a = ViewId::new();
        host.restore(a, Container::Main, "old");
        let mut tx = Transaction::new();
        tx.add(a, Container::Main, "new");
        assert_eq!(host.commit(tx), Err(HostError::Duplicate(a)));
        assert_eq!(host.content(a), Some(&"old"));
    }

    #[test]
    fn test_reject_next_commit_only_once() {
        let mut host: InMemoryHost<&str> = InMemoryHost::new();
        host.reject_next_commit("busy");
        assert_eq!(
            host.commit(Transaction::new()),
            Err(HostError::Rejected("busy".to_string()))
        );
        assert!(host.commit(Transaction::new()).is_ok());
    }

    #[test]
    fn test_front_prefers_visible_modal() {
        let mut host = InMemoryHost::new();
        let (main, modal) = (ViewId::new(), ViewId::new());
        host.restore(main, Container::Main, "main");
        host.restore(modal, Container::Modal, "modal");
        assert_eq!(host.front(), Some((modal, &"modal")));

        let mut tx = Transaction::new();
        tx.hide(modal);
        host.commit(tx).unwrap();
        assert_eq!(host.front(), Some((main, &"main")));
    }
}
