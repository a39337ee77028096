//! # Reconciler
//!
//! Turns one Reconciliation Command into one atomic host [`Transaction`].
//!
//! | Command                    | Transaction                                        |
//! |----------------------------|----------------------------------------------------|
//! | `AddAndShow(e)`            | add e, hide siblings                               |
//! | `AddOnTop(e)`              | add e                                              |
//! | `ShowExisting(e)`          | show/attach e, hide siblings                       |
//! | `ShowAndRemove(s, r)`      | remove r, show/attach s, hide siblings             |
//! | `Clear(all)`               | remove all, plus every view registered here        |
//! | `RemoveAllAndAdd(rs, e)`   | remove rs, add e, hide siblings                    |
//! | `RemoveAllAndShowExisting` | remove rs, show/attach e, hide siblings            |
//! | `RemoveUnknown(ids)`       | remove ids                                         |
//!
//! "Hide siblings" hides every other visible view the reconciler registered:
//! detachable ones are detached, the rest hidden in place. A modal only
//! hides other modals, so the view underneath stays on screen.
//!
//! Removing a view the host does not have is skipped. Showing one it does
//! not have is an error.
//!
//! The commit ticket, and with it every info event of the command, is
//! released only after the host accepted the transaction.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use tokio::sync::watch;

use super::{Container, HostError, Transaction, ViewHost, Visibility};
use crate::core::command::{Command, Envelope};
use crate::core::entry::{EntryTag, ViewEntry, ViewId};

struct Registered<C> {
    tag: EntryTag,
    content: C,
}

/// A transaction plus the registry changes to make once it commits.
struct Plan<C> {
    transaction: Transaction<C>,
    added: Vec<ViewEntry<C>>,
    removed: HashSet<ViewId>,
}

impl<C> Plan<C> {
    fn new() -> Self {
        Self {
            transaction: Transaction::new(),
            added: Vec::new(),
            removed: HashSet::new(),
        }
    }
}

/// Applies commands to a [`ViewHost`]. Keeps a registry of the entries it
/// has added, which outlives any single host instance.
pub struct Reconciler<C> {
    registry: HashMap<ViewId, Registered<C>>,
    shown: watch::Sender<Option<ViewId>>,
}

impl<C: Clone> Reconciler<C> {
    /// `shown` receives the id of the view each committed command leaves
    /// showing; see [`Navigator::shown_view_sender`](crate::core::navigator::Navigator::shown_view_sender).
    pub fn new(shown: watch::Sender<Option<ViewId>>) -> Self {
        Self {
            registry: HashMap::new(),
            shown,
        }
    }

    pub fn registered(&self, id: ViewId) -> Option<EntryTag> {
        self.registry.get(&id).map(|entry| entry.tag)
    }

    pub fn content(&self, id: ViewId) -> Option<&C> {
        self.registry.get(&id).map(|entry| &entry.content)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Apply one command. On failure the host is left as it was and the
    /// command's info events are discarded.
    pub fn apply<T: Clone, H: ViewHost<C>>(
        &mut self,
        host: &mut H,
        envelope: Envelope<T, C>,
    ) -> Result<(), HostError> {
        let Envelope { command, ticket } = envelope;
        let name = command.name();
        let shown = command.shown().map(|tag| tag.id);
        let clears = matches!(command, Command::Clear(_));

        let plan = self.plan(host, command)?;
        let ops = plan.transaction.len();
        if !plan.transaction.is_empty() {
            if let Err(e) = host.commit(plan.transaction) {
                warn!("{} failed: {}", name, e);
                return Err(e);
            }
        }

        if clears {
            self.registry.clear();
        }
        for id in &plan.removed {
            self.registry.remove(id);
        }
        for entry in plan.added {
            self.registry.insert(
                entry.tag.id,
                Registered {
                    tag: entry.tag,
                    content: entry.content,
                },
            );
        }
        if shown.is_some() || clears {
            self.shown.send_replace(shown);
        }

        let events = ticket.commit();
        debug!("{} committed ({} ops, {} info events)", name, ops, events);
        Ok(())
    }

    fn plan<H: ViewHost<C>>(&self, host: &H, command: Command<C>) -> Result<Plan<C>, HostError> {
        let mut plan = Plan::new();
        match command {
            Command::AddAndShow(entry) => {
                let keep = entry.tag;
                self.add(host, &mut plan, entry)?;
                self.hide_siblings(host, &mut plan, &keep);
            }
            Command::AddOnTop(entry) => {
                self.add(host, &mut plan, entry)?;
            }
            Command::ShowExisting(tag) => {
                self.reveal(host, &mut plan, &tag)?;
                self.hide_siblings(host, &mut plan, &tag);
            }
            Command::ShowAndRemove { show, remove } => {
                self.remove(host, &mut plan, remove.id);
                self.reveal(host, &mut plan, &show)?;
                self.hide_siblings(host, &mut plan, &show);
            }
            Command::Clear(all) => {
                let registered = self.registry.keys().copied();
                for id in all.into_iter().map(|tag| tag.id).chain(registered) {
                    self.remove(host, &mut plan, id);
                }
            }
            Command::RemoveAllAndAdd { remove, add } => {
                for tag in remove {
                    self.remove(host, &mut plan, tag.id);
                }
                let keep = add.tag;
                self.add(host, &mut plan, add)?;
                self.hide_siblings(host, &mut plan, &keep);
            }
            Command::RemoveAllAndShowExisting { remove, show } => {
                for tag in remove {
                    self.remove(host, &mut plan, tag.id);
                }
                self.reveal(host, &mut plan, &show)?;
                self.hide_siblings(host, &mut plan, &show);
            }
            Command::RemoveUnknown(unknown) => {
                for id in unknown {
                    self.remove(host, &mut plan, id);
                }
            }
        }
        Ok(plan)
    }

    fn add<H: ViewHost<C>>(
        &self,
        host: &H,
        plan: &mut Plan<C>,
        entry: ViewEntry<C>,
    ) -> Result<(), HostError> {
        if host.find(entry.tag.id).is_some() {
            // Already there from an earlier delivery: just make sure it shows
            return self.reveal(host, plan, &entry.tag);
        }
        plan.transaction
            .add(entry.tag.id, Container::for_tag(&entry.tag), entry.content.clone());
        plan.added.push(entry);
        Ok(())
    }

    fn remove<H: ViewHost<C>>(&self, host: &H, plan: &mut Plan<C>, id: ViewId) {
        if host.find(id).is_none() {
            debug!("Skipping removal of {}: not in host", id);
            return;
        }
        if plan.removed.insert(id) {
            plan.transaction.remove(id);
        }
    }

    fn reveal<H: ViewHost<C>>(
        &self,
        host: &H,
        plan: &mut Plan<C>,
        tag: &EntryTag,
    ) -> Result<(), HostError> {
        let item = host.find(tag.id).ok_or(HostError::Missing(tag.id))?;
        match item.visibility {
            Visibility::Detached => {
                plan.transaction.attach(tag.id);
            }
            Visibility::Hidden => {
                plan.transaction.show(tag.id);
            }
            Visibility::Visible => {}
        }
        Ok(())
    }

    fn hide_siblings<H: ViewHost<C>>(&self, host: &H, plan: &mut Plan<C>, keep: &EntryTag) {
        for item in host.items() {
            if item.id == keep.id
                || item.visibility != Visibility::Visible
                || plan.removed.contains(&item.id)
                || (keep.modal && item.container != Container::Modal)
            {
                continue;
            }
            // Unregistered leftovers are for RemoveUnknown, not for us
            let Some(sibling) = self.registry.get(&item.id) else {
                continue;
            };
            if sibling.tag.detachable {
                plan.transaction.detach(item.id);
            } else {
                plan.transaction.hide(item.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{CommitTicket, InfoEvent};
    use crate::host::InMemoryHost;
    use tokio::sync::broadcast;

    struct Fixture {
        reconciler: Reconciler<&'static str>,
        host: InMemoryHost<&'static str>,
        info_tx: broadcast::Sender<InfoEvent<u8>>,
        info_rx: broadcast::Receiver<InfoEvent<u8>>,
        shown_rx: watch::Receiver<Option<ViewId>>,
    }

    impl Fixture {
        fn new() -> Self {
            let (shown_tx, shown_rx) = watch::channel(None);
            let (info_tx, info_rx) = broadcast::channel(16);
            Self {
                reconciler: Reconciler::new(shown_tx),
                host: InMemoryHost::new(),
                info_tx,
                info_rx,
                shown_rx,
            }
        }

        fn apply(&mut self, command: Command<&'static str>) -> Result<(), HostError> {
            let events = command.info_events();
            let ticket = CommitTicket::new(events, self.info_tx.clone());
            self.reconciler
                .apply(&mut self.host, Envelope { command, ticket })
        }
    }

    fn entry(content: &'static str, detachable: bool, modal: bool) -> ViewEntry<&'static str> {
        ViewEntry {
            tag: EntryTag::new(detachable, modal),
            content,
        }
    }

    #[test]
    fn test_add_and_show_detaches_or_hides_siblings() {
        let mut fx = Fixture::new();
        let a = entry("a", true, false);
        let b = entry("b", false, false);
        let c = entry("c", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        fx.apply(Command::AddAndShow(b.clone())).unwrap();
        assert_eq!(fx.host.visibility(a.tag.id), Some(Visibility::Detached));

        fx.apply(Command::AddAndShow(c.clone())).unwrap();
        assert_eq!(fx.host.visibility(b.tag.id), Some(Visibility::Hidden));
        assert_eq!(fx.host.visible(Container::Main), vec![c.tag.id]);
        assert_eq!(*fx.shown_rx.borrow(), Some(c.tag.id));
        assert_eq!(fx.reconciler.content(c.tag.id), Some(&"c"));
    }

    #[test]
    fn test_add_on_top_leaves_siblings_visible() {
        let mut fx = Fixture::new();
        let a = entry("a", true, false);
        let sheet = entry("sheet", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        fx.apply(Command::AddOnTop(sheet.clone())).unwrap();
        assert_eq!(fx.host.visible(Container::Main), vec![a.tag.id, sheet.tag.id]);
    }

    #[test]
    fn test_modal_keeps_main_view_visible() {
        let mut fx = Fixture::new();
        let a = entry("a", true, false);
        let modal = entry("player", true, true);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        fx.apply(Command::AddAndShow(modal.clone())).unwrap();
        assert_eq!(fx.host.visible(Container::Main), vec![a.tag.id]);
        assert_eq!(fx.host.visible(Container::Modal), vec![modal.tag.id]);

        // Showing a main view hides the modal too
        let b = entry("b", true, false);
        fx.apply(Command::AddAndShow(b.clone())).unwrap();
        assert!(fx.host.visible(Container::Modal).is_empty());
    }

    #[test]
    fn test_show_and_remove_attaches_detached_view() {
        let mut fx = Fixture::new();
        let a = entry("a", true, false);
        let b = entry("b", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        fx.apply(Command::AddAndShow(b.clone())).unwrap();

        fx.apply(Command::ShowAndRemove {
            show: a.tag,
            remove: b.tag,
        })
        .unwrap();
        assert_eq!(fx.host.visibility(a.tag.id), Some(Visibility::Visible));
        assert_eq!(fx.host.visibility(b.tag.id), None);
        assert_eq!(fx.reconciler.registered(b.tag.id), None);
        assert_eq!(fx.reconciler.len(), 1);
    }

    #[test]
    fn test_show_existing_unhides_retained_view() {
        let mut fx = Fixture::new();
        let a = entry("a", false, false);
        let b = entry("b", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        fx.apply(Command::AddAndShow(b.clone())).unwrap();
        fx.apply(Command::ShowExisting(a.tag)).unwrap();

        assert_eq!(fx.host.visibility(a.tag.id), Some(Visibility::Visible));
        assert_eq!(fx.host.visibility(b.tag.id), Some(Visibility::Detached));
    }

    #[test]
    fn test_show_missing_view_fails_without_events() {
        let mut fx = Fixture::new();
        let ghost = EntryTag::new(true, false);
        let result = fx.apply(Command::ShowExisting(ghost));
        assert_eq!(result, Err(HostError::Missing(ghost.id)));
        assert_eq!(fx.host.commit_count(), 0);
    }

    #[test]
    fn test_events_only_after_successful_commit() {
        let mut fx = Fixture::new();
        let a = entry("a", true, false);
        fx.host.reject_next_commit("host is gone");
        assert!(fx.apply(Command::AddAndShow(a.clone())).is_err());
        assert!(fx.info_rx.try_recv().is_err());
        assert!(fx.reconciler.is_empty());
        assert_eq!(*fx.shown_rx.borrow(), None);

        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        assert_eq!(
            fx.info_rx.try_recv().ok(),
            Some(InfoEvent::ViewAdded { entry: a.tag })
        );
    }

    #[test]
    fn test_clear_and_bulk_removals_skip_missing_views() {
        let mut fx = Fixture::new();
        let a = entry("a", true, false);
        let b = entry("b", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        fx.apply(Command::AddAndShow(b.clone())).unwrap();

        let never_added = EntryTag::new(true, false);
        fx.apply(Command::Clear(vec![a.tag, b.tag, never_added]))
            .unwrap();
        assert!(fx.host.is_empty());
        assert!(fx.reconciler.is_empty());
        assert_eq!(*fx.shown_rx.borrow(), None);
    }

    #[test]
    fn test_clear_removes_registered_views_it_was_not_told_about() {
        let mut fx = Fixture::new();
        let forgotten = entry("forgotten", true, false);
        let a = entry("a", true, false);
        fx.apply(Command::AddAndShow(forgotten.clone())).unwrap();
        fx.apply(Command::AddAndShow(a.clone())).unwrap();

        fx.apply(Command::Clear(vec![a.tag])).unwrap();
        assert!(fx.host.is_empty());
        assert!(fx.reconciler.is_empty());
    }

    #[test]
    fn test_clear_leaves_unregistered_views_alone() {
        let mut fx = Fixture::new();
        let stray = ViewId::new();
        fx.host.restore(stray, Container::Main, "stray");
        let a = entry("a", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();

        fx.apply(Command::Clear(vec![a.tag])).unwrap();
        assert_eq!(fx.host.len(), 1);
        assert_eq!(fx.host.content(stray), Some(&"stray"));
    }

    #[test]
    fn test_remove_all_and_add_is_one_transaction() {
        let mut fx = Fixture::new();
        let a = entry("a", true, false);
        let b = entry("b", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        fx.apply(Command::AddAndShow(b.clone())).unwrap();
        let commits = fx.host.commit_count();

        let root = entry("root", true, false);
        fx.apply(Command::RemoveAllAndAdd {
            remove: vec![a.tag, b.tag],
            add: root.clone(),
        })
        .unwrap();
        assert_eq!(fx.host.commit_count(), commits + 1);
        assert_eq!(fx.host.visible(Container::Main), vec![root.tag.id]);
        assert_eq!(fx.host.len(), 1);
    }

    #[test]
    fn test_remove_all_and_show_existing_keeps_root() {
        let mut fx = Fixture::new();
        let root = entry("root", true, false);
        let a = entry("a", true, false);
        fx.apply(Command::AddAndShow(root.clone())).unwrap();
        fx.apply(Command::AddAndShow(a.clone())).unwrap();

        fx.apply(Command::RemoveAllAndShowExisting {
            remove: vec![a.tag],
            show: root.tag,
        })
        .unwrap();
        assert_eq!(fx.host.visible(Container::Main), vec![root.tag.id]);
        assert_eq!(fx.host.len(), 1);
    }

    #[test]
    fn test_remove_unknown_only_touches_listed_views() {
        let mut fx = Fixture::new();
        let a = entry("a", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        let stray = ViewId::new();
        fx.host.restore(stray, Container::Main, "stray");

        fx.apply(Command::RemoveUnknown(vec![stray])).unwrap();
        assert_eq!(fx.host.content(stray), None);
        assert_eq!(fx.host.content(a.tag.id), Some(&"a"));

        // Nothing left to remove: no transaction at all
        let commits = fx.host.commit_count();
        fx.apply(Command::RemoveUnknown(vec![stray])).unwrap();
        assert_eq!(fx.host.commit_count(), commits);
    }

    #[test]
    fn test_unregistered_views_are_not_hidden() {
        let mut fx = Fixture::new();
        let stray = ViewId::new();
        fx.host.restore(stray, Container::Main, "stray");
        let a = entry("a", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        assert_eq!(fx.host.visibility(stray), Some(Visibility::Visible));
    }

    #[test]
    fn test_redelivered_add_only_reveals() {
        let mut fx = Fixture::new();
        let a = entry("a", true, false);
        let b = entry("b", true, false);
        fx.apply(Command::AddAndShow(a.clone())).unwrap();
        fx.apply(Command::AddAndShow(b.clone())).unwrap();
        fx.apply(Command::AddAndShow(a.clone())).unwrap();

        assert_eq!(fx.host.len(), 2);
        assert_eq!(fx.host.visible(Container::Main), vec![a.tag.id]);
        assert_eq!(fx.reconciler.len(), 2);
    }
}
