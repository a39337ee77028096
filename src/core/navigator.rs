//! # Navigator
//!
//! The tabbed view navigator. Owns one back-stack per tab and turns
//! navigation intents into Reconciliation Commands.
//!
//! ```text
//! Navigator
//! ├── stacks: MultiStack<T, EntryTag>   // tab → back-stack, MRU tab on top
//! ├── current_tab: Option<T>            // None until initialize()
//! ├── roots: HashMap<T, RootFactory>    // lazily builds each tab's root
//! ├── tab_switches: Vec<InfoEvent>      // flushed with the next command
//! ├── released: Vec<EntryTag>           // dropped by the final pop, still in the host
//! ├── commands: WorkQueue<Envelope>     // → Reconciler
//! ├── selections: WorkQueue<T>          // → Tab Bar
//! ├── info: broadcast::Sender           // → observers, via commit tickets
//! ├── root_reset: Option<UnboundedSender>
//! └── shown: watch::Sender<Option<ViewId>>  // written by the Reconciler
//! ```
//!
//! ## Invariants
//!
//! - Commands are queued in the order intents were issued. Every intent
//!   produces at most one, except `clear_all` (a `Clear` then the new root)
//!   and switching to a tab whose top is a modal (the main view beneath it,
//!   then the modal).
//! - Selecting or switching tabs never discards a tab's stack.
//! - `pop()` never moves to another tab unless the popped entry was modal.
//!
//! All methods take `&mut self` and run on the caller's thread; the
//! navigator never waits on the View Host, it only queues.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use log::{debug, info, warn};
use tokio::sync::{broadcast, mpsc, watch};

use super::channel::{WorkQueue, WorkReceiver};
use super::command::{Command, CommitTicket, Envelope, InfoEvent};
use super::entry::{EntryTag, NewView, RootFactory, RootView, ViewEntry, ViewId};
use super::error::NavigatorError;
use super::multistack::MultiStack;

/// Anything usable as a tab identifier: small, comparable, printable.
pub trait TabId: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> TabId for T where T: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

pub const DEFAULT_INFO_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct NavigatorSettings {
    /// Info events buffered per observer before a slow observer lags.
    pub info_capacity: usize,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            info_capacity: DEFAULT_INFO_CAPACITY,
        }
    }
}

pub struct Navigator<T: TabId, C> {
    stacks: MultiStack<T, EntryTag>,
    tabs: Vec<T>,
    roots: HashMap<T, RootFactory<C>>,
    current_tab: Option<T>,
    default_tab: Option<T>,
    tab_switches: Vec<InfoEvent<T>>,
    released: Vec<EntryTag>,
    commands: WorkQueue<Envelope<T, C>>,
    selections: WorkQueue<T>,
    info: broadcast::Sender<InfoEvent<T>>,
    root_reset: Option<mpsc::UnboundedSender<ViewId>>,
    shown: watch::Sender<Option<ViewId>>,
}

impl<T: TabId, C> Default for Navigator<T, C> {
    fn default() -> Self {
        Self::new(NavigatorSettings::default())
    }
}

impl<T: TabId, C> Navigator<T, C> {
    pub fn new(settings: NavigatorSettings) -> Self {
        let (info, _) = broadcast::channel(settings.info_capacity.max(1));
        let (shown, _) = watch::channel(None);
        Self {
            stacks: MultiStack::new(),
            tabs: Vec::new(),
            roots: HashMap::new(),
            current_tab: None,
            default_tab: None,
            tab_switches: Vec::new(),
            released: Vec::new(),
            commands: WorkQueue::new(),
            selections: WorkQueue::new(),
            info,
            root_reset: None,
            shown,
        }
    }

    /// Configure the tabs and their root factories.
    ///
    /// Safe to call again whenever a new host comes up: later calls replace
    /// the factories and keep every stack. Only the first call shows the
    /// default tab.
    pub fn initialize(
        &mut self,
        tabs: &[T],
        roots: HashMap<T, RootFactory<C>>,
        default_tab: T,
    ) -> Result<(), NavigatorError> {
        if !tabs.contains(&default_tab) {
            return Err(NavigatorError::UnknownDefaultTab(format!("{default_tab:?}")));
        }
        if let Some(tab) = tabs.iter().find(|tab| !roots.contains_key(tab)) {
            return Err(NavigatorError::MissingRootFactory(format!("{tab:?}")));
        }

        self.tabs = tabs.to_vec();
        self.roots = roots;
        self.default_tab = Some(default_tab);
        info!(
            "Navigator initialized with tabs {:?}, default {:?}",
            self.tabs, default_tab
        );

        if self.current_tab.is_none() {
            self.switch_tab(default_tab);
        }
        Ok(())
    }

    fn is_configured(&self, tab: T) -> bool {
        self.tabs.contains(&tab)
    }

    fn build_root(&self, tab: T) -> Option<RootView<C>> {
        self.roots.get(&tab).map(|factory| factory())
    }

    fn set_current_tab(&mut self, tab: T) {
        if self.current_tab == Some(tab) {
            return;
        }
        self.tab_switches.push(InfoEvent::TabSwitched {
            from: self.current_tab,
            to: tab,
        });
        self.current_tab = Some(tab);
        self.selections.send(tab);
    }

    fn emit(&mut self, command: Command<C>) {
        let mut events = std::mem::take(&mut self.tab_switches);
        events.extend(command.info_events());
        debug!("Queueing {} ({} info events)", command.name(), events.len());
        let ticket = CommitTicket::new(events, self.info.clone());
        self.commands.send(Envelope { command, ticket });
    }

    /// Handle a tap on a tab in the tab bar.
    ///
    /// Tapping another tab switches to it. Tapping the current tab pops it
    /// back to its root, or, if it is already at its root, either asks the
    /// reset-root subscriber to reset the view in place or recreates it.
    pub fn select_tab(&mut self, tab: T) {
        if !self.is_configured(tab) {
            debug!("Ignoring selection of unconfigured tab {:?}", tab);
            return;
        }
        if self.current_tab != Some(tab) {
            self.switch_tab(tab);
            return;
        }

        match self.stacks.len_of(tab) {
            0 => self.reset_tab(tab, true),
            1 => {
                if !self.offer_root_reset() {
                    self.reset_tab(tab, true);
                }
            }
            _ => self.reset_tab(tab, false),
        }
    }

    /// Hand the root to the reset-root subscriber when there is a live one
    /// and the host is showing exactly what the stack says.
    fn offer_root_reset(&mut self) -> bool {
        let Some(top) = self.stacks.top().map(|(_, tag)| *tag) else {
            return false;
        };
        let in_sync = *self.shown.borrow() == Some(top.id);
        let Some(subscriber) = self.root_reset.as_ref().filter(|tx| !tx.is_closed()) else {
            return false;
        };
        if !in_sync {
            debug!("Host is out of sync with the stack, recreating root {}", top.id);
            return false;
        }
        subscriber.send(top.id).is_ok()
    }

    /// Switch to `tab`, showing the top of its existing stack or creating
    /// its root. No-op if it is already current or not configured.
    pub fn switch_tab(&mut self, tab: T) {
        if self.current_tab == Some(tab) || !self.is_configured(tab) {
            return;
        }
        self.set_current_tab(tab);

        if self.stacks.stack_exists(tab) {
            self.stacks.touch(tab);
            self.reveal_main_beneath(tab);
            if let Some(top) = self.stacks.peek_value().copied() {
                self.emit(Command::ShowExisting(top));
            }
        } else if let Some(root) = self.build_root(tab) {
            self.add_internal(tab, root.into());
        }
    }

    /// The main view a modal on top of `tab` sits on, if any.
    fn main_beneath(&self, tab: T) -> Option<EntryTag> {
        let (top, below) = self.stacks.get(tab)?.split_last()?;
        if !top.modal {
            return None;
        }
        below.iter().rev().find(|tag| !tag.modal).copied()
    }

    /// Bring back the main view under `tab`'s top modal before the modal
    /// itself is shown, so another tab's view is not left beneath it.
    fn reveal_main_beneath(&mut self, tab: T) {
        if let Some(beneath) = self.main_beneath(tab) {
            self.emit(Command::ShowExisting(beneath));
        }
    }

    /// Push a view onto the current tab. `None` before initialization.
    pub fn push(&mut self, view: NewView<C>) -> Option<ViewId> {
        let Some(tab) = self.current_tab else {
            warn!("push before the navigator was initialized");
            return None;
        };
        Some(self.add_internal(tab, view))
    }

    /// Switch to `tab` and push a view onto it.
    pub fn push_to_tab(&mut self, tab: T, view: NewView<C>) -> Option<ViewId> {
        if !self.is_configured(tab) {
            debug!("Ignoring push to unconfigured tab {:?}", tab);
            return None;
        }
        self.switch_tab(tab);
        self.push(view)
    }

    fn add_internal(&mut self, tab: T, view: NewView<C>) -> ViewId {
        let tag = EntryTag::new(view.detachable, view.modal);
        self.set_current_tab(tab);
        self.stacks.push(tab, tag);
        let entry = ViewEntry {
            tag,
            content: view.content,
        };
        let command = if view.on_top {
            Command::AddOnTop(entry)
        } else {
            Command::AddAndShow(entry)
        };
        self.emit(command);
        tag.id
    }

    /// Remove the top view. Usually wired to the back button.
    ///
    /// Returns `false` when there is nothing left to go back to (the caller
    /// typically exits), and when going back would jump to another tab. In
    /// the second case the popped entry is pushed back onto the current tab,
    /// so the stack contents shift while the depth stays the same. Modal
    /// entries can always be popped.
    pub fn pop(&mut self) -> bool {
        let Some(popped) = self.stacks.pop() else {
            debug!("Nothing to pop");
            return false;
        };
        let Some((tab, next)) = self.stacks.peek().map(|(tab, tag)| (tab, *tag)) else {
            debug!("Popped the last view {}", popped.id);
            // Still in the host; the next recreated root or clear removes it
            self.released.push(popped);
            return false;
        };

        if self.current_tab != Some(tab) {
            if !popped.modal {
                if let Some(current) = self.current_tab {
                    self.stacks.push(current, popped);
                }
                debug!("Rejected pop that would leave tab {:?}", self.current_tab);
                return false;
            }
            self.set_current_tab(tab);
            self.reveal_main_beneath(tab);
        }

        self.emit(Command::ShowAndRemove {
            show: next,
            remove: popped,
        });
        true
    }

    /// Clear `tab`'s stack and make it current.
    ///
    /// With `recreate_root` the whole stack is replaced by a fresh root from
    /// the tab's factory. Without it the existing root is kept and shown.
    pub fn reset_tab(&mut self, tab: T, recreate_root: bool) {
        if !self.is_configured(tab) {
            debug!("Ignoring reset of unconfigured tab {:?}", tab);
            return;
        }
        if recreate_root {
            if let Some(root) = self.build_root(tab) {
                self.add_root_view(tab, root);
            }
            return;
        }

        self.switch_tab(tab);
        self.stacks.touch(tab);
        let above_root: Vec<EntryTag> = self
            .stacks
            .get(tab)
            .and_then(|stack| stack.get(1..))
            .map(<[EntryTag]>::to_vec)
            .unwrap_or_default();
        if above_root.is_empty() {
            return;
        }
        for _ in 0..above_root.len() {
            self.stacks.pop();
        }
        if let Some(root) = self.stacks.peek_value().copied() {
            self.emit(Command::RemoveAllAndShowExisting {
                remove: above_root,
                show: root,
            });
        }
    }

    /// Replace `tab`'s whole stack with `root` and switch to it. A later
    /// recreating reset goes back to the factory's root.
    pub fn add_root_view(&mut self, tab: T, root: RootView<C>) -> Option<ViewId> {
        if !self.is_configured(tab) {
            debug!("Ignoring root for unconfigured tab {:?}", tab);
            return None;
        }
        let mut remove = self.stacks.remove(tab).unwrap_or_default();
        remove.append(&mut self.released);
        self.set_current_tab(tab);
        let tag = EntryTag::new(root.detachable, false);
        self.stacks.push(tab, tag);
        self.emit(Command::RemoveAllAndAdd {
            remove,
            add: ViewEntry {
                tag,
                content: root.content,
            },
        });
        Some(tag.id)
    }

    /// Drop every tab's stack and start over on the default tab with a fresh
    /// root.
    pub fn clear_all(&mut self) {
        let Some(default_tab) = self.default_tab else {
            warn!("clear_all before the navigator was initialized");
            return;
        };
        let mut all: Vec<EntryTag> = self.stacks.values().copied().collect();
        all.append(&mut self.released);
        self.stacks.clear();
        info!("Clearing {} views", all.len());
        self.emit(Command::Clear(all));

        if let Some(root) = self.build_root(default_tab) {
            self.add_internal(default_tab, root.into());
        }
    }

    /// Remove views the host reports but no stack knows about, such as views
    /// the platform restored from a previous process. Returns how many were
    /// scheduled for removal; issues no command when there are none.
    pub fn reconcile_against_host(&mut self, host_views: impl IntoIterator<Item = ViewId>) -> usize {
        let known: HashSet<ViewId> = self.stacks.values().map(|tag| tag.id).collect();
        let unknown: Vec<ViewId> = host_views
            .into_iter()
            .filter(|id| !known.contains(id))
            .collect();
        if unknown.is_empty() {
            return 0;
        }
        info!("Removing {} views unknown to the navigator", unknown.len());
        self.released.retain(|tag| !unknown.contains(&tag.id));
        let count = unknown.len();
        self.emit(Command::RemoveUnknown(unknown));
        count
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn current_tab(&self) -> Option<T> {
        self.current_tab
    }

    pub fn default_tab(&self) -> Option<T> {
        self.default_tab
    }

    pub fn tabs(&self) -> &[T] {
        &self.tabs
    }

    pub fn is_initialized(&self) -> bool {
        self.current_tab.is_some()
    }

    pub fn is_at_root_of_stack(&self) -> bool {
        self.current_stack_size() == 1
    }

    pub fn current_stack_size(&self) -> usize {
        self.current_tab.map_or(0, |tab| self.stacks.len_of(tab))
    }

    pub fn stack_depth(&self, tab: T) -> usize {
        self.stacks.len_of(tab)
    }

    /// Bottom-to-top snapshot of `tab`'s stack.
    pub fn stack(&self, tab: T) -> &[EntryTag] {
        self.stacks.get(tab).unwrap_or_default()
    }

    /// The entry on top of the most recently used stack.
    pub fn current_view(&self) -> Option<EntryTag> {
        self.stacks.top().map(|(_, tag)| *tag)
    }

    pub fn is_showing_modal(&self) -> bool {
        self.current_view().is_some_and(|tag| tag.modal)
    }

    pub fn known_views(&self) -> Vec<ViewId> {
        self.stacks.values().map(|tag| tag.id).collect()
    }

    /// Commands queued and not yet taken by a consumer.
    pub fn pending_commands(&self) -> usize {
        self.commands.backlog()
    }

    // ------------------------------------------------------------------
    // Streams
    // ------------------------------------------------------------------

    /// Info events, delivered after the host commits the change.
    pub fn subscribe_info(&self) -> broadcast::Receiver<InfoEvent<T>> {
        self.info.subscribe()
    }

    /// Take over "tap current tab while at its root". While the returned
    /// receiver is alive, that gesture sends the root's id here instead of
    /// recreating the root. Replaces any previous subscriber.
    pub fn subscribe_root_reset(&mut self) -> mpsc::UnboundedReceiver<ViewId> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.root_reset = Some(tx);
        rx
    }

    /// Attach the consumer of Reconciliation Commands.
    pub fn command_receiver(&self) -> WorkReceiver<Envelope<T, C>> {
        self.commands.attach()
    }

    /// Attach the consumer of tab-bar selection updates.
    pub fn selection_receiver(&self) -> WorkReceiver<T> {
        self.selections.attach()
    }

    /// Where the Reconciler reports the view it last showed.
    pub fn shown_view_sender(&self) -> watch::Sender<Option<ViewId>> {
        self.shown.clone()
    }
}
