//! # Host Binding
//!
//! Connects a [`Navigator`] to one live View Host and its tab bar.
//!
//! A host can come and go many times during the life of the navigator (the
//! platform tears screens down and rebuilds them). While no host is bound,
//! commands and tab selections stay queued in the navigator; `start` picks
//! them up in order.
//!
//! ```text
//! HostBinding
//! ├── reconciler: Reconciler<C>     // survives host restarts
//! └── attached: Option<Attached>
//!     ├── host: H                   // ViewHost<C>
//!     ├── tab_bar: B                // TabBar<T>
//!     ├── commands: WorkReceiver    // navigator → reconciler
//!     └── selections: WorkReceiver  // navigator → tab bar
//! ```

use log::{debug, info, warn};

use super::reconciler::Reconciler;
use super::{HostError, ViewHost};
use crate::core::channel::WorkReceiver;
use crate::core::command::Envelope;
use crate::core::error::NavigatorError;
use crate::core::navigator::{Navigator, TabId};

/// The visible tab selector.
pub trait TabBar<T> {
    /// Tabs shown in the bar, in display order.
    fn tabs(&self) -> Vec<T>;

    /// Mark `tab` as selected without the user touching it. Implementations
    /// that report selections back must report this one as
    /// [`SelectionSource::Programmatic`].
    fn set_selected(&mut self, tab: T);
}

/// Who changed the tab bar selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    User,
    /// Echo of a [`TabBar::set_selected`] call.
    Programmatic,
}

struct Attached<T, C, H, B> {
    host: H,
    tab_bar: B,
    commands: WorkReceiver<Envelope<T, C>>,
    selections: WorkReceiver<T>,
}

pub struct HostBinding<T, C, H, B> {
    reconciler: Reconciler<C>,
    attached: Option<Attached<T, C, H, B>>,
}

impl<T, C, H, B> HostBinding<T, C, H, B>
where
    T: TabId,
    C: Clone,
    H: ViewHost<C>,
    B: TabBar<T>,
{
    pub fn new(navigator: &Navigator<T, C>) -> Self {
        Self {
            reconciler: Reconciler::new(navigator.shown_view_sender()),
            attached: None,
        }
    }

    /// Bind a freshly created host and tab bar.
    ///
    /// Removes any host views the navigator does not know about, then
    /// applies everything queued while no host was bound. A binding that is
    /// already started is stopped first and its host dropped.
    pub fn start(
        &mut self,
        navigator: &mut Navigator<T, C>,
        host: H,
        tab_bar: B,
    ) -> Result<(), NavigatorError> {
        let bar_tabs = tab_bar.tabs();
        if let Some(tab) = bar_tabs.iter().find(|tab| !navigator.tabs().contains(tab)) {
            return Err(NavigatorError::TabBarMismatch(format!("{tab:?}")));
        }
        if let Some(tab) = navigator.default_tab().filter(|tab| !bar_tabs.contains(tab)) {
            return Err(NavigatorError::TabBarMismatch(format!("{tab:?}")));
        }

        if self.stop().is_some() {
            warn!("Host bound twice, dropping the previous host");
        }

        let leftovers: Vec<_> = host.items().into_iter().map(|item| item.id).collect();
        self.attached = Some(Attached {
            host,
            tab_bar,
            commands: navigator.command_receiver(),
            selections: navigator.selection_receiver(),
        });
        info!(
            "Host bound ({} views present, {} commands queued)",
            leftovers.len(),
            navigator.pending_commands()
        );

        navigator.reconcile_against_host(leftovers);
        // Selection sync must not depend on the host accepting every command
        if let Err(e) = self.pump() {
            warn!("Initial sync with host failed: {}", e);
        }
        Ok(())
    }

    /// Unbind the host. Commands issued from now on queue up until the next
    /// `start`.
    pub fn stop(&mut self) -> Option<(H, B)> {
        let attached = self.attached.take()?;
        debug!("Host unbound");
        attached.commands.detach();
        attached.selections.detach();
        Some((attached.host, attached.tab_bar))
    }

    /// Apply every queued command to the host, then bring the tab bar in
    /// line with the navigator. Returns how many commands were applied.
    ///
    /// Stops at the first command the host rejects; the rest stay queued.
    pub fn pump(&mut self) -> Result<usize, HostError> {
        let Some(attached) = self.attached.as_mut() else {
            return Ok(0);
        };

        let mut applied = 0;
        while let Some(envelope) = attached.commands.try_recv() {
            self.reconciler.apply(&mut attached.host, envelope)?;
            applied += 1;
        }
        while let Some(tab) = attached.selections.try_recv() {
            attached.tab_bar.set_selected(tab);
        }
        Ok(applied)
    }

    /// Tab bar selection callback. Only user taps reach the navigator;
    /// returns whether this one did.
    pub fn on_tab_selected(
        &self,
        navigator: &mut Navigator<T, C>,
        tab: T,
        source: SelectionSource,
    ) -> bool {
        match source {
            SelectionSource::User => {
                navigator.select_tab(tab);
                true
            }
            SelectionSource::Programmatic => {
                debug!("Ignoring programmatic selection of {:?}", tab);
                false
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.attached.is_some()
    }

    pub fn host(&self) -> Option<&H> {
        self.attached.as_ref().map(|attached| &attached.host)
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.attached.as_mut().map(|attached| &mut attached.host)
    }

    pub fn tab_bar(&self) -> Option<&B> {
        self.attached.as_ref().map(|attached| &attached.tab_bar)
    }

    pub fn reconciler(&self) -> &Reconciler<C> {
        &self.reconciler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{NewView, ViewId};
    use crate::host::{Container, InMemoryHost, Visibility};
    use crate::test_support::{RecordingTabBar, Tab, root_factories};

    type Binding = HostBinding<Tab, String, InMemoryHost<String>, RecordingTabBar>;

    fn navigator() -> Navigator<Tab, String> {
        let mut nav = Navigator::default();
        nav.initialize(&[Tab::Home, Tab::Search], root_factories(), Tab::Home)
            .unwrap();
        nav
    }

    fn bar() -> RecordingTabBar {
        RecordingTabBar::new(&[Tab::Home, Tab::Search])
    }

    #[test]
    fn test_start_rejects_unknown_tab_bar_item() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        let bar = RecordingTabBar::new(&[Tab::Home, Tab::Search, Tab::Library]);
        let err = binding
            .start(&mut nav, InMemoryHost::new(), bar)
            .unwrap_err();
        assert_eq!(err, NavigatorError::TabBarMismatch("Library".to_string()));
        assert!(!binding.is_started());
    }

    #[test]
    fn test_start_rejects_bar_without_default_tab() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        let bar = RecordingTabBar::new(&[Tab::Search]);
        assert!(matches!(
            binding.start(&mut nav, InMemoryHost::new(), bar),
            Err(NavigatorError::TabBarMismatch(_))
        ));
    }

    #[test]
    fn test_start_applies_backlog_and_syncs_tab_bar() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        binding.start(&mut nav, InMemoryHost::new(), bar()).unwrap();

        let host = binding.host().unwrap();
        let root = nav.current_view().unwrap();
        assert_eq!(host.front(), Some((root.id, &"home-root".to_string())));
        assert_eq!(binding.tab_bar().unwrap().selected, vec![Tab::Home]);
        assert_eq!(nav.pending_commands(), 0);
    }

    #[test]
    fn test_commands_issued_while_stopped_survive_restart() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        binding.start(&mut nav, InMemoryHost::new(), bar()).unwrap();
        let (host, tab_bar) = binding.stop().unwrap();

        let x = nav.push_to_tab(Tab::Search, NewView::new("x".to_string())).unwrap();
        assert_eq!(nav.pending_commands(), 2);

        binding.start(&mut nav, host, tab_bar).unwrap();
        let host = binding.host().unwrap();
        assert_eq!(host.front(), Some((x, &"x".to_string())));
        assert_eq!(host.visible(Container::Main), vec![x]);
        assert_eq!(
            binding.tab_bar().unwrap().selected,
            vec![Tab::Home, Tab::Search]
        );
    }

    #[test]
    fn test_start_removes_views_unknown_to_navigator() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        binding.start(&mut nav, InMemoryHost::new(), bar()).unwrap();
        let (mut host, tab_bar) = binding.stop().unwrap();

        let stray = ViewId::new();
        host.restore(stray, Container::Main, "stray".to_string());
        binding.start(&mut nav, host, tab_bar).unwrap();

        let host = binding.host().unwrap();
        assert_eq!(host.content(stray), None);
        assert_eq!(host.len(), 1);
    }

    #[test]
    fn test_pump_stops_at_rejected_command() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        binding.start(&mut nav, InMemoryHost::new(), bar()).unwrap();

        nav.push(NewView::new("a".to_string()));
        nav.push(NewView::new("b".to_string()));
        binding.host_mut().unwrap().reject_next_commit("busy");
        assert!(matches!(binding.pump(), Err(HostError::Rejected(_))));
        assert_eq!(nav.pending_commands(), 1);

        assert_eq!(binding.pump(), Ok(1));
        let host = binding.host().unwrap();
        assert_eq!(host.front().map(|(_, c)| c.as_str()), Some("b"));
    }

    #[test]
    fn test_programmatic_selection_is_not_forwarded() {
        let mut nav = navigator();
        let binding: Binding = HostBinding::new(&nav);
        assert!(!binding.on_tab_selected(&mut nav, Tab::Search, SelectionSource::Programmatic));
        assert_eq!(nav.current_tab(), Some(Tab::Home));

        assert!(binding.on_tab_selected(&mut nav, Tab::Search, SelectionSource::User));
        assert_eq!(nav.current_tab(), Some(Tab::Search));
    }

    #[test]
    fn test_pump_without_host_is_noop() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        nav.push(NewView::new("a".to_string()));
        assert_eq!(binding.pump(), Ok(0));
        assert_eq!(nav.pending_commands(), 2);
    }

    #[test]
    fn test_returning_to_tab_with_modal_restores_its_main_view() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        binding.start(&mut nav, InMemoryHost::new(), bar()).unwrap();
        let home_root = nav.current_view().unwrap();
        let modal = nav.push(NewView::new("player".to_string()).modal()).unwrap();
        nav.select_tab(Tab::Search);
        let search_root = nav.current_view().unwrap();
        nav.select_tab(Tab::Home);
        binding.pump().unwrap();

        let host = binding.host().unwrap();
        assert_eq!(host.visible(Container::Main), vec![home_root.id]);
        assert_eq!(host.visible(Container::Modal), vec![modal]);
        assert_eq!(host.visibility(search_root.id), Some(Visibility::Detached));
    }

    #[test]
    fn test_root_dropped_by_final_pop_leaves_host() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        binding.start(&mut nav, InMemoryHost::new(), bar()).unwrap();
        let old_root = nav.current_view().unwrap();
        assert!(!nav.pop());
        binding.pump().unwrap();
        assert_eq!(binding.host().unwrap().len(), 1);

        nav.select_tab(Tab::Home);
        binding.pump().unwrap();
        let host = binding.host().unwrap();
        assert_eq!(host.len(), 1);
        assert_eq!(host.content(old_root.id), None);

        nav.clear_all();
        binding.pump().unwrap();
        assert_eq!(binding.host().unwrap().len(), 1);
    }

    #[test]
    fn test_retained_view_is_hidden_not_detached() {
        let mut nav = navigator();
        let mut binding: Binding = HostBinding::new(&nav);
        binding.start(&mut nav, InMemoryHost::new(), bar()).unwrap();
        let kept = nav.push(NewView::new("kept".to_string()).retained()).unwrap();
        nav.push(NewView::new("next".to_string()));
        binding.pump().unwrap();

        let host = binding.host().unwrap();
        assert_eq!(host.visibility(kept), Some(Visibility::Hidden));
    }
}
