//! # Demo Application State
//!
//! Wires a [`Navigator`] to an [`InMemoryHost`] for the terminal front-end
//! and the headless runner. No rendering here; both front-ends drive the
//! same `App`.
//!
//! ```text
//! App
//! ├── config: ResolvedConfig                 // tabs, default tab, capacities
//! ├── navigator: Navigator<TabIndex, DemoView>
//! ├── binding: HostBinding                   // reconciler + in-memory host + tab bar
//! ├── root_reset: UnboundedReceiver<ViewId>  // "tap current tab at root"
//! ├── status_message: String                 // last thing worth telling the user
//! └── pages: u32                             // counter for generated titles
//! ```
//!
//! Every intent is followed by [`App::sync`], which pumps queued commands
//! into the host the same way a platform's main loop would.

use std::collections::HashMap;
use std::fmt;

use log::{info, warn};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::config::{ResolvedConfig, TabSpec};
use crate::core::entry::{EntryTag, NewView, RootFactory, RootView, ViewId};
use crate::core::error::NavigatorError;
use crate::core::navigator::{Navigator, NavigatorSettings};
use crate::host::{Container, HostBinding, InMemoryHost, SelectionSource, TabBar};

/// Tabs are identified by their position in the configured tab list.
pub type TabIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Root,
    Page,
    Modal,
    Overlay,
    /// Restored by the host without the navigator knowing about it.
    Stray,
}

/// Content of one demo view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoView {
    pub title: String,
    /// Id of the tab the view was created for.
    pub tab: String,
    pub kind: ViewKind,
}

impl DemoView {
    pub fn new(title: impl Into<String>, tab: impl Into<String>, kind: ViewKind) -> Self {
        Self {
            title: title.into(),
            tab: tab.into(),
            kind,
        }
    }
}

impl fmt::Display for DemoView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViewKind::Modal => write!(f, "[{}]", self.title),
            ViewKind::Overlay => write!(f, "^{}", self.title),
            _ => write!(f, "{}", self.title),
        }
    }
}

/// Tab bar that remembers the last programmatic selection.
#[derive(Debug, Clone, Default)]
pub struct DemoTabBar {
    tabs: Vec<TabIndex>,
    selected: Option<TabIndex>,
}

impl DemoTabBar {
    pub fn new(count: usize) -> Self {
        Self {
            tabs: (0..count).collect(),
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<TabIndex> {
        self.selected
    }
}

impl TabBar<TabIndex> for DemoTabBar {
    fn tabs(&self) -> Vec<TabIndex> {
        self.tabs.clone()
    }

    fn set_selected(&mut self, tab: TabIndex) {
        self.selected = Some(tab);
    }
}

fn root_factories(tabs: &[TabSpec]) -> HashMap<TabIndex, RootFactory<DemoView>> {
    tabs.iter()
        .enumerate()
        .map(|(index, spec)| {
            let spec = spec.clone();
            let factory: RootFactory<DemoView> = Box::new(move || {
                let view = DemoView::new(spec.title.clone(), spec.id.clone(), ViewKind::Root);
                if spec.detachable {
                    RootView::new(view)
                } else {
                    RootView::retained(view)
                }
            });
            (index, factory)
        })
        .collect()
}

type DemoBinding = HostBinding<TabIndex, DemoView, InMemoryHost<DemoView>, DemoTabBar>;

pub struct App {
    pub config: ResolvedConfig,
    pub navigator: Navigator<TabIndex, DemoView>,
    binding: DemoBinding,
    root_reset: mpsc::UnboundedReceiver<ViewId>,
    pub status_message: String,
    pages: u32,
}

impl App {
    /// Build the navigator from `config`. No host is bound yet; call
    /// [`App::attach_host`] once observers are subscribed.
    pub fn new(config: ResolvedConfig) -> Result<Self, NavigatorError> {
        let mut navigator = Navigator::new(NavigatorSettings {
            info_capacity: config.info_capacity,
        });
        let tabs: Vec<TabIndex> = (0..config.tabs.len()).collect();
        navigator.initialize(&tabs, root_factories(&config.tabs), config.default_tab)?;
        let root_reset = navigator.subscribe_root_reset();
        let binding = HostBinding::new(&navigator);

        Ok(Self {
            config,
            navigator,
            binding,
            root_reset,
            status_message: String::from("Welcome to tabnav!"),
            pages: 0,
        })
    }

    pub fn attach_host(&mut self) -> Result<(), NavigatorError> {
        let tab_bar = DemoTabBar::new(self.config.tabs.len());
        self.binding
            .start(&mut self.navigator, InMemoryHost::new(), tab_bar)?;
        self.sync();
        Ok(())
    }

    /// Tear the host down and bring it back up, the way a platform recreates
    /// a screen. With `leftover`, the host comes back holding one view the
    /// navigator never created.
    pub fn restart_host(&mut self, leftover: bool) -> Result<(), NavigatorError> {
        let (mut host, tab_bar) = self.binding.stop().unwrap_or_else(|| {
            (
                InMemoryHost::new(),
                DemoTabBar::new(self.config.tabs.len()),
            )
        });
        if leftover {
            let stray = DemoView::new("Restored", "-", ViewKind::Stray);
            host.restore(ViewId::new(), Container::Main, stray);
        }
        info!("Restarting host (leftover view: {})", leftover);
        self.binding.start(&mut self.navigator, host, tab_bar)?;
        self.status_message = String::from("Host recreated");
        self.sync();
        Ok(())
    }

    /// Apply everything the navigator queued. Returns how many commands the
    /// host committed.
    pub fn sync(&mut self) -> usize {
        let applied = match self.binding.pump() {
            Ok(applied) => applied,
            Err(e) => {
                warn!("Host rejected a command: {}", e);
                self.status_message = format!("Host error: {e}");
                0
            }
        };
        while let Ok(id) = self.root_reset.try_recv() {
            let title = self.title_of(id);
            info!("Resetting {} in place", title);
            self.status_message = format!("Scrolled {title} back to top");
        }
        applied
    }

    fn next_title(&mut self, prefix: &str) -> String {
        self.pages += 1;
        format!("{prefix} {}", self.pages)
    }

    fn current_tab_id(&self) -> String {
        self.navigator
            .current_tab()
            .and_then(|tab| self.config.tabs.get(tab))
            .map(|spec| spec.id.clone())
            .unwrap_or_default()
    }

    /// A user tap on the tab bar.
    pub fn tap_tab(&mut self, tab: TabIndex) {
        self.binding
            .on_tab_selected(&mut self.navigator, tab, SelectionSource::User);
        self.sync();
    }

    pub fn switch_tab(&mut self, tab: TabIndex) {
        self.navigator.switch_tab(tab);
        self.sync();
    }

    pub fn push_page(&mut self, title: Option<String>) -> Option<ViewId> {
        self.push(title, ViewKind::Page, "Page")
    }

    pub fn push_modal(&mut self, title: Option<String>) -> Option<ViewId> {
        self.push(title, ViewKind::Modal, "Sheet")
    }

    pub fn push_on_top(&mut self, title: Option<String>) -> Option<ViewId> {
        self.push(title, ViewKind::Overlay, "Overlay")
    }

    fn push(&mut self, title: Option<String>, kind: ViewKind, prefix: &str) -> Option<ViewId> {
        let title = title.unwrap_or_else(|| self.next_title(prefix));
        let view = NewView::new(DemoView::new(title, self.current_tab_id(), kind));
        let view = match kind {
            ViewKind::Modal => view.modal(),
            ViewKind::Overlay => view.on_top(),
            _ => view,
        };
        let id = self.navigator.push(view);
        self.sync();
        id
    }

    /// Back button. `false` when there is nowhere to go back to.
    pub fn back(&mut self) -> bool {
        let popped = self.navigator.pop();
        if !popped {
            self.status_message = String::from("Nothing to go back to");
        }
        self.sync();
        popped
    }

    pub fn reset_tab(&mut self, tab: TabIndex, recreate_root: bool) {
        self.navigator.reset_tab(tab, recreate_root);
        self.sync();
    }

    pub fn replace_root(&mut self, tab: TabIndex, title: String) -> Option<ViewId> {
        let id = self.config.tabs.get(tab)?.id.clone();
        let id = self
            .navigator
            .add_root_view(tab, RootView::new(DemoView::new(title, id, ViewKind::Root)));
        self.sync();
        id
    }

    pub fn clear(&mut self) {
        self.navigator.clear_all();
        self.status_message = String::from("Cleared all tabs");
        self.sync();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn tab_index(&self, id: &str) -> Option<TabIndex> {
        self.config.tab_index(id)
    }

    pub fn tab_title(&self, tab: TabIndex) -> &str {
        self.config
            .tabs
            .get(tab)
            .map_or("?", |spec| spec.title.as_str())
    }

    pub fn host(&self) -> Option<&InMemoryHost<DemoView>> {
        self.binding.host()
    }

    /// What the tab bar shows as selected.
    pub fn selected_tab(&self) -> Option<TabIndex> {
        self.binding.tab_bar().and_then(DemoTabBar::selected)
    }

    /// Display title of a view, or a placeholder while its command is still
    /// queued.
    pub fn title_of(&self, id: ViewId) -> String {
        self.binding
            .reconciler()
            .content(id)
            .map_or_else(|| String::from("(pending)"), ToString::to_string)
    }

    /// Bottom-to-top entries of `tab` with their titles.
    pub fn stack_titles(&self, tab: TabIndex) -> Vec<(EntryTag, String)> {
        self.navigator
            .stack(tab)
            .iter()
            .map(|tag| (*tag, self.title_of(tag.id)))
            .collect()
    }

    /// One line per tab, current tab marked with `*`.
    pub fn summary(&self) -> String {
        (0..self.config.tabs.len())
            .map(|tab| {
                let marker = if self.navigator.current_tab() == Some(tab) {
                    "*"
                } else {
                    " "
                };
                let titles: Vec<String> = self
                    .stack_titles(tab)
                    .into_iter()
                    .map(|(_, title)| title)
                    .collect();
                format!("{marker} {}: {}", self.tab_title(tab), titles.join(" > "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
