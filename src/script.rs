//! # Headless Runner
//!
//! Drives an [`App`] from a list of steps given on the command line and
//! prints every info event as the host commits it.
//!
//! | Step            | Intent                                   |
//! |-----------------|------------------------------------------|
//! | `select:ID`     | user taps tab `ID`                       |
//! | `switch:ID`     | programmatic switch to tab `ID`          |
//! | `push:TITLE`    | push a page on the current tab           |
//! | `modal:TITLE`   | push a modal                             |
//! | `top:TITLE`     | push on top without hiding               |
//! | `pop`           | back button                              |
//! | `reset:ID`      | pop tab `ID` back to its root            |
//! | `root:ID:TITLE` | replace tab `ID`'s stack with a new root |
//! | `clear`         | clear every tab                          |
//! | `restart`       | recreate the host with a leftover view   |
//!
//! Events are printed by an observer task subscribed before the host is
//! bound, so the initial root shows up too.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::app::{App, TabIndex};
use crate::core::command::InfoEvent;
use crate::core::error::NavigatorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Select(String),
    Switch(String),
    Push(String),
    Modal(String),
    OnTop(String),
    Pop,
    Reset(String),
    Root { tab: String, title: String },
    Clear,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The step keyword is not one of the known ones.
    UnknownStep(String),
    /// The step needs an argument that was not given.
    MissingArgument(String),
    UnknownTab(String),
    Setup(NavigatorError),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnknownStep(step) => write!(f, "unknown step {step:?}"),
            ScriptError::MissingArgument(step) => write!(f, "step {step:?} needs an argument"),
            ScriptError::UnknownTab(tab) => write!(f, "no tab with id {tab:?}"),
            ScriptError::Setup(e) => write!(f, "setup failed: {e}"),
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<NavigatorError> for ScriptError {
    fn from(e: NavigatorError) -> Self {
        ScriptError::Setup(e)
    }
}

impl FromStr for Step {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (keyword, arg) = match s.split_once(':') {
            Some((keyword, arg)) => (keyword, Some(arg)),
            None => (s, None),
        };
        let required = || {
            arg.filter(|a| !a.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ScriptError::MissingArgument(s.to_string()))
        };

        match keyword {
            "select" => Ok(Step::Select(required()?)),
            "switch" => Ok(Step::Switch(required()?)),
            "push" => Ok(Step::Push(required()?)),
            "modal" => Ok(Step::Modal(required()?)),
            "top" => Ok(Step::OnTop(required()?)),
            "pop" => Ok(Step::Pop),
            "reset" => Ok(Step::Reset(required()?)),
            "root" => {
                let (tab, title) = required()?
                    .split_once(':')
                    .map(|(tab, title)| (tab.to_string(), title.to_string()))
                    .filter(|(_, title)| !title.is_empty())
                    .ok_or_else(|| ScriptError::MissingArgument(s.to_string()))?;
                Ok(Step::Root { tab, title })
            }
            "clear" => Ok(Step::Clear),
            "restart" => Ok(Step::Restart),
            _ => Err(ScriptError::UnknownStep(s.to_string())),
        }
    }
}

fn tab(app: &App, id: &str) -> Result<TabIndex, ScriptError> {
    app.tab_index(id)
        .ok_or_else(|| ScriptError::UnknownTab(id.to_string()))
}

/// Apply one step to `app`.
pub fn apply(app: &mut App, step: &Step) -> Result<(), ScriptError> {
    debug!("Step: {:?}", step);
    match step {
        Step::Select(id) => {
            let index = tab(app, id)?;
            app.tap_tab(index);
        }
        Step::Switch(id) => {
            let index = tab(app, id)?;
            app.switch_tab(index);
        }
        Step::Push(title) => {
            app.push_page(Some(title.clone()));
        }
        Step::Modal(title) => {
            app.push_modal(Some(title.clone()));
        }
        Step::OnTop(title) => {
            app.push_on_top(Some(title.clone()));
        }
        Step::Pop => {
            app.back();
        }
        Step::Reset(id) => {
            let index = tab(app, id)?;
            app.reset_tab(index, false);
        }
        Step::Root { tab: id, title } => {
            let index = tab(app, id)?;
            app.replace_root(index, title.clone());
        }
        Step::Clear => app.clear(),
        Step::Restart => app.restart_host(true)?,
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct Record<'a> {
    at: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a InfoEvent<String>,
}

/// Render one event for output. Tab indices are replaced by tab ids.
pub fn format_event(event: &InfoEvent<String>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let record = Record {
                at: Utc::now(),
                event,
            };
            serde_json::to_string(&record).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
        }
        OutputFormat::Text => match event {
            InfoEvent::TabSwitched { from: Some(from), to } => {
                format!("tab switched   {from} -> {to}")
            }
            InfoEvent::TabSwitched { from: None, to } => format!("tab switched   -> {to}"),
            InfoEvent::ViewAdded { entry } => {
                let mut flags = Vec::new();
                if entry.modal {
                    flags.push("modal");
                }
                if !entry.detachable {
                    flags.push("retained");
                }
                if flags.is_empty() {
                    format!("view added     {}", entry.id)
                } else {
                    format!("view added     {} ({})", entry.id, flags.join(", "))
                }
            }
            InfoEvent::ViewRemoved {
                removed,
                next_shown: Some(next),
            } => format!("view removed   {removed} -> {next}"),
            InfoEvent::ViewRemoved {
                removed,
                next_shown: None,
            } => format!("view removed   {removed}"),
        },
    }
}

/// Spawn a task printing every info event until the navigator is dropped.
fn spawn_observer(
    mut events: broadcast::Receiver<InfoEvent<TabIndex>>,
    tab_ids: Vec<String>,
    format: OutputFormat,
) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        let mut printed = 0usize;
        loop {
            match events.recv().await {
                Ok(event) => {
                    let event = event.map_tab(|tab| {
                        tab_ids.get(tab).cloned().unwrap_or_else(|| tab.to_string())
                    });
                    println!("{}", format_event(&event, format));
                    printed += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Observer lagged, {} info events skipped", skipped);
                    println!("... {skipped} events skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        printed
    })
}

/// Run `steps` against `app` and print the final stacks.
pub async fn run(mut app: App, steps: Vec<Step>, format: OutputFormat) -> Result<(), ScriptError> {
    let tab_ids = app.config.tabs.iter().map(|t| t.id.clone()).collect();
    let observer = spawn_observer(app.navigator.subscribe_info(), tab_ids, format);

    app.attach_host()?;
    let mut result = Ok(());
    for step in &steps {
        if let Err(e) = apply(&mut app, step) {
            result = Err(e);
            break;
        }
    }
    let summary = app.summary();
    // Dropping the navigator closes the info stream and ends the observer
    drop(app);

    match observer.await {
        Ok(printed) => info!("Headless run finished, {} info events", printed),
        Err(e) => warn!("Observer task failed: {}", e),
    }
    if format == OutputFormat::Text {
        println!("{summary}");
    }
    result
}
