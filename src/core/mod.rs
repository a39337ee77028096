//! # Core Navigation Logic
//!
//! Everything here is host-agnostic. It knows nothing about how views are
//! drawn; the View Host adapter lives in [`crate::host`].
//!
//! ```text
//!   caller ──intent──► Navigator ──► MultiStack (per-tab back-stacks)
//!                          │
//!                          ├──► Envelope { Command, CommitTicket } ──► WorkQueue
//!                          └──► tab selection ─────────────────────► WorkQueue
//! ```
//!
//! ## Modules
//!
//! - [`navigator`]: the `Navigator`, its intents and queries
//! - [`multistack`]: keyed stacks ordered by recency
//! - [`entry`]: view identity and the values pushed onto stacks
//! - [`command`]: Reconciliation Commands, Info Events, commit tickets
//! - [`channel`]: the single-consumer queue commands travel through
//! - [`config`]: config file loading and resolution
//! - [`error`]: setup errors

pub mod channel;
pub mod command;
pub mod config;
pub mod entry;
pub mod error;
pub mod multistack;
pub mod navigator;

pub use command::{Command, InfoEvent};
pub use entry::{NewView, RootView, ViewId};
pub use error::NavigatorError;
pub use navigator::{Navigator, NavigatorSettings, TabId};
