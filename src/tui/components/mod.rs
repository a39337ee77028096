//! # TUI Components
//!
//! Every component here is props-based: it receives all data as struct
//! fields, built fresh each frame from [`App`](crate::app::App), and renders
//! via the [`Component`](crate::tui::component::Component) trait. The one
//! exception is `EventLog`, which keeps its own line buffer.
//!
//! ```text
//! components/
//! ├── mod.rs          (this file)
//! ├── title_bar.rs    (top status line)
//! ├── tab_strip.rs    (tab bar)
//! ├── view_stack.rs   (current tab's back-stack)
//! └── event_log.rs    (recent info events)
//! ```

pub mod event_log;
pub mod tab_strip;
pub mod title_bar;
pub mod view_stack;

pub use event_log::EventLog;
pub use tab_strip::TabStrip;
pub use title_bar::TitleBar;
pub use view_stack::{StackRow, ViewStack};
