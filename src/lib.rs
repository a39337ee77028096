//! tabnav library exports for testing

pub mod app;
pub mod core;
pub mod host;
pub mod script;
pub mod tui;

#[cfg(test)]
pub mod test_support;
