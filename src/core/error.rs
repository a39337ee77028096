use std::fmt;

/// Setup errors. Fatal.
///
/// Runtime navigation misses (popping an empty store, selecting a tab that
/// does not exist) are not errors. They happen routinely from double taps
/// and back-button races and are reported as `false`/`None` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorError {
    /// The default tab is not one of the configured tabs.
    UnknownDefaultTab(String),
    /// A configured tab has no root factory.
    MissingRootFactory(String),
    /// The tab bar shows a tab the navigator was not configured with, or
    /// lacks the navigator's default tab.
    TabBarMismatch(String),
}

impl fmt::Display for NavigatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigatorError::UnknownDefaultTab(tab) => {
                write!(f, "default tab {tab} is not one of the configured tabs")
            }
            NavigatorError::MissingRootFactory(tab) => {
                write!(f, "no root factory for tab {tab}")
            }
            NavigatorError::TabBarMismatch(tab) => {
                write!(f, "tab bar and navigator disagree on tab {tab}")
            }
        }
    }
}

impl std::error::Error for NavigatorError {}
