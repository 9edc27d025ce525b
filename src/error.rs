use std::fmt;
use thiserror::Error;

/// UI resolution points a device flow can fail at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UiTarget {
    SearchBox,
    TextInput,
    AppEntry,
    ActionButton,
}

impl fmt::Display for UiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UiTarget::SearchBox => "search box",
            UiTarget::TextInput => "text input",
            UiTarget::AppEntry => "app entry",
            UiTarget::ActionButton => "action button",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// Missing credentials or unusable settings.
    Configuration,
    /// Hub unreachable, timed out, or connection reset.
    Connectivity,
    /// Credentials rejected by the provider.
    Authorization,
    /// Concurrent-session ceiling reached.
    Capacity,
    /// Requested device could not be provisioned.
    DeviceUnavailable,
    ElementNotFound(UiTarget),
    /// Any other protocol failure during an interaction.
    Remote,
    /// Session release failed. Logged only.
    Teardown,
    /// The runner itself broke (panicked) instead of returning a result.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => f.write_str("configuration error"),
            ErrorKind::Connectivity => f.write_str("connectivity error"),
            ErrorKind::Authorization => f.write_str("authorization error"),
            ErrorKind::Capacity => f.write_str("capacity error"),
            ErrorKind::DeviceUnavailable => f.write_str("device unavailable"),
            ErrorKind::ElementNotFound(target) => write!(f, "{target} not found"),
            ErrorKind::Remote => f.write_str("remote error"),
            ErrorKind::Teardown => f.write_str("teardown error"),
            ErrorKind::Internal => f.write_str("internal error"),
        }
    }
}

/// Failure inside a single device run, tagged where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct FlowError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl FlowError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, detail)
    }

    pub fn connectivity(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connectivity, detail)
    }

    pub fn remote(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Remote, detail)
    }

    pub fn not_found(target: UiTarget, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ElementNotFound(target), detail)
    }

    /// Only connectivity failures are worth another session-open attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Connectivity)
    }
}
