//! Advisory notices
//!
//! Non-fatal conditions (a missing backend, a reducer shortfall, a downgrade to
//! sequential execution) are surfaced through a [`NoticeSink`] instead of the
//! return value. The default sink logs them with `tracing`; [`RecordingSink`]
//! keeps them so callers and tests can assert on what happened.

use std::sync::Mutex;

/// A non-fatal condition observed during one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Backend probe failed, moving on to the next one
    BackendUnavailable { backend: String },
    /// Backend failed mid-run, the call is being retried sequentially
    BackendFailed { backend: String, error: String },
    /// Every candidate backend was unavailable
    NoBackendAvailable,
    /// No reducer was supplied for this field, the default sum was used
    ReducerShortfall { field: usize },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::BackendUnavailable { backend } => {
                write!(f, "Backend '{}' is not available, trying the next one", backend)
            }
            Notice::BackendFailed { backend, error } => write!(
                f,
                "Backend '{}' failed ({}), executing sequentially...",
                backend, error
            ),
            Notice::NoBackendAvailable => write!(
                f,
                "Did not find any usable parallel backend, executing sequentially..."
            ),
            Notice::ReducerShortfall { field } => write!(
                f,
                "No reducer supplied for result field {}, using the default sum",
                field
            ),
        }
    }
}

/// Receiver of advisory notices
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs every notice as a warning
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn notify(&self, notice: Notice) {
        tracing::warn!("{}", notice);
    }
}

/// Keeps notices in memory and forwards them to the log
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.notices().is_empty()
    }

    pub fn contains(&self, predicate: impl Fn(&Notice) -> bool) -> bool {
        self.notices().iter().any(predicate)
    }

    pub fn clear(&self) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.clear();
        }
    }
}

impl NoticeSink for RecordingSink {
    fn notify(&self, notice: Notice) {
        tracing::warn!("{}", notice);
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
