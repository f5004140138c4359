//! Error types for dispatching
//!
//! Three layers, matching how far each failure is allowed to travel:
//! [`ReduceError`] and [`BackendError`] stay inside the dispatcher (apart from
//! worker errors, they end in a sequential retry), while [`DispatchError`] is
//! what callers see.

use thiserror::Error;

/// Failure while combining per-worker results
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    #[error("no worker results to reduce")]
    NoResults,

    #[error("worker {worker} produced no value")]
    NotComputed { worker: usize },

    #[error("worker {worker} mixed scalar and tuple results")]
    MixedShapes { worker: usize },

    #[error("reducer for field {field} panicked: {message}")]
    ReducerPanicked { field: usize, message: String },

    #[error("worker {worker} returned {found} result fields, expected {expected}")]
    ShapeMismatch {
        worker: usize,
        expected: usize,
        found: usize,
    },
}

/// Failure of a backend while running a batch
#[derive(Error, Debug)]
pub enum BackendError {
    /// The work function itself failed on one worker
    #[error("worker {worker} failed: {source}")]
    Worker {
        worker: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to start worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build thread pool: {message}")]
    Pool { message: String },

    #[error("a worker panicked: {message}")]
    Panicked { message: String },

    #[error("worker {worker} exited without reporting a result")]
    MissingResult { worker: usize },

    #[error("reduction failed: {0}")]
    Reduce(#[from] ReduceError),
}

impl BackendError {
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        Self::Panicked {
            message: panic_message(payload),
        }
    }

    /// Whether the failure came from the caller's work rather than the backend
    pub fn is_worker_error(&self) -> bool {
        matches!(self, Self::Worker { .. })
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Error returned to the caller of a dispatch
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The work function failed; `source` is the error it produced, unchanged
    #[error("work failed on worker {worker}: {source}")]
    Worker {
        worker: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("unknown backend '{name}' (registered: {})", .known.join(", "))]
    UnknownBackend { name: String, known: Vec<String> },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// The sequential fallback itself could not produce a value
    #[error("sequential execution did not produce a result")]
    NoResult,
}

impl DispatchError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Take back the error produced by the work function, if that is what failed
    pub fn into_worker_error(self) -> Option<anyhow::Error> {
        match self {
            Self::Worker { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn worker_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Worker { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for dispatch operations
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_worker_error_keeps_source() {
        let err = DispatchError::Worker {
            worker: 2,
            source: anyhow::anyhow!("segment too short"),
        };
        assert!(err.to_string().contains("worker 2"));
        assert!(err.source().is_some());
        assert_eq!(
            err.into_worker_error().map(|e| e.to_string()),
            Some("segment too short".to_string())
        );
    }

    #[test]
    fn test_unknown_backend_lists_known() {
        let err = DispatchError::UnknownBackend {
            name: "mpi".to_string(),
            known: vec!["process-pool".to_string(), "task-graph".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("'mpi'"));
        assert!(message.contains("process-pool, task-graph"));
    }

    #[test]
    fn test_panic_payloads() {
        let static_str: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(
            BackendError::panicked(static_str.as_ref()).to_string(),
            "a worker panicked: boom"
        );

        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert!(BackendError::panicked(owned.as_ref()).to_string().contains("bang"));
    }

    #[test]
    fn test_reduce_error_converts() {
        let err: BackendError = ReduceError::NotComputed { worker: 1 }.into();
        assert!(!err.is_worker_error());
        assert!(err.to_string().contains("worker 1 produced no value"));
    }
}
