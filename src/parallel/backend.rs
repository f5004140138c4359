//! Backend abstraction and the ordered backend registry

use crate::config::Options;
use crate::parallel::error::BackendError;
use crate::parallel::notice::NoticeSink;
use crate::parallel::reducers::Reducer;
use crate::parallel::process_pool::{self, ProcessPoolBackend};
use crate::parallel::reducers::Accumulate;
use crate::parallel::task_graph::{self, TaskGraphBackend};
use crate::parallel::work::{Job, Output, WorkResult};
use std::sync::Arc;

/// Everything a backend needs for one call
pub struct Invocation<'a, V> {
    pub job: &'a dyn Job<V>,
    pub reducers: &'a [Reducer<V>],
    pub options: &'a Options,
    pub notices: &'a dyn NoticeSink,
    /// Resolved worker count
    pub workers: usize,
}

/// An interchangeable execution engine
///
/// `probe` answers whether the engine can run in this process at all. It is
/// checked before every `execute` but is expected to cache its answer.
pub trait Backend<V>: Send + Sync {
    fn probe(&self) -> bool;

    /// Partition, run, gather and reduce
    fn execute(&self, call: &Invocation<'_, V>) -> Result<Output<V>, BackendError>;
}

/// Ordered, immutable-after-construction list of named backends
pub struct Registry<V> {
    entries: Vec<(String, Arc<dyn Backend<V>>)>,
}

impl<V> Registry<V> {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a backend after the ones already registered
    pub fn with(mut self, name: impl Into<String>, backend: impl Backend<V> + 'static) -> Self {
        self.entries.push((name.into(), Arc::new(backend)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Backend<V>>> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, backend)| backend)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Backend<V>>)> {
        self.entries
            .iter()
            .map(|(name, backend)| (name.as_str(), backend))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Accumulate + Send + 'static> Registry<V> {
    /// `process-pool` first, `task-graph` second
    pub fn standard() -> Self {
        Self::empty()
            .with(process_pool::NAME, ProcessPoolBackend::new())
            .with(task_graph::NAME, TaskGraphBackend::new())
    }
}

impl<V: Accumulate + Send + 'static> Default for Registry<V> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<V> Clone for Registry<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V> std::fmt::Debug for Registry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Turn gathered per-worker slots into raw outputs
///
/// Application errors win over missing results so the caller sees the error the
/// work produced.
pub(crate) fn settle<V>(gathered: Vec<Option<WorkResult<V>>>) -> Result<Vec<Output<V>>, BackendError> {
    let mut raw = Vec::with_capacity(gathered.len());
    let mut missing = None;

    for (worker, slot) in gathered.into_iter().enumerate() {
        match slot {
            Some(Ok(output)) => raw.push(output),
            Some(Err(source)) => return Err(BackendError::Worker { worker, source }),
            None => {
                missing.get_or_insert(worker);
            }
        }
    }

    match missing {
        Some(worker) => Err(BackendError::MissingResult { worker }),
        None => Ok(raw),
    }
}
