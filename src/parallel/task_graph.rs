//! Deferred-task backend on rayon
//!
//! Builds one deferred task per non-empty slice and computes them as a single
//! batch. Work runs through the return-value protocol. The batch runs on a
//! dedicated pool for [`ExecutionStrategy::Isolated`] and on the caller's pool
//! for [`ExecutionStrategy::SharedMemory`].

use crate::config::ExecutionStrategy;
use crate::parallel::backend::{Backend, Invocation, settle};
use crate::parallel::error::BackendError;
use crate::parallel::partition::{Slice, partition};
use crate::parallel::reduce::combine;
use crate::parallel::reducers::Accumulate;
use crate::parallel::work::{Job, Output, WorkResult};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

/// Registry name of this backend
pub const NAME: &str = "task-graph";

static ENGINE: OnceLock<bool> = OnceLock::new();

/// Batch-of-deferred-tasks backend
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskGraphBackend;

/// One slice of work waiting to be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredTask {
    pub worker: usize,
    pub slice: Slice,
}

impl TaskGraphBackend {
    pub fn new() -> Self {
        Self
    }

    fn detect() -> bool {
        match ThreadPoolBuilder::new().num_threads(1).build() {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("{}: rayon pool unavailable: {}", NAME, e);
                false
            }
        }
    }

    /// One deferred task per slice, numbered in slice order
    pub fn defer(slices: &[Slice]) -> Vec<DeferredTask> {
        slices
            .iter()
            .copied()
            .enumerate()
            .map(|(worker, slice)| DeferredTask { worker, slice })
            .collect()
    }

    /// Compute every task in one batch; output order follows task order
    fn compute<V: Send>(
        job: &dyn Job<V>,
        tasks: &[DeferredTask],
        strategy: ExecutionStrategy,
        workers: usize,
    ) -> Result<Vec<Option<WorkResult<V>>>, BackendError> {
        let batch = || {
            tasks
                .par_iter()
                .map(|task| job.run(task.worker, task.slice))
                .collect::<Vec<_>>()
        };

        let outcome = match strategy {
            ExecutionStrategy::Isolated => {
                // No more threads than there are tasks to run
                let pool = ThreadPoolBuilder::new()
                    .num_threads(tasks.len().clamp(1, workers.max(1)))
                    .thread_name(|index| format!("fanfold-graph-{index}"))
                    .build()
                    .map_err(|e| BackendError::Pool {
                        message: e.to_string(),
                    })?;
                panic::catch_unwind(AssertUnwindSafe(|| pool.install(batch)))
            }
            ExecutionStrategy::SharedMemory => panic::catch_unwind(AssertUnwindSafe(batch)),
        };

        outcome.map_err(|payload| BackendError::panicked(payload.as_ref()))
    }
}

impl<V: Accumulate + Send> Backend<V> for TaskGraphBackend {
    fn probe(&self) -> bool {
        *ENGINE.get_or_init(Self::detect)
    }

    fn execute(&self, call: &Invocation<'_, V>) -> Result<Output<V>, BackendError> {
        let tasks = Self::defer(&partition(call.job.governing_len(), call.workers));
        let strategy = call.options.strategy();
        tracing::debug!(
            "{}: computing {} deferred tasks ({:?}) across {} workers",
            NAME,
            tasks.len(),
            strategy,
            call.workers
        );
        if !call.options.jit {
            tracing::trace!("{}: jit disabled, closures already run as native code", NAME);
        }

        let computed = Self::compute(call.job, &tasks, strategy, call.workers)?;
        let raw = settle(computed)?;
        Ok(combine(raw, call.reducers, call.notices)?)
    }
}
