//! Worker-per-slice backend with one result channel per worker
//!
//! Every non-empty slice gets its own named OS thread and a bounded channel. A
//! listener thread per worker blocks on that channel and files the value into a
//! pre-sized slot at the worker's index, so collection order never depends on
//! completion order and a slow worker does not hold up its finished peers.
//! All workers are started before anything is joined.

use crate::parallel::backend::{Backend, Invocation, settle};
use crate::parallel::error::BackendError;
use crate::parallel::partition::{Slice, partition};
use crate::parallel::reduce::combine;
use crate::parallel::reducers::Accumulate;
use crate::parallel::work::{Job, Output, Reporter, WorkResult};
use crossbeam::channel::{Receiver, bounded};
use std::sync::{Mutex, OnceLock};

/// Registry name of this backend
pub const NAME: &str = "process-pool";

static AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Channel-per-worker backend on scoped threads
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessPoolBackend;

/// Per-worker result slots, filled by the listeners
type Slots<V> = Mutex<Vec<Option<WorkResult<V>>>>;

impl ProcessPoolBackend {
    pub fn new() -> Self {
        Self
    }

    fn detect() -> bool {
        match std::thread::available_parallelism() {
            Ok(threads) => {
                tracing::debug!("{}: {} hardware threads available", NAME, threads);
                true
            }
            Err(e) => {
                tracing::debug!("{}: cannot query hardware threads: {}", NAME, e);
                false
            }
        }
    }

    /// Run every slice on its own thread and gather results in slice order
    fn gather<V: Send>(
        job: &dyn Job<V>,
        slices: &[Slice],
    ) -> Result<Vec<Option<WorkResult<V>>>, BackendError> {
        let slots: Slots<V> = Mutex::new((0..slices.len()).map(|_| None).collect());

        // Use crossbeam::thread::scope for safe borrowing of the job
        crossbeam::thread::scope(|s| -> Result<(), BackendError> {
            let slots = &slots;
            let mut workers = Vec::with_capacity(slices.len());
            let mut channels: Vec<Receiver<WorkResult<V>>> = Vec::with_capacity(slices.len());

            // Spawn worker threads, one channel each, in slice order
            for (worker, slice) in slices.iter().copied().enumerate() {
                let (result_tx, result_rx) = bounded(1);
                let reporter = Reporter::new(worker, result_tx);

                let handle = s
                    .builder()
                    .name(format!("fanfold-worker-{worker}"))
                    .spawn(move |_| {
                        tracing::trace!("worker-{} running slice {}", worker, slice);
                        job.report(slice, reporter);
                    })
                    .map_err(|source| BackendError::Spawn { worker, source })?;

                workers.push(handle);
                channels.push(result_rx);
            }

            // Listeners: file each result at its worker's index
            let mut listeners = Vec::with_capacity(channels.len());
            for (worker, result_rx) in channels.into_iter().enumerate() {
                let handle = s
                    .builder()
                    .name(format!("fanfold-listener-{worker}"))
                    .spawn(move |_| {
                        let received = result_rx.recv().ok();
                        if let Ok(mut slots) = slots.lock() {
                            slots[worker] = received;
                        }
                    })
                    .map_err(|source| BackendError::Spawn { worker, source })?;

                listeners.push(handle);
            }

            for handle in workers.into_iter().chain(listeners) {
                handle
                    .join()
                    .map_err(|payload| BackendError::panicked(payload.as_ref()))?;
            }

            Ok(())
        })
        .map_err(|payload| BackendError::panicked(payload.as_ref()))??;

        slots.into_inner().map_err(|_| BackendError::Panicked {
            message: "result slots were poisoned".to_string(),
        })
    }
}

impl<V: Accumulate + Send> Backend<V> for ProcessPoolBackend {
    fn probe(&self) -> bool {
        *AVAILABLE.get_or_init(Self::detect)
    }

    fn execute(&self, call: &Invocation<'_, V>) -> Result<Output<V>, BackendError> {
        let slices = partition(call.job.governing_len(), call.workers);
        tracing::debug!(
            "{}: dispatching {} slices ({:?} protocol) across {} workers",
            NAME,
            slices.len(),
            call.job.protocol(),
            call.workers
        );

        let gathered = Self::gather(call.job, &slices)?;
        let raw = settle(gathered)?;
        Ok(combine(raw, call.reducers, call.notices)?)
    }
}
