//! Backend selection and sequential fallback
//!
//! Per call the dispatcher walks its registry in order (or only the preferred
//! backend) and settles on the first outcome:
//!
//! ```text
//! TRY(i) --unavailable--> TRY(i+1) --...--> SEQUENTIAL
//! TRY(i) --backend failure--------------->  SEQUENTIAL
//! TRY(i) --value------------------------->  RETURN
//! TRY(i) --work error-------------------->  ERROR (propagated to the caller)
//! ```

use crate::config::Options;
use crate::parallel::backend::{Backend, Invocation, Registry};
use crate::parallel::error::{BackendError, DispatchError, DispatchResult};
use crate::parallel::notice::{Notice, NoticeSink, TracingSink};
use crate::parallel::reducers::{Accumulate, Reducer};
use crate::parallel::work::{BoundJob, Job, Output, Sliceable, Work};
use std::sync::Arc;

/// How a dispatch was carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Parallel { backend: String, workers: usize },
    Sequential { reason: FallbackReason },
}

/// Why a dispatch ran sequentially
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    NoBackendAvailable,
    BackendFailed { backend: String, error: String },
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Parallel { backend, workers } => {
                write!(f, "parallel via {} ({} workers)", backend, workers)
            }
            Route::Sequential {
                reason: FallbackReason::NoBackendAvailable,
            } => write!(f, "sequential (no backend available)"),
            Route::Sequential {
                reason: FallbackReason::BackendFailed { backend, .. },
            } => write!(f, "sequential (fallback after {} failed)", backend),
        }
    }
}

/// Final value of a dispatch and the route that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched<V> {
    pub output: Output<V>,
    pub route: Route,
}

impl<V> Dispatched<V> {
    pub fn is_parallel(&self) -> bool {
        matches!(self.route, Route::Parallel { .. })
    }

    pub fn into_output(self) -> Output<V> {
        self.output
    }
}

/// Orchestrates backends for map-reduce calls
pub struct Dispatcher<V> {
    registry: Registry<V>,
    notices: Arc<dyn NoticeSink>,
}

impl<V: Accumulate + Send + 'static> Default for Dispatcher<V> {
    fn default() -> Self {
        Self::new(Registry::standard())
    }
}

impl<V: Accumulate + Send> Dispatcher<V> {
    pub fn new(registry: Registry<V>) -> Self {
        Self {
            registry,
            notices: Arc::new(TracingSink),
        }
    }

    /// Send notices somewhere other than the log
    pub fn with_notices(mut self, notices: Arc<dyn NoticeSink>) -> Self {
        self.notices = notices;
        self
    }

    pub fn registry(&self) -> &Registry<V> {
        &self.registry
    }

    /// Every registered backend with its probe result
    pub fn availability(&self) -> Vec<(String, bool)> {
        self.registry
            .iter()
            .map(|(name, backend)| (name.to_string(), backend.probe()))
            .collect()
    }

    /// Run `work` over `args` in parallel and reduce the per-worker results
    ///
    /// Falls back to one direct call on the unsliced arguments when no backend
    /// is usable or the chosen backend fails. Errors produced by the work itself
    /// are returned as [`DispatchError::Worker`] whichever path ran them.
    pub fn execute<A: Sliceable>(
        &self,
        work: &Work<A::Part, V>,
        reducers: &[Reducer<V>],
        args: &A,
        options: &Options,
    ) -> DispatchResult<Dispatched<V>> {
        let workers = options.worker_count()?;
        let candidates = self.candidates(options)?;

        let job = BoundJob::new(work, args);
        let call = Invocation {
            job: &job,
            reducers,
            options,
            notices: self.notices.as_ref(),
            workers,
        };

        for (name, backend) in candidates {
            if !backend.probe() {
                self.notices.notify(Notice::BackendUnavailable {
                    backend: name.to_string(),
                });
                continue;
            }

            tracing::debug!(
                "Dispatching {} items to '{}' with {} workers",
                job.governing_len(),
                name,
                workers
            );

            return match backend.execute(&call) {
                Ok(output) => Ok(Dispatched {
                    output,
                    route: Route::Parallel {
                        backend: name.to_string(),
                        workers,
                    },
                }),
                Err(BackendError::Worker { worker, source }) => {
                    Err(DispatchError::Worker { worker, source })
                }
                Err(error) => {
                    self.notices.notify(Notice::BackendFailed {
                        backend: name.to_string(),
                        error: error.to_string(),
                    });
                    self.sequential(
                        &job,
                        FallbackReason::BackendFailed {
                            backend: name.to_string(),
                            error: error.to_string(),
                        },
                    )
                }
            };
        }

        self.notices.notify(Notice::NoBackendAvailable);
        self.sequential(&job, FallbackReason::NoBackendAvailable)
    }

    /// Backends to try, in order
    fn candidates(&self, options: &Options) -> DispatchResult<Vec<(&str, &Arc<dyn Backend<V>>)>> {
        match options.preferred.as_deref() {
            Some(name) => match self.registry.iter().find(|(entry, _)| *entry == name) {
                Some(entry) => Ok(vec![entry]),
                None => Err(DispatchError::UnknownBackend {
                    name: name.to_string(),
                    known: self.registry.names(),
                }),
            },
            None => Ok(self.registry.iter().collect()),
        }
    }

    /// Single direct call on the full arguments; the raw output is returned as is
    fn sequential(&self, job: &dyn Job<V>, reason: FallbackReason) -> DispatchResult<Dispatched<V>> {
        tracing::debug!("Executing sequentially over {} items", job.governing_len());
        match job.run_whole() {
            Some(Ok(output)) => Ok(Dispatched {
                output,
                route: Route::Sequential { reason },
            }),
            Some(Err(source)) => Err(DispatchError::Worker { worker: 0, source }),
            None => Err(DispatchError::NoResult),
        }
    }
}

/// Convenience function: dispatch with the standard registry and logged notices
pub fn execute<A, V>(
    work: &Work<A::Part, V>,
    reducers: &[Reducer<V>],
    args: &A,
    options: &Options,
) -> DispatchResult<Output<V>>
where
    A: Sliceable,
    V: Accumulate + Send + 'static,
{
    Dispatcher::default()
        .execute(work, reducers, args, options)
        .map(Dispatched::into_output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::notice::RecordingSink;
    use crate::parallel::reducers::sum;

    struct Unavailable;

    impl Backend<i64> for Unavailable {
        fn probe(&self) -> bool {
            false
        }

        fn execute(&self, _call: &Invocation<'_, i64>) -> Result<Output<i64>, BackendError> {
            unreachable!("probe reported unavailable")
        }
    }

    struct Broken;

    impl Backend<i64> for Broken {
        fn probe(&self) -> bool {
            true
        }

        fn execute(&self, _call: &Invocation<'_, i64>) -> Result<Output<i64>, BackendError> {
            Err(BackendError::Pool {
                message: "no threads left".to_string(),
            })
        }
    }

    fn summing() -> Work<Vec<i64>, i64> {
        Work::returning(|part: Vec<i64>| Ok(Output::Scalar(part.iter().sum())))
    }

    fn recorded(registry: Registry<i64>) -> (Dispatcher<i64>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = Dispatcher::new(registry).with_notices(sink.clone());
        (dispatcher, sink)
    }

    #[test]
    fn test_first_available_backend_wins() {
        let (dispatcher, sink) = recorded(Registry::standard());
        let data: Vec<i64> = (1..=10).collect();

        let result = dispatcher
            .execute(&summing(), &[sum()], &data, &Options::new().with_cpus(3))
            .unwrap();
        assert_eq!(result.output, Output::Scalar(55));
        assert_eq!(
            result.route,
            Route::Parallel {
                backend: "process-pool".to_string(),
                workers: 3
            }
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unavailable_backend_is_skipped() {
        let registry = Registry::empty()
            .with("never", Unavailable)
            .with("task-graph", crate::parallel::TaskGraphBackend::new());
        let (dispatcher, sink) = recorded(registry);
        let data: Vec<i64> = (1..=10).collect();

        let result = dispatcher
            .execute(&summing(), &[sum()], &data, &Options::new().with_cpus(2))
            .unwrap();
        assert_eq!(result.output, Output::Scalar(55));
        assert!(result.is_parallel());
        assert_eq!(
            sink.notices(),
            vec![Notice::BackendUnavailable {
                backend: "never".to_string()
            }]
        );
    }

    #[test]
    fn test_no_backend_runs_sequentially() {
        let (dispatcher, sink) = recorded(Registry::empty().with("never", Unavailable));
        let data: Vec<i64> = (1..=10).collect();

        let result = dispatcher
            .execute(&summing(), &[sum()], &data, &Options::new())
            .unwrap();
        assert_eq!(result.output, Output::Scalar(55));
        assert_eq!(
            result.route,
            Route::Sequential {
                reason: FallbackReason::NoBackendAvailable
            }
        );
        assert!(sink.contains(|n| *n == Notice::NoBackendAvailable));
    }

    #[test]
    fn test_backend_failure_stops_the_scan() {
        let registry = Registry::empty()
            .with("broken", Broken)
            .with("process-pool", crate::parallel::ProcessPoolBackend::new());
        let (dispatcher, sink) = recorded(registry);
        let data: Vec<i64> = (1..=4).collect();

        let result = dispatcher
            .execute(&summing(), &[sum()], &data, &Options::new())
            .unwrap();
        assert_eq!(result.output, Output::Scalar(10));
        assert!(matches!(
            result.route,
            Route::Sequential {
                reason: FallbackReason::BackendFailed { ref backend, .. }
            } if backend == "broken"
        ));
        assert!(sink.contains(|n| matches!(n, Notice::BackendFailed { error, .. } if error.contains("no threads left"))));
    }

    #[test]
    fn test_panicking_reducer_falls_back_on_every_backend() {
        let data: Vec<i64> = (1..=8).collect();
        let exploding = Reducer::new(|_: Vec<i64>| panic!("reducer blew up"));

        for backend in ["process-pool", "task-graph"] {
            let (dispatcher, sink) = recorded(Registry::standard());
            let options = Options::new().with_cpus(2).prefer(backend);

            let result = dispatcher
                .execute(&summing(), std::slice::from_ref(&exploding), &data, &options)
                .unwrap();
            assert_eq!(result.output, Output::Scalar(36));
            assert!(!result.is_parallel());
            assert!(sink.contains(|n| matches!(
                n,
                Notice::BackendFailed { error, .. } if error.contains("reducer blew up")
            )));
        }
    }

    #[test]
    fn test_unknown_preferred_backend_fails_fast() {
        let (dispatcher, _sink) = recorded(Registry::standard());
        let data: Vec<i64> = vec![1, 2];

        let err = dispatcher
            .execute(&summing(), &[sum()], &data, &Options::new().prefer("mpi"))
            .unwrap_err();
        match err {
            DispatchError::UnknownBackend { name, known } => {
                assert_eq!(name, "mpi");
                assert_eq!(known, vec!["process-pool", "task-graph"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_preferred_backend_bypasses_order() {
        let (dispatcher, _sink) = recorded(Registry::standard());
        let data: Vec<i64> = (0..100).collect();

        let result = dispatcher
            .execute(
                &summing(),
                &[sum()],
                &data,
                &Options::new().with_cpus(4).prefer("task-graph"),
            )
            .unwrap();
        assert_eq!(result.output, Output::Scalar(4950));
        assert!(matches!(result.route, Route::Parallel { ref backend, .. } if backend == "task-graph"));
    }

    #[test]
    fn test_preferred_but_unavailable_falls_back() {
        let registry = Registry::standard().with("never", Unavailable);
        let (dispatcher, sink) = recorded(registry);
        let data: Vec<i64> = vec![3, 4];

        let result = dispatcher
            .execute(&summing(), &[sum()], &data, &Options::new().prefer("never"))
            .unwrap();
        assert_eq!(result.output, Output::Scalar(7));
        assert!(!result.is_parallel());
        assert_eq!(sink.notices().len(), 2);
    }

    #[test]
    fn test_zero_cpus_is_config_error() {
        let (dispatcher, _sink) = recorded(Registry::standard());
        let data: Vec<i64> = vec![1];
        let err = dispatcher
            .execute(&summing(), &[sum()], &data, &Options::new().with_cpus(0))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Config { .. }));
    }

    #[test]
    fn test_availability_listing() {
        let registry = Registry::standard().with("never", Unavailable);
        let dispatcher = Dispatcher::new(registry);
        assert_eq!(
            dispatcher.availability(),
            vec![
                ("process-pool".to_string(), true),
                ("task-graph".to_string(), true),
                ("never".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_route_display() {
        let parallel = Route::Parallel {
            backend: "task-graph".to_string(),
            workers: 8,
        };
        assert_eq!(parallel.to_string(), "parallel via task-graph (8 workers)");

        let fallback = Route::Sequential {
            reason: FallbackReason::NoBackendAvailable,
        };
        assert!(fallback.to_string().starts_with("sequential"));
    }
}
