//! Configuration for the fanfold dispatcher
//!
//! [`Options`] holds the per-call knobs recognized by the dispatcher. They can be
//! built in code or loaded through [`FanfoldConfig`], which layers the embedded
//! defaults, an optional config file and `FANFOLD_` environment variables.

use crate::parallel::error::{DispatchError, DispatchResult};
use serde::{Deserialize, Serialize};

pub mod core;
pub mod smart_load;

pub use core::FanfoldConfig;

/// Options recognized by a dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Worker count override; `None` defers to `worker_policy`
    pub cpus: Option<usize>,

    /// Accepted for compatibility; work closures are already native code
    pub jit: bool,

    /// Workers share mutable state, forcing the shared-memory strategy
    pub shared_res: bool,

    /// Run only this backend instead of scanning the registry in order
    #[serde(alias = "prefered")]
    pub preferred: Option<String>,

    /// How many workers to use when `cpus` is not set
    pub worker_policy: WorkerPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cpus: None,
            jit: true,
            shared_res: false,
            preferred: None,
            worker_policy: WorkerPolicy::AllCores,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cpus(mut self, cpus: usize) -> Self {
        self.cpus = Some(cpus);
        self
    }

    pub fn with_jit(mut self, jit: bool) -> Self {
        self.jit = jit;
        self
    }

    pub fn with_shared_res(mut self, shared_res: bool) -> Self {
        self.shared_res = shared_res;
        self
    }

    pub fn prefer(mut self, backend: impl Into<String>) -> Self {
        self.preferred = Some(backend.into());
        self
    }

    pub fn with_worker_policy(mut self, policy: WorkerPolicy) -> Self {
        self.worker_policy = policy;
        self
    }

    /// Resolve the number of workers for this call
    pub fn worker_count(&self) -> DispatchResult<usize> {
        match self.cpus {
            Some(0) => Err(DispatchError::config("cpus must be at least 1")),
            Some(cpus) => Ok(cpus),
            None => Ok(self.worker_policy.resolve(num_cpus::get())),
        }
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        if self.shared_res {
            ExecutionStrategy::SharedMemory
        } else {
            ExecutionStrategy::Isolated
        }
    }

    /// Check the options without running anything
    pub fn validate(&self) -> DispatchResult<()> {
        self.worker_count().map(|_| ())
    }
}

/// Default worker count when `cpus` is not given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerPolicy {
    /// One worker per available core
    #[default]
    AllCores,
    /// Leave one core for the calling thread
    LeaveOneFree,
}

impl WorkerPolicy {
    pub fn resolve(&self, available_cores: usize) -> usize {
        match self {
            WorkerPolicy::AllCores => available_cores.max(1),
            WorkerPolicy::LeaveOneFree => available_cores.saturating_sub(1).max(1),
        }
    }
}

impl std::fmt::Display for WorkerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerPolicy::AllCores => write!(f, "all-cores"),
            WorkerPolicy::LeaveOneFree => write!(f, "leave-one-free"),
        }
    }
}

/// How a task batch is isolated from the caller
///
/// `Isolated` runs the batch on a dedicated pool; each task only sees its own
/// argument part. `SharedMemory` runs it on the caller's pool so closures can
/// mutate state they capture. Under `SharedMemory` the work closure owns all
/// synchronization of that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Isolated,
    SharedMemory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.cpus, None);
        assert!(options.jit);
        assert!(!options.shared_res);
        assert_eq!(options.preferred, None);
        assert_eq!(options.strategy(), ExecutionStrategy::Isolated);
        assert_eq!(options.worker_count().unwrap(), num_cpus::get().max(1));
    }

    #[test]
    fn test_cpus_override() {
        let options = Options::new().with_cpus(3);
        assert_eq!(options.worker_count().unwrap(), 3);
    }

    #[test]
    fn test_zero_cpus_rejected() {
        let options = Options::new().with_cpus(0);
        assert!(matches!(
            options.worker_count(),
            Err(DispatchError::Config { .. })
        ));
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_worker_policies() {
        assert_eq!(WorkerPolicy::AllCores.resolve(8), 8);
        assert_eq!(WorkerPolicy::LeaveOneFree.resolve(8), 7);
        assert_eq!(WorkerPolicy::LeaveOneFree.resolve(1), 1);
        assert_eq!(WorkerPolicy::AllCores.resolve(0), 1);
    }

    #[test]
    fn test_worker_policy_drives_default_count() {
        let options = Options::new().with_worker_policy(WorkerPolicy::LeaveOneFree);
        assert_eq!(
            options.worker_count().unwrap(),
            num_cpus::get().saturating_sub(1).max(1)
        );

        let pinned = options.with_cpus(5);
        assert_eq!(pinned.worker_count().unwrap(), 5);
    }

    #[test]
    fn test_jit_flag_round_trips() {
        let options = Options::new().with_jit(false);
        let rendered = serde_json::to_string(&options).unwrap();
        let parsed: Options = serde_json::from_str(&rendered).unwrap();
        assert!(!parsed.jit);
    }

    #[test]
    fn test_shared_res_selects_shared_memory() {
        let options = Options::new().with_shared_res(true);
        assert_eq!(options.strategy(), ExecutionStrategy::SharedMemory);
    }

    #[test]
    fn test_misspelled_preferred_key_accepted() {
        let options: Options = serde_json::from_str(r#"{"prefered": "task-graph"}"#).unwrap();
        assert_eq!(options.preferred.as_deref(), Some("task-graph"));

        let options: Options = serde_json::from_str(r#"{"preferred": "process-pool"}"#).unwrap();
        assert_eq!(options.preferred.as_deref(), Some("process-pool"));
    }

    #[test]
    fn test_policy_serialization() {
        let options: Options =
            serde_json::from_str(r#"{"worker_policy": "leave-one-free", "cpus": 2}"#).unwrap();
        assert_eq!(options.worker_policy, WorkerPolicy::LeaveOneFree);
        assert_eq!(options.cpus, Some(2));
        assert_eq!(WorkerPolicy::LeaveOneFree.to_string(), "leave-one-free");
    }
}
