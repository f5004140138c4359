//! # Fanfold - Parallel map-reduce with backend fallback
//!
//! Fanfold runs a slice-wise work function across CPU cores and folds the
//! per-worker results back into one value. Two backends are built in:
//!
//! - **process-pool**: one dedicated worker thread per slice, results returned over channels
//! - **task-graph**: deferred per-slice tasks computed on a rayon pool
//!
//! When neither can be used, or the chosen one fails, the work runs once on the
//! full input and a notice is emitted.
//!
//! ## Quick Start
//!
//! ```rust
//! use fanfold::{Options, Output, Work, execute, reducers};
//!
//! let work: Work<Vec<i32>, i32> =
//!     Work::returning(|part: Vec<i32>| Ok(Output::Scalar(part.iter().sum())));
//! let data: Vec<i32> = (-10..=10).collect();
//!
//! let total = execute(&work, &[reducers::sum()], &data, &Options::new()).unwrap();
//! assert_eq!(total, Output::Scalar(0));
//! ```

pub mod cli;
pub mod config;
pub mod parallel;

pub use cli::Cli;
pub use config::{ExecutionStrategy, FanfoldConfig, Options, WorkerPolicy};
pub use parallel::{
    Dispatched, DispatchError, Dispatcher, Output, Reducer, Registry, Reporter, Route, Work,
    execute, reducers,
};

/// Result type alias for fanfold operations outside the dispatch path
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
