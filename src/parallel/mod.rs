//! Parallel map-reduce execution
//!
//! This module splits a workload into contiguous slices, runs a work function on
//! each slice through one of several interchangeable backends, and combines the
//! per-worker results with reducers.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Partitioning**: Cuts the governing argument into one slice per worker
//! - **Backend Selection**: Probes registered backends in order and uses the first usable one
//! - **Fallback**: Runs the work once on the full input when no backend can be used
//! - **Reduction**: Transposes per-worker outputs and applies one reducer per field
//!
//! ## What This Module Does NOT Do:
//! - **Domain Logic**: Work functions and reducers are supplied by the caller
//! - **Load Balancing**: Slices are fixed-size and never rebalanced
//! - **Retries**: A failed backend is not retried
//!
//! # Flow
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │  partition   │───▶│   backend    │───▶│    settle    │───▶│   combine    │
//! │              │    │              │    │              │    │              │
//! │ • slices     │    │ • workers    │    │ • in order   │    │ • transpose  │
//! │ • per worker │    │ • protocols  │    │ • errors     │    │ • reducers   │
//! └──────────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use fanfold::config::Options;
//! use fanfold::parallel::{Output, Work, execute, reducers};
//!
//! let work: Work<Vec<i64>, i64> = Work::returning(|part: Vec<i64>| {
//!     Ok(Output::pair(part.iter().sum(), part.iter().product()))
//! });
//! let data: Vec<i64> = (1..=6).collect();
//!
//! let out = execute(
//!     &work,
//!     &[reducers::sum(), reducers::product()],
//!     &data,
//!     &Options::new().with_cpus(2),
//! )
//! .unwrap();
//! assert_eq!(out, Output::Fields(vec![21, 720]));
//! ```

pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod notice;
pub mod partition;
pub mod process_pool;
pub mod reduce;
pub mod reducers;
pub mod task_graph;
pub mod work;

// Re-export main types for easier access
pub use backend::{Backend, Invocation, Registry};
pub use dispatcher::{Dispatched, Dispatcher, FallbackReason, Route, execute};
pub use error::{BackendError, DispatchError, DispatchResult, ReduceError};
pub use notice::{Notice, NoticeSink, RecordingSink, TracingSink};
pub use partition::{Slice, partition};
pub use process_pool::ProcessPoolBackend;
pub use reducers::{Accumulate, Reducer};
pub use task_graph::TaskGraphBackend;
pub use work::{Job, Output, Protocol, Reporter, Sliceable, Work, WorkResult};
