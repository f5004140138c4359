//! Command-line interface for fanfold

pub mod commands;
pub mod output;
pub mod workloads;

pub use commands::Cli;
pub use output::Output;
