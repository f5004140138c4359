use crate::config::{FanfoldConfig, Options};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;

pub mod backends;
pub mod config;
pub mod run;

#[derive(Parser)]
#[command(
    name = "fanfold",
    version = env!("CARGO_PKG_VERSION"),
    about = "Parallel map-reduce dispatcher with sequential fallback",
    long_about = "fanfold splits a workload across CPU cores on the first usable backend, \
                  reduces the per-worker results and falls back to a single sequential \
                  call when no backend can run it."
)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Number of workers (overrides configuration)
    #[arg(long, global = true)]
    pub cpus: Option<usize>,

    /// Run only this backend
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Let workers share captured state
    #[arg(long, global = true)]
    pub shared: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a built-in workload through the dispatcher
    Run(run::RunArgs),
    /// List registered backends and whether they can be used
    Backends(backends::BackendsArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        // Set up logging based on verbosity
        setup_logging(self.verbose, self.quiet);

        let options = self.options()?;
        tracing::debug!("Resolved options: {:?}", options);

        match self.command {
            Commands::Run(args) => run::execute(args, &options, self.verbose, self.quiet),
            Commands::Backends(args) => backends::execute(args, self.quiet),
            Commands::Config(args) => config::execute(args, &options, self.quiet),
        }
    }

    /// Merged configuration with command-line overrides applied on top
    fn options(&self) -> Result<Options> {
        let config = FanfoldConfig::load_with_custom_config(self.config.as_deref().map(Path::new))?;
        let mut options = config.options()?;

        if let Some(cpus) = self.cpus {
            options.cpus = Some(cpus);
        }
        if let Some(backend) = &self.backend {
            options.preferred = Some(backend.clone());
        }
        if self.shared {
            options.shared_res = true;
        }

        options.validate()?;
        Ok(options)
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
