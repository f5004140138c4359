use crate::cli::output::Output;
use crate::cli::workloads::{self, Params, Workload};
use crate::config::Options;
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct RunArgs {
    /// Workload to run
    #[arg(value_enum)]
    pub workload: Workload,

    /// First value of the integer range (sum, moments)
    #[arg(long, default_value_t = -10, allow_hyphen_values = true)]
    pub start: i64,

    /// Last value of the integer range, inclusive (sum, moments)
    #[arg(long, default_value_t = 10, allow_hyphen_values = true)]
    pub end: i64,

    /// Number of events or light-curve samples (lightcurve, rebin)
    #[arg(long, default_value_t = 1000)]
    pub size: usize,

    /// Number of histogram bins (lightcurve)
    #[arg(long, default_value_t = 10)]
    pub bins: usize,

    /// Samples merged into one bin (rebin)
    #[arg(long, default_value_t = 4)]
    pub factor: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    fn params(&self) -> Params {
        Params {
            start: self.start,
            end: self.end,
            size: self.size,
            bins: self.bins,
            factor: self.factor,
        }
    }
}

pub fn execute(args: RunArgs, options: &Options, verbose: u8, quiet: bool) -> Result<()> {
    let output = Output::new(verbose > 0, quiet);
    let report = workloads::run(args.workload, &args.params(), options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output.report(&report);
    output.detail(&format!("Options: {:?}", options));

    Ok(())
}
