use anyhow::Result;
use clap::Parser;
use fanfold::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
