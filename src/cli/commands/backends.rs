use crate::cli::output::Output;
use crate::parallel::Dispatcher;
use anyhow::Result;
use clap::Args;

#[derive(Args, Default)]
pub struct BackendsArgs {
    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: BackendsArgs, quiet: bool) -> Result<()> {
    // Availability does not depend on the value type
    let availability = Dispatcher::<f64>::default().availability();

    if args.json {
        let listing: Vec<_> = availability
            .iter()
            .map(|(name, available)| serde_json::json!({ "name": name, "available": available }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    Output::new(false, quiet).backends(&availability);

    Ok(())
}
