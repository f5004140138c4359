use crate::cli::output::Output;
use crate::config::Options;
use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display the merged options, command-line overrides included
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Toml)]
        format: ShowFormat,
    },
    /// Check the merged options without running anything
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Toml,
    Json,
}

pub fn execute(args: ConfigArgs, options: &Options, quiet: bool) -> Result<()> {
    match args.command {
        ConfigCommand::Show { format } => {
            let rendered = render(options, format)?;
            println!("{}", rendered.trim_end());
        }
        ConfigCommand::Validate => {
            options.validate()?;
            Output::new(false, quiet).valid_config(options.worker_count()?);
        }
    }

    Ok(())
}

pub fn render(options: &Options, format: ShowFormat) -> Result<String> {
    Ok(match format {
        ShowFormat::Toml => toml::to_string_pretty(options)?,
        ShowFormat::Json => serde_json::to_string_pretty(options)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_toml_uses_config_keys() {
        let options = Options::new().with_cpus(2).prefer("task-graph");
        let rendered = render(&options, ShowFormat::Toml).unwrap();
        assert!(rendered.contains("cpus = 2"));
        assert!(rendered.contains("preferred = \"task-graph\""));
        assert!(rendered.contains("worker_policy = \"all-cores\""));
    }

    #[test]
    fn test_render_json_round_trips() {
        let options = Options::new().with_shared_res(true);
        let rendered = render(&options, ShowFormat::Json).unwrap();
        let parsed: Options = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, options);
    }
}
