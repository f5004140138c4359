//! Terminal rendering for fanfold commands
//!
//! Commands hand over whole values (a workload [`Report`], the backend listing)
//! and this module decides how they look. Everything except errors is silenced
//! by `--quiet`.

use crate::cli::workloads::Report;
use console::{Style, style};
use serde_json::Value;

/// Arrays longer than this are shortened in text output
const PREVIEW_LEN: usize = 8;

pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Workload name, the route it took and one row per reduced value
    pub fn report(&self, report: &Report) {
        if self.quiet {
            return;
        }

        let name = serde_json::to_value(report.workload)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", report.workload));
        println!("{}", style(name).bold().underlined());

        let route = if report.parallel {
            Style::new().green()
        } else {
            Style::new().yellow()
        };
        println!("  {:<16} {}", style("route").dim(), route.apply_to(&report.route));

        if let Some(fields) = report.result.as_object() {
            for (key, value) in fields {
                println!("  {:<16} {}", style(key).dim(), preview(value));
            }
        }

        if !report.parallel {
            println!(
                "{} ran sequentially; rerun with -v to see why",
                style("⚠").yellow()
            );
        }
    }

    /// Backends in dispatch order with their probe result
    pub fn backends(&self, availability: &[(String, bool)]) {
        if self.quiet {
            return;
        }

        println!("{}", style("Backends (in dispatch order)").bold().underlined());
        for (position, (name, available)) in availability.iter().enumerate() {
            let status = if *available {
                style("available").green()
            } else {
                style("unavailable").red()
            };
            println!("  {}. {:<16} {}", position + 1, name, status);
        }

        if availability.iter().all(|(_, available)| !available) {
            println!(
                "{} no backend is usable; work will run sequentially",
                style("⚠").yellow()
            );
        }
    }

    /// Confirmation that the merged options resolve to a worker count
    pub fn valid_config(&self, workers: usize) {
        if !self.quiet {
            println!(
                "{} Configuration is valid ({} workers)",
                style("✔").green(),
                style(workers).bold()
            );
        }
    }

    /// Extra detail shown with `-v`
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{}", style(message).dim());
        }
    }
}

/// One-line rendering of a result value; long arrays keep their first entries
fn preview(value: &Value) -> String {
    match value {
        Value::Array(items) if items.len() > PREVIEW_LEN => {
            let head: Vec<String> = items.iter().take(PREVIEW_LEN).map(Value::to_string).collect();
            format!("[{}, ... ({} values)]", head.join(", "), items.len())
        }
        other => other.to_string(),
    }
}
