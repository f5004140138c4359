//! Built-in workloads for `fanfold run`
//!
//! Each workload builds its input, dispatches a work function over it and
//! returns a [`Report`] with the reduced values and the route taken.

use crate::config::Options;
use crate::parallel::{Dispatched, Dispatcher, Output, Route, Work, reducers};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Value, json};

/// Workloads available from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Workload {
    /// Sum of an integer range
    Sum,
    /// Sum and sum of squares of an integer range
    Moments,
    /// Histogram of synthetic event times
    Lightcurve,
    /// Rebinned light curve, time and counts concatenated across slices
    Rebin,
}

/// Inputs shared by the workloads
#[derive(Debug, Clone)]
pub struct Params {
    pub start: i64,
    pub end: i64,
    pub size: usize,
    pub bins: usize,
    pub factor: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            start: -10,
            end: 10,
            size: 1000,
            bins: 10,
            factor: 4,
        }
    }
}

/// Outcome of one workload run
#[derive(Debug, Serialize)]
pub struct Report {
    pub workload: Workload,
    pub route: String,
    pub parallel: bool,
    pub result: Value,
}

impl Report {
    fn new<V>(workload: Workload, dispatched: &Dispatched<V>, result: Value) -> Self {
        Self {
            workload,
            route: dispatched.route.to_string(),
            parallel: matches!(dispatched.route, Route::Parallel { .. }),
            result,
        }
    }
}

pub fn run(workload: Workload, params: &Params, options: &Options) -> Result<Report> {
    tracing::info!("Running workload {:?}", workload);
    match workload {
        Workload::Sum => sum(params, options),
        Workload::Moments => moments(params, options),
        Workload::Lightcurve => lightcurve(params, options),
        Workload::Rebin => rebin(params, options),
    }
}

fn integer_range(params: &Params) -> Result<Vec<i64>> {
    if params.start > params.end {
        anyhow::bail!("--start ({}) is greater than --end ({})", params.start, params.end);
    }
    Ok((params.start..=params.end).collect())
}

fn sum(params: &Params, options: &Options) -> Result<Report> {
    let data = integer_range(params)?;
    let work: Work<Vec<i64>, i64> =
        Work::returning(|part: Vec<i64>| Ok(Output::Scalar(part.iter().sum())));

    let dispatched = Dispatcher::default().execute(&work, &[reducers::sum()], &data, options)?;
    let total = dispatched
        .output
        .as_scalar()
        .copied()
        .context("sum workload produced no value")?;

    Ok(Report::new(Workload::Sum, &dispatched, json!({ "sum": total })))
}

fn moments(params: &Params, options: &Options) -> Result<Report> {
    let data = integer_range(params)?;
    let work: Work<Vec<i64>, i64> = Work::returning(|part: Vec<i64>| {
        let total: i64 = part.iter().sum();
        let squares: i64 = part.iter().map(|x| x * x).sum();
        Ok(Output::pair(total, squares))
    });

    let dispatched = Dispatcher::default().execute(
        &work,
        &[reducers::sum(), reducers::sum()],
        &data,
        options,
    )?;
    let fields = dispatched.output.clone().into_fields();
    let [total, squares] = fields[..] else {
        anyhow::bail!("moments workload returned {} fields", fields.len());
    };

    Ok(Report::new(
        Workload::Moments,
        &dispatched,
        json!({ "sum": total, "sum_of_squares": squares }),
    ))
}

/// Deterministic, roughly uniform event times in `[0, duration)`
pub fn synthetic_events(count: usize, duration: f64) -> Vec<f64> {
    const STEP: f64 = 0.618_033_988_749_895;
    (0..count)
        .map(|i| (i as f64 * STEP).fract() * duration)
        .collect()
}

/// Counts of `events` in `bins` equal bins over `[0, duration)`
pub fn histogram(events: &[f64], bins: usize, duration: f64) -> Vec<f64> {
    let mut counts = vec![0.0; bins];
    let width = duration / bins as f64;
    for &t in events {
        if !(0.0..duration).contains(&t) {
            continue;
        }
        let bin = ((t / width) as usize).min(bins - 1);
        counts[bin] += 1.0;
    }
    counts
}

fn lightcurve(params: &Params, options: &Options) -> Result<Report> {
    if params.bins == 0 {
        anyhow::bail!("--bins must be at least 1");
    }
    let duration = params.bins as f64;
    let events = synthetic_events(params.size, duration);
    let bins = params.bins;

    let work: Work<Vec<f64>, Vec<f64>> = Work::returning(move |part: Vec<f64>| {
        Ok(Output::Scalar(histogram(&part, bins, duration)))
    });

    let dispatched = Dispatcher::default().execute(&work, &[reducers::sum()], &events, options)?;
    let counts = dispatched
        .output
        .as_scalar()
        .cloned()
        .context("lightcurve workload produced no counts")?;
    let total: f64 = counts.iter().sum();

    Ok(Report::new(
        Workload::Lightcurve,
        &dispatched,
        json!({ "counts": counts, "total": total }),
    ))
}

/// Rebin one slice of a light curve by `factor`; a short trailing group is kept
pub fn rebin_slice(times: &[f64], counts: &[f64], factor: usize) -> (Vec<f64>, Vec<f64>) {
    times
        .chunks(factor)
        .zip(counts.chunks(factor))
        .map(|(t, c)| (t.iter().sum::<f64>() / t.len() as f64, c.iter().sum::<f64>()))
        .unzip()
}

fn rebin(params: &Params, options: &Options) -> Result<Report> {
    if params.factor == 0 {
        anyhow::bail!("--factor must be at least 1");
    }
    let dt = 0.5;
    let times: Vec<f64> = (0..params.size).map(|i| i as f64 * dt).collect();
    let counts: Vec<f64> = (0..params.size).map(|i| (i % 7) as f64).collect();
    let factor = params.factor;

    let work: Work<(Vec<f64>, Vec<f64>), Vec<f64>> =
        Work::returning(move |(times, counts): (Vec<f64>, Vec<f64>)| {
            let (times, counts) = rebin_slice(&times, &counts, factor);
            Ok(Output::pair(times, counts))
        });

    let dispatched = Dispatcher::default().execute(
        &work,
        &[reducers::concat(), reducers::concat()],
        &(times, counts),
        options,
    )?;
    let mut fields = dispatched.output.clone().into_fields();
    if fields.len() != 2 {
        anyhow::bail!("rebin workload returned {} fields", fields.len());
    }
    let counts = fields.pop().unwrap_or_default();
    let times = fields.pop().unwrap_or_default();

    Ok(Report::new(
        Workload::Rebin,
        &dispatched,
        json!({
            "bins": times.len(),
            "total_counts": counts.iter().sum::<f64>(),
            "time": times,
            "counts": counts,
        }),
    ))
}
