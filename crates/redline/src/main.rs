//! redline: transfer hand-marked redline markup onto a running as-built.
//!
//! Loads the annotated redline scan and the running scan, runs the
//! transfer on a background worker, and saves the annotated running
//! image and the cleaned redline.
//!
//! # Usage
//!
//! ```text
//! redline [OPTIONS] --job <JOB> --date <MM/DD/YYYY> <REDLINE> <RUNNING>
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod error;
mod validate;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};
use std::thread;

use clap::Parser;
use redline_pipeline::production::Category;
use redline_pipeline::{Offset, PipelineConfig, Production, Quantities, TransferReport};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::CliError;

/// Transfer redline markup onto a running as-built scan.
///
/// Marker strokes on the redline are registered against the running
/// image, redrawn as antialiased lines, and a callout listing the work
/// date and production units is stamped on.
#[derive(Parser)]
#[command(name = "redline", version)]
struct Cli {
    /// Annotated redline scan (.png).
    redline: PathBuf,

    /// Running as-built scan to annotate (.png).
    running: PathBuf,

    /// Job number, e.g. DYEA_LSA_8XXXXXX or VZ_LAN_0000XXXX.
    #[arg(long)]
    job: String,

    /// Work performed date (MM/DD/YYYY).
    #[arg(long)]
    date: String,

    /// C300-01 strand footage.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    strand: f64,

    /// C300-02 cable footage.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    cable: f64,

    /// C300-03 overlash footage.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    overlash: f64,

    /// C300-04 anchor count.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    anchors: f64,

    /// Directory for the annotated running image.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip saving the cleaned redline to `edits/<name>_PREPROCESS.png`.
    #[arg(long)]
    no_save_redline: bool,

    /// Number of leading reconstructed lines to leave undrawn.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SKIP_LINES)]
    skip_lines: usize,

    /// Horizontal registration bias in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BIAS_X, allow_hyphen_values = true)]
    bias_x: i64,

    /// Vertical registration bias in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BIAS_Y, allow_hyphen_values = true)]
    bias_y: i64,

    /// Snap search radius in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SNAP_RADIUS)]
    snap_radius: u32,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, the individual tuning flags above are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print a JSON summary of the run on stdout.
    #[arg(long)]
    json: bool,
}

/// A validated transfer job.
#[derive(Debug, Clone)]
struct Job {
    redline: PathBuf,
    running: PathBuf,
    number: String,
    production: Production,
    output_dir: PathBuf,
    save_redline: bool,
}

/// What a finished run produced.
#[derive(Debug, Serialize)]
struct RunSummary {
    job: String,
    date: String,
    output: PathBuf,
    preprocessed_redline: Option<PathBuf>,
    report: TransferReport,
}

/// Validate every job field from the command line.
fn job_from_cli(cli: &Cli) -> Result<Job, CliError> {
    validate::png_input("redline", &cli.redline)?;
    validate::png_input("running", &cli.running)?;
    let number = validate::job_number(&cli.job)?;
    let date = validate::work_date(&cli.date)?;
    let quantities = Quantities {
        strand: validate::quantity(Category::Strand, cli.strand)?,
        cable: validate::quantity(Category::Cable, cli.cable)?,
        overlash: validate::quantity(Category::Overlash, cli.overlash)?,
        anchors: validate::quantity(Category::Anchors, cli.anchors)?,
    };
    Ok(Job {
        redline: cli.redline.clone(),
        running: cli.running.clone(),
        number,
        production: Production::from_quantities(date, &quantities),
        output_dir: cli.output_dir.clone(),
        save_redline: !cli.no_save_redline,
    })
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual tuning flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, CliError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(CliError::ConfigJson);
    }
    Ok(PipelineConfig {
        bias: Offset::new(cli.bias_x, cli.bias_y),
        snap_radius: cli.snap_radius,
        skip_lines: cli.skip_lines,
        ..PipelineConfig::default()
    })
}

/// Load, transfer and save. Runs on the worker thread; every status
/// line goes to `progress`.
fn execute(
    job: &Job,
    config: &PipelineConfig,
    progress: &Sender<String>,
) -> Result<RunSummary, CliError> {
    // A closed channel only means nobody is listening any more.
    let sink = |message: &str| {
        let _ = progress.send(message.to_string());
    };

    let mut redline = redline_io::load_rgba(&job.redline)?;
    let mut running = redline_io::load_rgba(&job.running)?;

    let report = redline_pipeline::transfer(
        &mut redline,
        &mut running,
        &job.production,
        config,
        Some(&sink),
    )?;

    sink("Saving ..");
    let preprocessed_redline = if job.save_redline {
        let path = redline_io::preprocessed_redline_path(&job.redline);
        redline_io::save_atomic(&redline, &path)?;
        Some(path)
    } else {
        None
    };

    let output = redline_io::running_output_path(
        &job.output_dir,
        &job.number,
        chrono::Local::now().naive_local(),
    );
    redline_io::save_atomic(&running, &output)?;
    sink(&format!("Saved {}", output.display()));

    Ok(RunSummary {
        job: job.number.clone(),
        date: job.production.date.clone(),
        output,
        preprocessed_redline,
        report,
    })
}

/// Run `job` on a background thread, logging its progress as it
/// arrives.
fn run_in_background(job: Job, config: PipelineConfig) -> Result<RunSummary, CliError> {
    let (tx, rx) = mpsc::channel::<String>();
    let worker = thread::Builder::new()
        .name("transfer".into())
        .spawn(move || execute(&job, &config, &tx))
        .map_err(CliError::Spawn)?;

    // Ends when the worker drops its sender.
    for message in rx {
        info!("{message}");
    }

    worker.join().map_err(|_| CliError::WorkerPanicked)?
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let job = job_from_cli(cli)?;
    let config = config_from_cli(cli)?;
    debug!(?config, job = %job.number, "starting transfer");

    let summary = run_in_background(job, config)?;
    if cli.json {
        let json = serde_json::to_string_pretty(&summary).map_err(CliError::Report)?;
        println!("{json}");
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
