//! CLI entry point for the grade merger.
//!
//! Merges the per-question comment files written by several markers into one
//! archive for bulk upload to the learning-management system: a rewritten
//! grades spreadsheet plus one composite comments file per student.

use anyhow::Result;
use clap::Parser;
use grade_merger::config::MergeConfig;
use grade_merger::grading::Normalization;
use grade_merger::output::{RunReport, log_summary, print_pretty, write_json};
use grade_merger::run::{MergeRequest, run, validate_report_path};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_merger")]
#[command(
    about = "Merge marker comment folders into one grade upload archive",
    long_about = None
)]
struct Cli {
    /// Grade spreadsheet downloaded from the grading platform
    #[arg(value_name = "ROSTER_CSV")]
    roster: PathBuf,

    /// Archive to create; ".zip" is appended if missing
    #[arg(value_name = "OUTPUT_ZIP")]
    output: PathBuf,

    /// Marker folders to merge; later folders win on conflicting questions
    #[arg(value_name = "MARKER_DIR", required = true, num_args = 1..)]
    markers: Vec<PathBuf>,

    /// Grade column mode (overrides GRADE_MERGE_MODE, default percent)
    #[arg(short, long, value_enum)]
    mode: Option<Normalization>,

    /// Comments file name inside each student folder
    #[arg(long, value_name = "NAME")]
    comments_file: Option<String>,

    /// Write a JSON report of the run to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Usage errors are precondition failures like any other.
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let _file_guard = init_logging();

    if let Err(e) = merge(cli) {
        error!(error = %format!("{e:#}"), "Merge failed");
        return Err(e);
    }
    Ok(())
}

fn merge(cli: Cli) -> Result<()> {
    let mut config = MergeConfig::from_env()?;
    if let Some(mode) = cli.mode {
        config.normalization = mode;
    }
    if let Some(name) = cli.comments_file {
        config.comments_file_name = name;
    }

    if let Some(path) = &cli.report {
        validate_report_path(path)?;
    }

    let request = MergeRequest {
        roster: cli.roster,
        output: cli.output,
        markers: cli.markers,
    };
    let (summary, merged) = run(&request, &config)?;

    let report = RunReport::new(&summary, &merged, &config);
    print_pretty(&report);
    log_summary(&report);

    println!(
        "Compiled archive to be uploaded saved to:\n    {}",
        summary.archive_path.display()
    );
    if !summary.unsubmitted.is_empty() {
        println!(
            "No submission for {} student(s): {}",
            summary.unsubmitted.len(),
            summary.unsubmitted.join(", ")
        );
    }

    // Report failures are logged only; the archive stays.
    if let Some(path) = &cli.report {
        if let Err(e) = write_json(path, &report) {
            warn!(error = %format!("{e:#}"), "Report not written");
        }
    }
    Ok(())
}

/// Colored stderr logging, plus a JSON rolling log file when `LOG_FILE_PATH` is set.
fn init_logging() -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let (json_layer, guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let log_dir = Path::new(&log_file_path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let log_file_name = Path::new(&log_file_path)
                .file_name()
                .unwrap_or(OsStr::new("grade_merger.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(
                    EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()),
                );
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}
