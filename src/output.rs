//! Run report: what was archived and who had no submission.
//!
//! Supports debug pretty-printing, a log summary, and JSON output.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::archive::ArchiveSummary;
use crate::config::MergeConfig;
use crate::grading::Normalization;
use crate::record::MergeResult;

#[derive(Debug, Serialize)]
pub struct StudentSummary {
    pub identifier: String,
    pub folder_name: String,
    pub earned: f64,
    pub max: f64,
    pub grade: String,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub archive_path: String,
    pub mode: Normalization,
    pub submitted: Vec<StudentSummary>,
    pub unsubmitted: Vec<String>,
}

impl RunReport {
    /// Collects the report for a finished archive, students in roster order.
    ///
    /// Grades are taken from the archive summary as written, never recomputed.
    pub fn new(summary: &ArchiveSummary, merged: &MergeResult, config: &MergeConfig) -> Self {
        let submitted = summary
            .written
            .iter()
            .filter_map(|staged| {
                let record = merged.submitted(&staged.identifier)?;
                Some(StudentSummary {
                    identifier: staged.identifier.clone(),
                    folder_name: record.folder_name.clone().unwrap_or_default(),
                    earned: record.final_score.earned,
                    max: record.final_score.max,
                    grade: staged.grade.clone(),
                })
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            archive_path: summary.archive_path.display().to_string(),
            mode: config.normalization,
            submitted,
            unsubmitted: summary.unsubmitted.clone(),
        }
    }
}

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &RunReport) {
    debug!("{:#?}", report);
}

/// Logs one line for the run plus one warning per unsubmitted student.
pub fn log_summary(report: &RunReport) {
    info!(
        archive = %report.archive_path,
        submitted = report.submitted.len(),
        unsubmitted = report.unsubmitted.len(),
        "Merge complete"
    );
    for identifier in &report.unsubmitted {
        warn!(identifier = %identifier, "No submission found in any marker folder");
    }
}

/// Writes the report as pretty-printed JSON, replacing any existing file.
pub fn write_json(path: &Path, report: &RunReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, report).context("failed to serialize report")?;
    out.write_all(b"\n")?;
    out.flush()?;
    debug!(path = %path.display(), "Report written");
    Ok(())
}
