//! End-to-end merge: validate inputs, reconcile, build the archive.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::archive::{self, ArchiveSummary, ZipTreeWriter};
use crate::config::MergeConfig;
use crate::error::InputError;
use crate::reconcile::reconcile;
use crate::record::MergeResult;
use crate::roster::Roster;
use crate::source::LocalSource;

#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub roster: PathBuf,
    /// Requested output path; `.zip` is added if missing.
    pub output: PathBuf,
    /// Marker folders, later ones win on conflicting question ids.
    pub markers: Vec<PathBuf>,
}

impl MergeRequest {
    /// Checks the preconditions and returns the archive path to produce.
    ///
    /// # Errors
    ///
    /// The first failing [`InputError`], naming the offending path.
    pub fn validate(&self) -> Result<PathBuf, InputError> {
        if !self.roster.is_file() {
            return Err(InputError::MissingRoster(self.roster.clone()));
        }

        let base = archive::archive_base(&self.output);
        let archive_path = archive::archive_path(&self.output);
        for candidate in [&base, &archive_path] {
            if candidate.exists() {
                return Err(InputError::OutputExists(candidate.clone()));
            }
        }

        if self.markers.is_empty() {
            return Err(InputError::NoMarkers);
        }
        if let Some(missing) = self.markers.iter().find(|m| !m.is_dir()) {
            return Err(InputError::MissingMarker(missing.clone()));
        }

        Ok(archive_path)
    }
}

/// Checks that a JSON report can be created at `path`: its parent directory
/// exists and the path itself is not a directory.
///
/// Called before the merge so that a bad report path fails while nothing has
/// been written yet.
pub fn validate_report_path(path: &Path) -> Result<(), InputError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if path.is_dir() || !parent.is_dir() {
        return Err(InputError::InvalidReportPath(path.to_path_buf()));
    }
    Ok(())
}

/// Runs the whole merge and returns the archive summary with the merged records.
#[tracing::instrument(skip_all, fields(roster = %request.roster.display(), markers = request.markers.len()))]
pub fn run(request: &MergeRequest, config: &MergeConfig) -> Result<(ArchiveSummary, MergeResult)> {
    let archive_path = request.validate()?;

    let roster = Roster::load(&request.roster)?;
    info!(title = %roster.title, students = roster.rows.len(), "Roster loaded");

    let source = LocalSource::new(config.comments_file_name.as_str());
    let merged = reconcile(&roster, &request.markers, &source)?;

    let summary = archive::build_archive(&roster, &merged, &archive_path, config, &ZipTreeWriter)?;
    debug_assert_eq!(summary.unsubmitted, merged.unsubmitted);
    Ok((summary, merged))
}
