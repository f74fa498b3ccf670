//! Matches marker folders against the roster and merges their grades.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::grading::finalize;
use crate::parser::{parse_comments, parse_student_folder};
use crate::record::{MergeResult, StudentRecord, Submission};
use crate::roster::Roster;
use crate::source::SubmissionSource;

/// Builds the merged per-student record set.
///
/// Marker folders are processed in the given order; for a question id graded
/// by several markers the later folder wins. Student folders whose identifier
/// is not on the roster are dropped. Every record is finalized, including
/// those no marker touched.
///
/// # Errors
///
/// Fails on the first folder name or comment line that does not parse, and on
/// any read error.
#[tracing::instrument(skip_all, fields(roster_rows = roster.rows.len(), markers = markers.len()))]
pub fn reconcile<S: SubmissionSource>(
    roster: &Roster,
    markers: &[PathBuf],
    source: &S,
) -> Result<MergeResult> {
    let mut students: HashMap<String, StudentRecord> = roster
        .identifiers()
        .map(|id| (id.to_string(), StudentRecord::new(id)))
        .collect();

    for marker in markers {
        let mut matched = 0usize;
        let mut skipped = 0usize;

        for folder in source.student_folders(marker)? {
            let identifier = parse_student_folder(&folder)
                .with_context(|| format!("in marker folder {}", marker.display()))?;

            let Some(record) = students.get_mut(&identifier) else {
                debug!(folder = %folder, identifier = %identifier, "Student not on roster, skipping");
                skipped += 1;
                continue;
            };

            let content = source.read_comments(marker, &folder)?;
            let questions = parse_comments(&content).with_context(|| {
                format!(
                    "invalid comments for {} in marker folder {}",
                    folder,
                    marker.display()
                )
            })?;

            debug!(folder = %folder, questions = questions.len(), "Merging submission");
            if let Some(previous) = record.absorb(Submission {
                folder_name: folder.clone(),
                questions,
            }) {
                warn!(
                    identifier = %identifier,
                    previous = %previous,
                    using = %folder,
                    "Markers disagree on the folder name for this student, using the later one"
                );
            }
            matched += 1;
        }

        info!(marker = %marker.display(), matched, skipped, "Marker folder merged");
    }

    for record in students.values_mut() {
        finalize(record);
    }

    let unsubmitted: Vec<String> = roster
        .identifiers()
        .filter(|id| students.get(*id).is_none_or(|record| !record.is_submitted()))
        .map(str::to_string)
        .collect();

    Ok(MergeResult {
        students,
        unsubmitted,
    })
}
