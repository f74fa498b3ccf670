use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::writer::ArchiveWriter;
use crate::config::MergeConfig;
use crate::error::ParseError;
use crate::record::MergeResult;
use crate::roster::{GRADE_COLUMN, IDENTIFIER_COLUMN, Roster};

/// A student row as it was written to the grades spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedStudent {
    pub identifier: String,
    /// The grade column exactly as written.
    pub grade: String,
}

/// What ended up in the archive.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub archive_path: PathBuf,
    /// Students written to the new spreadsheet, in roster order.
    pub written: Vec<StagedStudent>,
    /// Roster identifiers left out for lack of a submission, in roster order.
    pub unsubmitted: Vec<String>,
    pub entries: usize,
}

/// Strips a trailing `.zip` (any case) from the requested output path.
pub fn archive_base(output: &Path) -> PathBuf {
    match output.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("zip") => output.with_extension(""),
        _ => output.to_path_buf(),
    }
}

/// The archive file actually produced for a requested output path.
pub fn archive_path(output: &Path) -> PathBuf {
    let mut path: OsString = archive_base(output).into_os_string();
    path.push(".zip");
    PathBuf::from(path)
}

/// Writes the upload layout to a fresh staging directory and archives it.
///
/// Layout under the assignment title directory:
/// - the grades spreadsheet: original 3-line header, then one fully quoted
///   row per submitted student with the grade column rewritten
/// - one folder per submitted student holding the composite comment
///
/// Roster rows without a submission are left out and reported. The staging
/// directory is created under `config.staging_dir` (the system temp directory
/// when unset) and removed afterwards, on error too; a failure to remove it
/// after a successful write is only logged.
///
/// # Errors
///
/// Fails on I/O errors, on a submitted row too short to hold a grade, and on
/// a zero maximum in percentage mode. No archive is left behind on failure.
#[tracing::instrument(skip_all, fields(title = %roster.title, dest = %dest.display()))]
pub fn build_archive<W: ArchiveWriter>(
    roster: &Roster,
    merged: &MergeResult,
    dest: &Path,
    config: &MergeConfig,
    writer: &W,
) -> Result<ArchiveSummary> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("grade-merge-");
    let staging = match &config.staging_dir {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    }
    .context("failed to create staging directory")?;
    debug!(staging = %staging.path().display(), "Staging directory created");

    let assignment_dir = staging.path().join(&roster.title);
    fs::create_dir(&assignment_dir)
        .with_context(|| format!("failed to create {}", assignment_dir.display()))?;

    let (written, unsubmitted) = stage_assignment(roster, merged, &assignment_dir, config)?;

    let entries = writer.write_tree(staging.path(), &roster.title, dest)?;
    info!(
        archive = %dest.display(),
        entries,
        written = written.len(),
        unsubmitted = unsubmitted.len(),
        "Archive written"
    );

    let staging_path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        warn!(staging = %staging_path.display(), error = %e, "Failed to remove staging directory");
    }

    Ok(ArchiveSummary {
        archive_path: dest.to_path_buf(),
        written,
        unsubmitted,
        entries,
    })
}

/// Fills the assignment directory. Returns the written students and the
/// unsubmitted identifiers.
fn stage_assignment(
    roster: &Roster,
    merged: &MergeResult,
    assignment_dir: &Path,
    config: &MergeConfig,
) -> Result<(Vec<StagedStudent>, Vec<String>)> {
    let grades_path = assignment_dir.join(&config.grades_file_name);
    let mut grades_file = File::create(&grades_path)
        .with_context(|| format!("failed to create {}", grades_path.display()))?;
    grades_file
        .write_all(roster.header.as_bytes())
        .context("failed to write grades header")?;

    let mut csv_out = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .flexible(true)
        .from_writer(grades_file);

    let mut written = Vec::new();
    let mut unsubmitted = Vec::new();

    for row in &roster.rows {
        let identifier = row.get(IDENTIFIER_COLUMN).unwrap_or_default();

        let Some(record) = merged.submitted(identifier) else {
            debug!(identifier, "No submission, leaving out of spreadsheet");
            unsubmitted.push(identifier.to_string());
            continue;
        };

        let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
        if fields.len() <= GRADE_COLUMN {
            return Err(ParseError::ShortRow {
                identifier: identifier.to_string(),
                fields: fields.len(),
            }
            .into());
        }
        let grade = config
            .normalization
            .grade_field(identifier, record.final_score)?;
        fields[GRADE_COLUMN] = grade.clone();
        csv_out
            .write_record(&fields)
            .with_context(|| format!("failed to write grades row for {identifier}"))?;

        // Folder names come from `folder_name`, always set for submitted records.
        let folder = record.folder_name.as_deref().unwrap_or(identifier);
        let student_dir = assignment_dir.join(folder);
        fs::create_dir_all(&student_dir)
            .with_context(|| format!("failed to create {}", student_dir.display()))?;
        let comments_path = student_dir.join(&config.comments_file_name);
        fs::write(&comments_path, &record.final_comment)
            .with_context(|| format!("failed to write {}", comments_path.display()))?;

        debug!(identifier, grade = %grade, "Student staged");
        written.push(StagedStudent {
            identifier: identifier.to_string(),
            grade,
        });
    }

    csv_out.flush().context("failed to flush grades spreadsheet")?;
    Ok((written, unsubmitted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::Normalization;
    use crate::record::{FinalScore, StudentRecord};
    use std::cell::RefCell;

    /// Captures the staged tree instead of compressing it.
    #[derive(Default)]
    struct CaptureWriter {
        files: RefCell<Vec<(String, String)>>,
    }

    impl ArchiveWriter for CaptureWriter {
        fn write_tree(&self, root: &Path, base: &str, _dest: &Path) -> Result<usize> {
            let mut stack = vec![root.join(base)];
            while let Some(dir) = stack.pop() {
                for entry in fs::read_dir(&dir)? {
                    let path = entry?.path();
                    if path.is_dir() {
                        stack.push(path);
                    } else {
                        let rel = path.strip_prefix(root)?.to_string_lossy().replace('\\', "/");
                        self.files
                            .borrow_mut()
                            .push((rel, fs::read_to_string(&path)?));
                    }
                }
            }
            self.files.borrow_mut().sort();
            Ok(self.files.borrow().len())
        }
    }

    impl CaptureWriter {
        fn file(&self, name: &str) -> Option<String> {
            self.files
                .borrow()
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, content)| content.clone())
        }
    }

    const ROSTER: &str = "\"Assignment 1\",\"Points\"\n\n\"Display ID\",\"ID\",\"Last Name\",\"First Name\",\"grade\",\"Submission date\"\n\"A\",\"A\",\"Liddell\",\"Alice\",\"\",\"\"\n\"B\",\"B\",\"Builder\",\"Bob\",\"\",\"\"\n";

    fn submitted(id: &str, folder: &str, earned: f64, max: f64, comment: &str) -> StudentRecord {
        StudentRecord {
            identifier: id.to_string(),
            folder_name: Some(folder.to_string()),
            final_score: FinalScore { earned, max },
            final_comment: comment.to_string(),
            ..Default::default()
        }
    }

    fn merged(records: Vec<StudentRecord>) -> MergeResult {
        MergeResult {
            students: records
                .into_iter()
                .map(|r| (r.identifier.clone(), r))
                .collect(),
            unsubmitted: Vec::new(),
        }
    }

    fn config(normalization: Normalization) -> MergeConfig {
        MergeConfig {
            normalization,
            ..Default::default()
        }
    }

    fn identifiers(summary: &ArchiveSummary) -> Vec<&str> {
        summary.written.iter().map(|s| s.identifier.as_str()).collect()
    }

    #[test]
    fn test_archive_path_normalization() {
        assert_eq!(archive_path(Path::new("out/upload.zip")), PathBuf::from("out/upload.zip"));
        assert_eq!(archive_path(Path::new("out/upload.ZIP")), PathBuf::from("out/upload.zip"));
        assert_eq!(archive_path(Path::new("upload")), PathBuf::from("upload.zip"));
        assert_eq!(archive_path(Path::new("a1.v2")), PathBuf::from("a1.v2.zip"));
        assert_eq!(archive_base(Path::new("upload.Zip")), PathBuf::from("upload"));
    }

    #[test]
    fn test_build_writes_grades_and_comments() {
        let roster = Roster::parse(ROSTER).unwrap();
        let merged = merged(vec![
            submitted("A", "Alice(A)", 17.0, 20.0, "Q1: 17.0/20.0 ok\n"),
            submitted("B", "Bob(B)", 5.0, 5.0, "Q1: 5.0/5.0 Fine\n"),
        ]);
        let writer = CaptureWriter::default();

        let summary = build_archive(
            &roster,
            &merged,
            Path::new("unused.zip"),
            &config(Normalization::Percentage),
            &writer,
        )
        .unwrap();

        assert_eq!(identifiers(&summary), vec!["A", "B"]);
        assert_eq!(summary.written[0].grade, "85.0");
        assert_eq!(summary.written[1].grade, "100.0");
        assert!(summary.unsubmitted.is_empty());
        assert_eq!(summary.entries, 3);

        let grades = writer.file("Assignment 1/grades.csv").unwrap();
        assert_eq!(
            grades,
            format!(
                "{}{}{}",
                roster.header,
                "\"A\",\"A\",\"Liddell\",\"Alice\",\"85.0\",\"\"\r\n",
                "\"B\",\"B\",\"Builder\",\"Bob\",\"100.0\",\"\"\r\n"
            )
        );
        assert_eq!(
            writer.file("Assignment 1/Alice(A)/comments.txt").unwrap(),
            "Q1: 17.0/20.0 ok\n"
        );
        assert_eq!(
            writer.file("Assignment 1/Bob(B)/comments.txt").unwrap(),
            "Q1: 5.0/5.0 Fine\n"
        );
    }

    #[test]
    fn test_build_raw_mode() {
        let roster = Roster::parse(ROSTER).unwrap();
        let merged = merged(vec![submitted("A", "Alice(A)", 17.0, 20.0, "")]);
        let writer = CaptureWriter::default();

        build_archive(
            &roster,
            &merged,
            Path::new("unused.zip"),
            &config(Normalization::Raw),
            &writer,
        )
        .unwrap();

        let grades = writer.file("Assignment 1/grades.csv").unwrap();
        assert!(grades.contains("\"A\",\"A\",\"Liddell\",\"Alice\",\"17.0\",\"\"\r\n"));
    }

    #[test]
    fn test_build_leaves_out_unsubmitted_rows() {
        let roster = Roster::parse(ROSTER).unwrap();
        let mut merged = merged(vec![submitted("B", "Bob(B)", 1.0, 2.0, "")]);
        merged
            .students
            .insert("A".to_string(), StudentRecord::new("A"));
        let writer = CaptureWriter::default();

        let summary = build_archive(
            &roster,
            &merged,
            Path::new("unused.zip"),
            &config(Normalization::Percentage),
            &writer,
        )
        .unwrap();

        assert_eq!(identifiers(&summary), vec!["B"]);
        assert_eq!(summary.unsubmitted, vec!["A"]);
        let grades = writer.file("Assignment 1/grades.csv").unwrap();
        assert!(!grades.contains("Liddell"));
        assert!(writer.file("Assignment 1/Alice(A)/comments.txt").is_none());
    }

    #[test]
    fn test_build_zero_max_fails_in_percentage_mode() {
        let roster = Roster::parse(ROSTER).unwrap();
        let merged = merged(vec![submitted("A", "Alice(A)", 0.0, 0.0, "")]);
        let writer = CaptureWriter::default();

        let err = build_archive(
            &roster,
            &merged,
            Path::new("unused.zip"),
            &config(Normalization::Percentage),
            &writer,
        )
        .unwrap_err();

        assert!(err.downcast_ref::<crate::error::GradeError>().is_some());
        assert!(writer.files.borrow().is_empty());
    }

    #[test]
    fn test_build_short_row_fails() {
        let roster = Roster::parse("\"Quiz\"\n\nh\n\"A\",\"A\",\"x\"\n").unwrap();
        let merged = merged(vec![submitted("A", "Alice(A)", 1.0, 1.0, "")]);

        let err = build_archive(
            &roster,
            &merged,
            Path::new("unused.zip"),
            &config(Normalization::Raw),
            &CaptureWriter::default(),
        )
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ParseError>(),
            Some(&ParseError::ShortRow {
                identifier: "A".to_string(),
                fields: 3
            })
        );
    }

    #[test]
    fn test_staging_dir_removed_after_success() {
        let parent = tempfile::tempdir().unwrap();
        let roster = Roster::parse(ROSTER).unwrap();
        let merged = merged(vec![submitted("A", "Alice(A)", 17.0, 20.0, "")]);
        let config = MergeConfig {
            staging_dir: Some(parent.path().to_path_buf()),
            ..config(Normalization::Percentage)
        };
        let writer = CaptureWriter::default();

        build_archive(&roster, &merged, Path::new("unused.zip"), &config, &writer).unwrap();

        assert!(!writer.files.borrow().is_empty());
        assert!(fs::read_dir(parent.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_staging_dir_removed_after_failure() {
        let parent = tempfile::tempdir().unwrap();
        let roster = Roster::parse(ROSTER).unwrap();
        let merged = merged(vec![submitted("A", "Alice(A)", 0.0, 0.0, "")]);
        let config = MergeConfig {
            staging_dir: Some(parent.path().to_path_buf()),
            ..config(Normalization::Percentage)
        };

        let err = build_archive(
            &roster,
            &merged,
            Path::new("unused.zip"),
            &config,
            &CaptureWriter::default(),
        )
        .unwrap_err();

        assert!(err.downcast_ref::<crate::error::GradeError>().is_some());
        assert!(fs::read_dir(parent.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_missing_staging_parent_fails() {
        let parent = tempfile::tempdir().unwrap();
        let config = MergeConfig {
            staging_dir: Some(parent.path().join("missing")),
            ..config(Normalization::Raw)
        };

        let err = build_archive(
            &Roster::parse(ROSTER).unwrap(),
            &merged(Vec::new()),
            Path::new("unused.zip"),
            &config,
            &CaptureWriter::default(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("staging directory"));
    }
}
