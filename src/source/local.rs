use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::store::SubmissionSource;

/// Reads marker folders from the local filesystem.
pub struct LocalSource {
    comments_file_name: String,
}

impl LocalSource {
    pub fn new(comments_file_name: impl Into<String>) -> Self {
        Self {
            comments_file_name: comments_file_name.into(),
        }
    }
}

impl SubmissionSource for LocalSource {
    fn student_folders(&self, marker: &Path) -> Result<Vec<String>> {
        let entries = fs::read_dir(marker)
            .with_context(|| format!("failed to list marker folder {}", marker.display()))?;

        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry?;
            // Follows symlinks, a linked student folder counts.
            if !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => folders.push(name),
                Err(name) => anyhow::bail!(
                    "folder name {:?} in {} is not valid UTF-8",
                    name,
                    marker.display()
                ),
            }
        }
        folders.sort();

        debug!(marker = %marker.display(), folders = folders.len(), "Marker folder listed");
        Ok(folders)
    }

    fn read_comments(&self, marker: &Path, folder: &str) -> Result<String> {
        let path = marker.join(folder).join(&self.comments_file_name);
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read comments file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_folders_lists_sorted_directories_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Bob(B)")).unwrap();
        fs::create_dir(dir.path().join("Alice(A)")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a student").unwrap();

        let source = LocalSource::new("comments.txt");
        let folders = source.student_folders(dir.path()).unwrap();

        assert_eq!(folders, vec!["Alice(A)", "Bob(B)"]);
    }

    #[test]
    fn test_read_comments() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Alice(A)")).unwrap();
        fs::write(dir.path().join("Alice(A)/feedback.txt"), "Q1: 1/1 ok\n").unwrap();

        let source = LocalSource::new("feedback.txt");
        let content = source.read_comments(dir.path(), "Alice(A)").unwrap();

        assert_eq!(content, "Q1: 1/1 ok\n");
    }

    #[test]
    fn test_read_comments_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Alice(A)")).unwrap();

        let source = LocalSource::new("comments.txt");
        let err = source.read_comments(dir.path(), "Alice(A)").unwrap_err();

        assert!(err.to_string().contains("comments.txt"));
    }
}
