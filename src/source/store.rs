use anyhow::Result;
use std::path::Path;

/// Enumerates student folders inside a marker folder and reads their comments.
pub trait SubmissionSource {
    /// Names of the immediate student subdirectories of `marker`, sorted.
    fn student_folders(&self, marker: &Path) -> Result<Vec<String>>;

    /// Content of the comments file inside `marker/folder`.
    fn read_comments(&self, marker: &Path, folder: &str) -> Result<String>;
}
