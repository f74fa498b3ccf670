//! Run configuration.
//!
//! Defaults can be overridden from the environment (or a `.env` file loaded
//! at startup), and the CLI overrides both:
//!
//! | Variable                    | Meaning                         | Default        |
//! |-----------------------------|---------------------------------|----------------|
//! | `GRADE_MERGE_MODE`          | `percent` or `raw`              | `percent`      |
//! | `GRADE_MERGE_COMMENTS_FILE` | comments file in student folder | `comments.txt` |
//! | `GRADE_MERGE_STAGING_DIR`   | parent of the staging directory | system temp    |

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::grading::Normalization;

pub const MODE_VAR: &str = "GRADE_MERGE_MODE";
pub const COMMENTS_FILE_VAR: &str = "GRADE_MERGE_COMMENTS_FILE";
pub const STAGING_DIR_VAR: &str = "GRADE_MERGE_STAGING_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    pub normalization: Normalization,
    pub comments_file_name: String,
    pub grades_file_name: String,
    /// Where the archive tree is staged; `None` uses the system temp directory.
    pub staging_dir: Option<PathBuf>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            normalization: Normalization::Percentage,
            comments_file_name: "comments.txt".to_string(),
            grades_file_name: "grades.csv".to_string(),
            staging_dir: None,
        }
    }
}

impl MergeConfig {
    /// Loads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup, unset keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(mode) = lookup(MODE_VAR) {
            config.normalization = mode
                .parse()
                .with_context(|| format!("invalid {MODE_VAR}"))?;
        }
        if let Some(name) = lookup(COMMENTS_FILE_VAR).filter(|n| !n.trim().is_empty()) {
            config.comments_file_name = name;
        }
        if let Some(dir) = lookup(STAGING_DIR_VAR).filter(|d| !d.trim().is_empty()) {
            config.staging_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }
}
