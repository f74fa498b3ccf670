//! Upload archive construction.
//!
//! [`build_archive`] lays the merged grades out in a staging directory the way
//! the grading platform expects a bulk upload, then hands the tree to an
//! [`ArchiveWriter`].

mod builder;
mod writer;

pub use builder::{ArchiveSummary, StagedStudent, archive_base, archive_path, build_archive};
pub use writer::{ArchiveWriter, ZipTreeWriter};
