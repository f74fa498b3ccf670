//! Access to marker folders.
//!
//! [`SubmissionSource`] is the seam the reconciler enumerates through;
//! [`LocalSource`] reads real directories on disk.

mod local;
mod store;

pub use local::LocalSource;
pub use store::SubmissionSource;
