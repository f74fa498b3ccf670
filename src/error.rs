//! Typed failures raised while reading marker input and computing grades.

use std::path::PathBuf;
use thiserror::Error;

/// A piece of input that does not follow its expected grammar.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("malformed comment line {line_no}: {line:?}")]
    MalformedCommentLine { line_no: usize, line: String },

    #[error("malformed student folder name {name:?}, expected \"Name(Identifier)\"")]
    MalformedFolderName { name: String },

    #[error("malformed title line {line:?}, expected a quoted assignment title")]
    MalformedTitle { line: String },

    #[error("roster header needs 3 lines, found {found}")]
    TruncatedHeader { found: usize },

    #[error("roster row for {identifier:?} has {fields} fields, the grade column is missing")]
    ShortRow { identifier: String, fields: usize },
}

/// Arithmetic failures while turning totals into a grade field.
#[derive(Debug, Error, PartialEq)]
pub enum GradeError {
    #[error("cannot normalize grade for {identifier:?}: maximum score is zero")]
    ZeroMaximum { identifier: String },
}

/// Command-line preconditions, checked before anything is read or written.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("'{}' is not a valid file", .0.display())]
    MissingRoster(PathBuf),

    #[error("specified output path {} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("'{}' is not a valid directory", .0.display())]
    MissingMarker(PathBuf),

    #[error("at least one marker folder is required")]
    NoMarkers,

    #[error("report path '{}' is not a file in an existing directory", .0.display())]
    InvalidReportPath(PathBuf),
}
