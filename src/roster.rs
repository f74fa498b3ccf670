//! Roster spreadsheet as downloaded from the grading platform.
//!
//! Layout: a 3-line header block whose first line carries the quoted
//! assignment title, then one CSV row per enrolled student with the
//! identifier in column 0 and the grade in column 4.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::debug;

use crate::error::ParseError;
use crate::parser::parse_assignment_title;

pub const HEADER_LINES: usize = 3;
pub const IDENTIFIER_COLUMN: usize = 0;
pub const GRADE_COLUMN: usize = 4;

#[derive(Debug, Clone)]
pub struct Roster {
    /// The header block exactly as read, line terminators included.
    pub header: String,
    pub title: String,
    pub rows: Vec<StringRecord>,
}

impl Roster {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read roster {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid roster {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.split_inclusive('\n');
        let mut header = String::new();
        let mut found = 0;
        for line in lines.by_ref().take(HEADER_LINES) {
            header.push_str(line);
            found += 1;
        }
        if found < HEADER_LINES {
            return Err(ParseError::TruncatedHeader { found }.into());
        }

        let first_line = header.lines().next().unwrap_or_default();
        let title = parse_assignment_title(first_line)?;

        let body = &content[header.len()..];
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(body.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let row = result.context("failed to parse roster row")?;
            if row.iter().all(|field| field.is_empty()) {
                continue;
            }
            rows.push(row);
        }

        debug!(title = %title, rows = rows.len(), "Roster parsed");
        Ok(Self {
            header,
            title,
            rows,
        })
    }

    /// Identifiers in roster order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(|row| row.get(IDENTIFIER_COLUMN))
    }
}
