use crate::error::GradeError;
use crate::grading::format;
use crate::record::FinalScore;
use clap::ValueEnum;
use serde::Serialize;
use std::str::FromStr;

/// How a student's totals become the roster grade field.
///
/// | Mode         | Field                  |
/// |--------------|------------------------|
/// | `Percentage` | `100 * earned / max`   |
/// | `Raw`        | `earned`               |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    #[default]
    #[value(name = "percent", alias = "percentage")]
    Percentage,
    Raw,
}

impl Normalization {
    /// Formats the grade field for `identifier`, one decimal place.
    ///
    /// # Errors
    ///
    /// [`GradeError::ZeroMaximum`] in percentage mode when the maximum is zero.
    pub fn grade_field(self, identifier: &str, score: FinalScore) -> Result<String, GradeError> {
        let value = match self {
            Normalization::Percentage => {
                if score.max == 0.0 {
                    return Err(GradeError::ZeroMaximum {
                        identifier: identifier.to_string(),
                    });
                }
                100.0 * score.earned / score.max
            }
            Normalization::Raw => score.earned,
        };
        Ok(format::grade_field(value))
    }
}

impl FromStr for Normalization {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percent" | "percentage" => Ok(Normalization::Percentage),
            "raw" => Ok(Normalization::Raw),
            other => anyhow::bail!("unknown normalization mode {other:?}, expected percent or raw"),
        }
    }
}
