//! Parsers for the small text grammars markers and the grading platform use.
//!
//! - comment files: `Q<id>: <earned>/<max> <comment>` per line
//! - student folders: `DisplayName(Identifier)`
//! - roster title line: first double-quoted substring

use crate::error::ParseError;
use crate::record::{QuestionGrade, Questions};

/// Parses the content of one student's comment file.
///
/// Blank lines are ignored. Any other line that does not follow the grammar
/// fails the whole file; there is no partial result.
///
/// # Errors
///
/// Returns [`ParseError::MalformedCommentLine`] for the first bad line
/// (1-based line number).
pub fn parse_comments(content: &str) -> Result<Questions, ParseError> {
    let mut questions = Questions::new();

    for (idx, raw) in content.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let (question_id, grade) =
            parse_comment_line(raw).ok_or_else(|| ParseError::MalformedCommentLine {
                line_no: idx + 1,
                line: raw.to_string(),
            })?;
        questions.insert(question_id, grade);
    }

    Ok(questions)
}

/// Splits on the first colon, then on the slash between the two scores.
fn parse_comment_line(raw: &str) -> Option<(String, QuestionGrade)> {
    let line = raw.trim();
    let rest = line.strip_prefix('Q')?;

    let (question_id, rest) = rest.split_once(':')?;
    let question_id = question_id.trim();
    if question_id.is_empty() {
        return None;
    }

    let (earned, rest) = take_number(rest.trim_start())?;
    let rest = rest.trim_start().strip_prefix('/')?;
    let (max, rest) = take_number(rest.trim_start())?;

    // The comment must be separated from the score, "8/10Good" is ambiguous.
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    Some((
        question_id.to_string(),
        QuestionGrade::new(earned, max, rest.trim()),
    ))
}

/// Reads a leading run of digits and dots as a non-negative decimal.
fn take_number(s: &str) -> Option<(f64, &str)> {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (digits, rest) = s.split_at(end);
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<f64>().ok()?;
    Some((value, rest))
}

/// Extracts the identifier from a `DisplayName(Identifier)` folder name.
///
/// The identifier runs from the first `(` to the final `)`.
pub fn parse_student_folder(name: &str) -> Result<String, ParseError> {
    let malformed = || ParseError::MalformedFolderName {
        name: name.to_string(),
    };

    let trimmed = name.trim();
    let inner = trimmed.strip_suffix(')').ok_or_else(malformed)?;
    let open = inner.find('(').ok_or_else(malformed)?;
    let identifier = inner[open + 1..].trim();
    if identifier.is_empty() {
        return Err(malformed());
    }

    Ok(identifier.to_string())
}

/// Extracts the assignment title from the roster's first header line.
///
/// The title becomes a directory name, so it must be a single path component.
pub fn parse_assignment_title(line: &str) -> Result<String, ParseError> {
    let malformed = || ParseError::MalformedTitle {
        line: line.trim_end().to_string(),
    };

    let (_, after_open) = line.split_once('"').ok_or_else(malformed)?;
    let (title, _) = after_open.split_once('"').ok_or_else(malformed)?;

    if title.trim().is_empty() || title == "." || title == ".." || title.contains(['/', '\\']) {
        return Err(malformed());
    }

    Ok(title.to_string())
}
