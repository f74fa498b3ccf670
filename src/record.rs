use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Score and comment a marker gave for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionGrade {
    pub earned: f64,
    pub max: f64,
    pub comment: String,
}

impl QuestionGrade {
    pub fn new(earned: f64, max: f64, comment: impl Into<String>) -> Self {
        Self {
            earned,
            max,
            comment: comment.into(),
        }
    }
}

/// Question id to grade. Ordered so iteration is always lexicographic by id.
pub type Questions = BTreeMap<String, QuestionGrade>;

/// Merges `later` into `merged`.
///
/// Conflict policy: for identical question ids the later source replaces the
/// earlier one. Ids present on only one side are kept as-is; nothing is
/// filled in for questions a marker did not write.
pub fn merge_questions(merged: &mut Questions, later: Questions) {
    for (question_id, grade) in later {
        merged.insert(question_id, grade);
    }
}

/// One marker's contribution for one student.
#[derive(Debug, Clone)]
pub struct Submission {
    pub folder_name: String,
    pub questions: Questions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FinalScore {
    pub earned: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StudentRecord {
    pub identifier: String,
    /// Literal on-disk folder name of the last marker folder that graded this student.
    pub folder_name: Option<String>,
    pub questions: Questions,
    pub final_score: FinalScore,
    pub final_comment: String,
}

impl StudentRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    /// Folds a marker's submission into this record.
    ///
    /// Returns the previous folder name when it differs from the submission's,
    /// so callers can surface the disagreement.
    pub fn absorb(&mut self, submission: Submission) -> Option<String> {
        merge_questions(&mut self.questions, submission.questions);
        match self.folder_name.replace(submission.folder_name) {
            Some(previous) if Some(&previous) != self.folder_name.as_ref() => Some(previous),
            _ => None,
        }
    }

    /// A student is submitted once any marker folder matched them.
    pub fn is_submitted(&self) -> bool {
        self.folder_name.is_some()
    }
}

#[derive(Debug, Default)]
pub struct MergeResult {
    /// Every roster identifier, submitted or not.
    pub students: HashMap<String, StudentRecord>,
    /// Roster identifiers with no marker folder, in roster order.
    pub unsubmitted: Vec<String>,
}

impl MergeResult {
    /// Looks up a record only if it was matched by some marker folder.
    pub fn submitted(&self, identifier: &str) -> Option<&StudentRecord> {
        self.students
            .get(identifier)
            .filter(|record| record.is_submitted())
    }
}
