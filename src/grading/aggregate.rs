use crate::grading::format;
use crate::record::{FinalScore, Questions, StudentRecord};

/// Reduces a merged question mapping into totals and a composite comment.
///
/// Questions are visited in lexicographic id order, so the comment block is
/// identical no matter which marker folder was scanned first. Scores are
/// summed as-is; nothing is clamped.
pub fn aggregate(questions: &Questions) -> (FinalScore, String) {
    let mut total = FinalScore::default();
    let mut comment = String::new();

    for (question_id, grade) in questions {
        total.earned += grade.earned;
        total.max += grade.max;

        comment.push_str(&format!(
            "Q{}: {}/{} {}\n",
            question_id,
            format::score(grade.earned),
            format::score(grade.max),
            grade.comment
        ));
    }

    (total, comment)
}

/// Populates `final_score` and `final_comment` from the record's questions.
pub fn finalize(record: &mut StudentRecord) {
    let (score, comment) = aggregate(&record.questions);
    record.final_score = score;
    record.final_comment = comment;
}
