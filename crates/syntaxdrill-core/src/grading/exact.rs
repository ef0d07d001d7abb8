//! Exact, normalized string matching.
//!
//! Comparison is case-sensitive: the target language is.

use crate::model::ExerciseKind;

/// Trim surrounding whitespace.
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_string()
}

/// Normalize a predicted output: unify line endings, drop trailing newlines
/// and surrounding whitespace.
pub fn normalize_predicted_output(answer: &str) -> String {
    answer
        .replace("\r\n", "\n")
        .trim_end_matches('\n')
        .trim()
        .to_string()
}

/// Normalize captured program output for comparison: per-line trailing
/// whitespace removed, blank lines at either end dropped.
pub fn normalize_output(output: &str) -> String {
    output
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn normalize_for(kind: ExerciseKind, text: &str) -> String {
    match kind {
        ExerciseKind::Predict => normalize_predicted_output(text),
        ExerciseKind::Write | ExerciseKind::FillIn => normalize_answer(text),
    }
}

/// Outcome of exact matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactMatch {
    pub matched: bool,
    /// The accepted alternative that matched, if not the expected answer.
    pub alternative: Option<String>,
}

/// Match against the expected answer, then each accepted alternative.
pub fn find_exact_match(
    kind: ExerciseKind,
    user_answer: &str,
    expected: &str,
    accepted: &[String],
) -> ExactMatch {
    let user = normalize_for(kind, user_answer);
    if user == normalize_for(kind, expected) {
        return ExactMatch {
            matched: true,
            alternative: None,
        };
    }
    let alternative = accepted
        .iter()
        .find(|alt| normalize_for(kind, alt) == user)
        .cloned();
    ExactMatch {
        matched: alternative.is_some(),
        alternative,
    }
}

/// Check a predicted output.
pub fn check_predict_answer(user_answer: &str, expected: &str, accepted: &[String]) -> bool {
    find_exact_match(ExerciseKind::Predict, user_answer, expected, accepted).matched
}

/// Check a fill-in-the-blank answer.
pub fn check_fill_in_answer(user_answer: &str, expected: &str, accepted: &[String]) -> bool {
    find_exact_match(ExerciseKind::FillIn, user_answer, expected, accepted).matched
}
