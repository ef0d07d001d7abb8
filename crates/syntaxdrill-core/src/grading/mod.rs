//! Answer grading.
//!
//! Strategies are tried from strictest to loosest: exact string match,
//! token comparison, structural comparison, then execution. Each either
//! resolves or reports itself unavailable, and "could not check" is never
//! folded into "checked and differs".

pub mod construct;
pub mod exact;
pub mod pipeline;
pub mod verify;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use construct::{construct_used, evaluate_construct};
pub use exact::{
    check_fill_in_answer, check_predict_answer, find_exact_match, normalize_answer,
    normalize_output, normalize_predicted_output,
};
pub use pipeline::{ExecutionFailurePolicy, GradeRequest, Grader, GradingConfig};
pub use verify::{execute_code, verify_predict_answer, verify_write_answer};

/// Strategy that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingMethod {
    Exact,
    Token,
    Ast,
    Execution,
}

impl fmt::Display for GradingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingMethod::Exact => write!(f, "exact"),
            GradingMethod::Token => write!(f, "token"),
            GradingMethod::Ast => write!(f, "ast"),
            GradingMethod::Execution => write!(f, "execution"),
        }
    }
}

/// A strategy that was skipped because it could not run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedStrategy {
    pub method: GradingMethod,
    pub reason: String,
}

/// Strategies the pipeline had to skip on the way to a verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackInfo {
    pub skipped: Vec<SkippedStrategy>,
}

impl FallbackInfo {
    /// One line describing every skipped strategy.
    pub fn reason(&self) -> String {
        self.skipped
            .iter()
            .map(|s| format!("{}: {}", s.method, s.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Verdict for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub is_correct: bool,
    /// `None` when the exercise names no target construct.
    pub used_target_construct: Option<bool>,
    pub coaching_feedback: Option<String>,
    pub grading_method: GradingMethod,
    pub normalized_user_answer: String,
    pub normalized_expected_answer: String,
    pub matched_alternative: Option<String>,
    /// Present only if some strategy was unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackInfo>,
}
