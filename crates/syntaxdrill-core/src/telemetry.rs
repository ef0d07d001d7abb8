//! Grading telemetry.
//!
//! A debugging aid: entries are only logged in development, and the learner's
//! answer is stored as a hash, never as plaintext.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::grading::{GradingMethod, GradingResult};

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Inputs for one telemetry entry.
#[derive(Debug, Clone)]
pub struct TelemetryInput<'a> {
    pub exercise_slug: &'a str,
    pub strategy: GradingMethod,
    pub is_correct: bool,
    pub fallback_used: bool,
    pub fallback_reason: Option<String>,
    /// Raw answer; hashed before it reaches the entry.
    pub user_answer: &'a str,
}

/// What gets logged about one graded submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEntry {
    pub exercise_slug: String,
    pub strategy: GradingMethod,
    pub is_correct: bool,
    pub fallback_used: bool,
    pub fallback_reason: Option<String>,
    pub user_answer_hash: String,
}

impl TelemetryEntry {
    /// Build an entry straight from a grading result.
    pub fn from_grading(exercise_slug: &str, user_answer: &str, result: &GradingResult) -> Self {
        create_telemetry_entry(TelemetryInput {
            exercise_slug,
            strategy: result.grading_method,
            is_correct: result.is_correct,
            fallback_used: result.fallback.is_some(),
            fallback_reason: result.fallback.as_ref().map(|f| f.reason()),
            user_answer,
        })
    }
}

/// Lowercase hex SHA-256 of the answer.
pub fn hash_answer(answer: &str) -> String {
    format!("{:x}", Sha256::digest(answer.as_bytes()))
}

pub fn create_telemetry_entry(input: TelemetryInput<'_>) -> TelemetryEntry {
    TelemetryEntry {
        exercise_slug: input.exercise_slug.to_string(),
        strategy: input.strategy,
        is_correct: input.is_correct,
        fallback_used: input.fallback_used,
        fallback_reason: input.fallback_reason,
        user_answer_hash: hash_answer(input.user_answer),
    }
}

/// Emit the entry as a debug event. No-op outside development.
pub fn log_telemetry(entry: &TelemetryEntry, environment: Environment) {
    if environment != Environment::Development {
        return;
    }
    tracing::debug!(
        target: "syntaxdrill::telemetry",
        exercise = %entry.exercise_slug,
        strategy = %entry.strategy,
        is_correct = entry.is_correct,
        fallback_used = entry.fallback_used,
        fallback_reason = entry.fallback_reason.as_deref().unwrap_or(""),
        answer_hash = %entry.user_answer_hash,
        "grading telemetry"
    );
}
