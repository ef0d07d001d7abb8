//! Attempt records handed to the persistence layer.

use serde::{Deserialize, Serialize};

use crate::grading::{GradingMethod, GradingResult};
use crate::model::{GeneratorParams, RenderedExercise};

/// Highest quality score the scheduler understands.
pub const MAX_QUALITY_SCORE: u8 = 5;

/// Everything about an attempt that is not part of the verdict.
#[derive(Debug, Clone, Default)]
pub struct AttemptContext {
    pub user_id: String,
    pub exercise_slug: String,
    pub response_time_ms: u64,
    pub hint_used: bool,
    /// Self-reported recall quality, 0..=5.
    pub quality_score: u8,
    pub generated_params: Option<GeneratorParams>,
    pub seed: Option<String>,
}

impl AttemptContext {
    /// Context for an attempt at a rendered exercise, carrying its generation data.
    pub fn for_exercise(user_id: impl Into<String>, exercise: &RenderedExercise) -> Self {
        Self {
            user_id: user_id.into(),
            exercise_slug: exercise.slug.clone(),
            generated_params: exercise.generated_params.clone(),
            seed: exercise.seed.clone(),
            ..Self::default()
        }
    }

    pub fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = ms;
        self
    }

    pub fn with_hint_used(mut self, hint_used: bool) -> Self {
        self.hint_used = hint_used;
        self
    }

    pub fn with_quality(mut self, score: u8) -> Self {
        self.quality_score = score;
        self
    }
}

/// Flat, persistence-ready record of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub user_id: String,
    pub exercise_slug: String,
    pub is_correct: bool,
    pub quality_score: u8,
    pub response_time_ms: u64,
    pub hint_used: bool,
    pub used_target_construct: Option<bool>,
    pub coaching_shown: bool,
    pub grading_method: GradingMethod,
    pub user_answer: String,
    pub matched_alternative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_params: Option<GeneratorParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

pub fn build_attempt_record(context: AttemptContext, result: &GradingResult) -> AttemptRecord {
    AttemptRecord {
        user_id: context.user_id,
        exercise_slug: context.exercise_slug,
        is_correct: result.is_correct,
        quality_score: context.quality_score.min(MAX_QUALITY_SCORE),
        response_time_ms: context.response_time_ms,
        hint_used: context.hint_used,
        used_target_construct: result.used_target_construct,
        coaching_shown: result.coaching_feedback.is_some(),
        grading_method: result.grading_method,
        user_answer: result.normalized_user_answer.clone(),
        matched_alternative: result.matched_alternative.clone(),
        generated_params: context.generated_params,
        seed: context.seed,
    }
}
