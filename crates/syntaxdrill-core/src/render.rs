//! Exercise template rendering.
//!
//! Static exercises pass through unchanged. Generated exercises get a seed
//! for (learner, exercise, day), run their generator, and have every
//! `{{key}}` placeholder substituted from the resulting parameters.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::EngineError;
use crate::generators::GeneratorRegistry;
use crate::model::{Exercise, GeneratorParams, RenderedExercise};
use crate::seed::create_seed;

/// Placeholder left in verification templates for the learner's answer.
pub const ANSWER_SLOT: &str = "answer";

/// Render an exercise for a learner on a calendar day.
pub fn render_exercise(
    exercise: &Exercise,
    registry: &GeneratorRegistry,
    user_id: &str,
    date: NaiveDate,
) -> Result<RenderedExercise, EngineError> {
    let Some(generator_name) = &exercise.generator else {
        return Ok(passthrough(exercise));
    };

    let generator = registry.get(generator_name)?;
    let seed = create_seed(user_id, &exercise.slug, date);
    let params = generator.generate(&seed);

    tracing::debug!(
        exercise = %exercise.slug,
        generator = %generator_name,
        seed = %seed,
        "rendering generated exercise"
    );

    let accepted_solutions = exercise
        .accepted_solutions
        .iter()
        .map(|s| interpolate(s, &params, &[]))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RenderedExercise {
        slug: exercise.slug.clone(),
        title: interpolate(&exercise.title, &params, &[])?,
        kind: exercise.kind,
        language: exercise.language,
        prompt: interpolate(&exercise.prompt, &params, &[])?,
        expected_answer: interpolate(&exercise.expected_answer, &params, &[])?,
        accepted_solutions,
        verification_template: exercise
            .verification_template
            .as_deref()
            .map(|t| interpolate(t, &params, &[ANSWER_SLOT]))
            .transpose()?,
        code: exercise
            .code
            .as_deref()
            .map(|c| interpolate(c, &params, &[]))
            .transpose()?,
        target_construct: exercise.target_construct.clone(),
        timeout_ms: exercise.timeout_ms,
        generated_params: Some(params),
        seed: Some(seed),
    })
}

/// Render using the UTC calendar day of an instant.
pub fn render_exercise_at(
    exercise: &Exercise,
    registry: &GeneratorRegistry,
    user_id: &str,
    instant: DateTime<Utc>,
) -> Result<RenderedExercise, EngineError> {
    render_exercise(exercise, registry, user_id, instant.date_naive())
}

fn passthrough(exercise: &Exercise) -> RenderedExercise {
    RenderedExercise {
        slug: exercise.slug.clone(),
        title: exercise.title.clone(),
        kind: exercise.kind,
        language: exercise.language,
        prompt: exercise.prompt.clone(),
        expected_answer: exercise.expected_answer.clone(),
        accepted_solutions: exercise.accepted_solutions.clone(),
        verification_template: exercise.verification_template.clone(),
        code: exercise.code.clone(),
        target_construct: exercise.target_construct.clone(),
        timeout_ms: exercise.timeout_ms,
        generated_params: None,
        seed: None,
    }
}

/// Substitute every `{{key}}` in `template` from `params`.
///
/// Keys listed in `reserved` are left in place verbatim. Any other key that
/// `params` does not define is a configuration error.
pub fn interpolate(
    template: &str,
    params: &GeneratorParams,
    reserved: &[&str],
) -> Result<String, EngineError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut consumed = 0;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or(EngineError::MalformedTemplate {
                offset: consumed + open,
            })?;
        let key = after_open[..close].trim();

        if reserved.contains(&key) {
            out.push_str(&rest[open..open + 2 + close + 2]);
        } else {
            let value = params
                .get(key)
                .ok_or_else(|| EngineError::UndefinedParameter {
                    key: key.to_string(),
                })?;
            out.push_str(&value.to_string());
        }

        let advance = open + 2 + close + 2;
        consumed += advance;
        rest = &rest[advance..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Placeholder keys referenced by a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        keys.push(after_open[..close].trim().to_string());
        rest = &after_open[close + 2..];
    }
    keys
}
