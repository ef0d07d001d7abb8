//! The `syntaxdrill grade` command.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use syntaxdrill_core::attempt::{build_attempt_record, AttemptContext, AttemptRecord};
use syntaxdrill_core::grading::Grader;
use syntaxdrill_core::telemetry::{log_telemetry, TelemetryEntry};
use syntaxdrill_core::{
    render_exercise, GeneratorRegistry, GradingResult, LanguageRuntime, RuntimeRegistry,
};
use syntaxdrill_runner::{create_runtime, load_config_from};

use super::{find_exercise, parse_date};

pub struct GradeArgs {
    pub exercises: PathBuf,
    pub slug: String,
    pub user: String,
    pub answer: String,
    pub date: Option<String>,
    pub config: Option<PathBuf>,
    pub response_time_ms: u64,
    pub hint_used: bool,
    pub quality: u8,
}

#[derive(Serialize)]
struct GradeOutput<'a> {
    result: &'a GradingResult,
    attempt: &'a AttemptRecord,
}

pub async fn execute(args: GradeArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let exercise = find_exercise(&args.exercises, &args.slug)?;
    let date = parse_date(args.date.as_deref())?;

    let generators = GeneratorRegistry::with_builtins();
    let rendered = render_exercise(&exercise, &generators, &args.user, date)?;

    let runtimes = RuntimeRegistry::new();
    match create_runtime(rendered.language, &config) {
        Ok(runtime) => {
            if let Err(e) = runtime.initialize().await {
                tracing::warn!("{} runtime unavailable: {e:#}", rendered.language);
            }
            runtimes.register(runtime)?;
        }
        Err(e) => tracing::warn!("{e:#}"),
    }

    let grader = Grader::new(config.grading_config());
    let graded = grader
        .grade_with_registry(&args.answer, &rendered, &runtimes)
        .await;
    runtimes.clear().await;
    let result = graded?;

    log_telemetry(
        &TelemetryEntry::from_grading(&rendered.slug, &args.answer, &result),
        config.environment,
    );

    let context = AttemptContext::for_exercise(&args.user, &rendered)
        .with_response_time(args.response_time_ms)
        .with_hint_used(args.hint_used)
        .with_quality(args.quality);
    let attempt = build_attempt_record(context, &result);

    println!(
        "{}",
        serde_json::to_string_pretty(&GradeOutput {
            result: &result,
            attempt: &attempt,
        })?
    );

    Ok(())
}
