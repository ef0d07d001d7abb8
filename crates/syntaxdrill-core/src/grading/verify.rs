//! Execution-based verification.
//!
//! Unlike token and structural comparison, infrastructure failures here are
//! returned to the caller instead of being graded as wrong answers.

use std::time::Duration;

use crate::error::VerificationError;
use crate::grading::exact::{normalize_output, normalize_predicted_output};
use crate::model::GeneratorParams;
use crate::render::{interpolate, ANSWER_SLOT};
use crate::runtime::{ExecuteOptions, ExecutionResult, LanguageRuntime};

/// Run code with a hard timeout.
///
/// On expiry the call resolves with a failed result flagged `timed_out`.
/// Cancellation is advisory: the runtime may keep working in the
/// background, but its result is discarded.
pub async fn execute_code(
    runtime: &dyn LanguageRuntime,
    code: &str,
    timeout: Duration,
) -> ExecutionResult {
    if !runtime.is_ready() {
        return ExecutionResult::failed(format!("{} runtime is not ready", runtime.language()));
    }

    let options = ExecuteOptions {
        timeout: Some(timeout),
        stdin: None,
    };

    match tokio::time::timeout(timeout, runtime.execute(code, &options)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "execution timed out");
            ExecutionResult::timed_out(timeout)
        }
    }
}

async fn run_for_output(
    runtime: &dyn LanguageRuntime,
    code: &str,
    timeout: Duration,
    reference: bool,
) -> Result<String, VerificationError> {
    let result = execute_code(runtime, code, timeout).await;
    if result.success {
        return Ok(normalize_output(result.output.as_deref().unwrap_or_default()));
    }
    Err(VerificationError::from_execution(
        &result,
        timeout.as_millis() as u64,
        reference,
    ))
}

fn ensure_ready(runtime: &dyn LanguageRuntime) -> Result<(), VerificationError> {
    if runtime.is_ready() {
        Ok(())
    } else {
        Err(VerificationError::RuntimeUnavailable(format!(
            "{} runtime is not ready",
            runtime.language()
        )))
    }
}

/// Run a predict exercise's snippet and compare its output to the prediction.
pub async fn verify_predict_answer(
    runtime: &dyn LanguageRuntime,
    code: &str,
    user_prediction: &str,
    timeout: Duration,
) -> Result<bool, VerificationError> {
    ensure_ready(runtime)?;
    let actual = run_for_output(runtime, code, timeout, true).await?;
    Ok(actual == normalize_output(&normalize_predicted_output(user_prediction)))
}

/// Substitute `code` into the verification template's answer slot.
pub fn wrap_in_template(template: Option<&str>, code: &str) -> Result<String, VerificationError> {
    match template {
        None => Ok(code.to_string()),
        Some(template) => {
            let params = GeneratorParams::new().with(ANSWER_SLOT, code);
            interpolate(template, &params, &[])
                .map_err(|e| VerificationError::ReferenceFailed(e.to_string()))
        }
    }
}

/// Run the learner's code and the reference through the same template and
/// compare their outputs.
pub async fn verify_write_answer(
    runtime: &dyn LanguageRuntime,
    user_code: &str,
    expected_code: &str,
    verification_template: Option<&str>,
    timeout: Duration,
) -> Result<bool, VerificationError> {
    ensure_ready(runtime)?;

    let reference = wrap_in_template(verification_template, expected_code.trim())?;
    let expected_output = run_for_output(runtime, &reference, timeout, true).await?;

    let submission = wrap_in_template(verification_template, user_code.trim())?;
    let actual_output = run_for_output(runtime, &submission, timeout, false).await?;

    tracing::debug!(
        matched = expected_output == actual_output,
        "compared execution output"
    );
    Ok(expected_output == actual_output)
}
