//! The grading fallback chain.
//!
//! Strategies run in order: exact → token → ast → execution. The first one
//! that matches wins. Strategies that cannot run are recorded and skipped.
//! If nothing matches, the answer is incorrect and attributed to the last
//! strategy that actually ran.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GradingError, VerificationError};
use crate::grading::construct::evaluate_construct;
use crate::grading::exact::{find_exact_match, normalize_answer, normalize_predicted_output};
use crate::grading::verify::{verify_predict_answer, verify_write_answer};
use crate::grading::{FallbackInfo, GradingMethod, GradingResult, SkippedStrategy};
use crate::model::{ExerciseKind, RenderedExercise};
use crate::runtime::{LanguageRuntime, RuntimeRegistry};

/// What to do when execution-based verification cannot produce a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionFailurePolicy {
    /// Return the failure to the caller, who may mark the attempt ungraded.
    #[default]
    Propagate,
    /// Keep the verdict of the weaker strategies and record the fallback.
    FallBack,
}

/// Configuration for the grader.
#[derive(Debug, Clone)]
pub struct GradingConfig {
    /// Execution timeout when the exercise sets none.
    pub execution_timeout: Duration,
    pub on_execution_failure: ExecutionFailurePolicy,
    /// Whether execution-based verification may run at all.
    pub allow_execution: bool,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            execution_timeout: Duration::from_secs(5),
            on_execution_failure: ExecutionFailurePolicy::Propagate,
            allow_execution: true,
        }
    }
}

/// One submission to grade.
pub struct GradeRequest<'a> {
    pub answer: &'a str,
    pub exercise: &'a RenderedExercise,
    /// Runtime for the exercise language, if one is registered.
    pub runtime: Option<&'a dyn LanguageRuntime>,
}

/// Tracks which strategies ran and which were skipped.
#[derive(Default)]
struct Trail {
    last_ran: Option<GradingMethod>,
    skipped: Vec<SkippedStrategy>,
}

impl Trail {
    fn ran(&mut self, method: GradingMethod) {
        self.last_ran = Some(method);
    }

    fn skip(&mut self, method: GradingMethod, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::debug!(%method, %reason, "grading strategy unavailable");
        self.skipped.push(SkippedStrategy { method, reason });
    }

    fn last_ran(&self) -> GradingMethod {
        self.last_ran.unwrap_or(GradingMethod::Exact)
    }

    fn into_fallback(self) -> Option<FallbackInfo> {
        (!self.skipped.is_empty()).then_some(FallbackInfo {
            skipped: self.skipped,
        })
    }
}

/// Runs the fallback chain.
#[derive(Debug, Clone, Default)]
pub struct Grader {
    config: GradingConfig,
}

impl Grader {
    pub fn new(config: GradingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GradingConfig {
        &self.config
    }

    /// Grade using whatever runtime the registry holds for the exercise language.
    pub async fn grade_with_registry(
        &self,
        answer: &str,
        exercise: &RenderedExercise,
        registry: &RuntimeRegistry,
    ) -> Result<GradingResult, GradingError> {
        let runtime: Option<Arc<dyn LanguageRuntime>> = registry.get(exercise.language);
        self.grade(&GradeRequest {
            answer,
            exercise,
            runtime: runtime.as_deref(),
        })
        .await
    }

    /// Grade one submission.
    pub async fn grade(&self, request: &GradeRequest<'_>) -> Result<GradingResult, GradingError> {
        let exercise = request.exercise;
        let mut trail = Trail::default();

        let exact = find_exact_match(
            exercise.kind,
            request.answer,
            &exercise.expected_answer,
            &exercise.accepted_solutions,
        );
        trail.ran(GradingMethod::Exact);
        if exact.matched {
            return Ok(self.finish(request, trail, GradingMethod::Exact, true, exact.alternative));
        }

        let runtime = match request.runtime {
            None => Err(format!("no {} runtime registered", exercise.language)),
            Some(rt) if !rt.is_ready() => Err(format!("{} runtime is not ready", exercise.language)),
            Some(rt) => Ok(rt),
        };

        if exercise.kind != ExerciseKind::Predict {
            match &runtime {
                Ok(rt) => {
                    if let Some(result) = self.compare(*rt, request, &mut trail).await {
                        return Ok(result);
                    }
                }
                Err(reason) => {
                    trail.skip(GradingMethod::Token, reason.clone());
                    trail.skip(GradingMethod::Ast, reason.clone());
                }
            }
        }

        if let Some(true) = self.execute(&runtime, request, &mut trail).await? {
            return Ok(self.finish(request, trail, GradingMethod::Execution, true, None));
        }

        let method = trail.last_ran();
        Ok(self.finish(request, trail, method, false, None))
    }

    /// Token then structural comparison. Returns a result only on a match.
    async fn compare(
        &self,
        runtime: &dyn LanguageRuntime,
        request: &GradeRequest<'_>,
        trail: &mut Trail,
    ) -> Option<GradingResult> {
        let exercise = request.exercise;

        let tokens = runtime
            .compare_by_tokens(
                request.answer,
                &exercise.expected_answer,
                &exercise.accepted_solutions,
            )
            .await;
        trail.ran(GradingMethod::Token);
        if tokens.matched {
            let taken = std::mem::take(trail);
            return Some(self.finish(
                request,
                taken,
                GradingMethod::Token,
                true,
                tokens.matched_alternative,
            ));
        }

        let ast = runtime
            .compare_by_ast(
                request.answer,
                &exercise.expected_answer,
                &exercise.accepted_solutions,
            )
            .await;
        if !ast.infra_available {
            trail.skip(
                GradingMethod::Ast,
                ast.error
                    .unwrap_or_else(|| "structural comparison unavailable".into()),
            );
            return None;
        }
        trail.ran(GradingMethod::Ast);
        if ast.matched {
            let taken = std::mem::take(trail);
            return Some(self.finish(
                request,
                taken,
                GradingMethod::Ast,
                true,
                ast.matched_alternative,
            ));
        }
        None
    }

    /// Execution-based verification, if the exercise supports it.
    ///
    /// `Ok(None)` means execution did not produce a verdict.
    async fn execute(
        &self,
        runtime: &Result<&dyn LanguageRuntime, String>,
        request: &GradeRequest<'_>,
        trail: &mut Trail,
    ) -> Result<Option<bool>, GradingError> {
        let exercise = request.exercise;
        let applicable = match exercise.kind {
            ExerciseKind::Predict => exercise.code.is_some(),
            ExerciseKind::Write | ExerciseKind::FillIn => exercise.verification_template.is_some(),
        };
        if !applicable {
            return Ok(None);
        }
        if !self.config.allow_execution {
            trail.skip(GradingMethod::Execution, "execution disabled");
            return Ok(None);
        }

        // A missing runtime is an absent strategy, not a failed execution.
        let rt = match runtime {
            Ok(rt) => *rt,
            Err(reason) => {
                trail.skip(GradingMethod::Execution, reason.clone());
                return Ok(None);
            }
        };

        let timeout = exercise
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.config.execution_timeout);

        let outcome = match (exercise.kind, exercise.code.as_deref()) {
            (ExerciseKind::Predict, Some(code)) => {
                verify_predict_answer(rt, code, request.answer, timeout).await
            }
            _ => {
                verify_write_answer(
                    rt,
                    request.answer,
                    &exercise.expected_answer,
                    exercise.verification_template.as_deref(),
                    timeout,
                )
                .await
            }
        };

        match outcome {
            Ok(matched) => {
                trail.ran(GradingMethod::Execution);
                Ok(Some(matched))
            }
            Err(VerificationError::LearnerFailed(message)) => {
                tracing::debug!(%message, "learner code failed during verification");
                trail.ran(GradingMethod::Execution);
                Ok(Some(false))
            }
            Err(err) => self.execution_failed(err, trail),
        }
    }

    fn execution_failed(
        &self,
        err: VerificationError,
        trail: &mut Trail,
    ) -> Result<Option<bool>, GradingError> {
        match self.config.on_execution_failure {
            ExecutionFailurePolicy::Propagate => {
                tracing::warn!(error = %err, "execution verification failed");
                Err(GradingError::Verification(err))
            }
            ExecutionFailurePolicy::FallBack => {
                trail.skip(GradingMethod::Execution, err.to_string());
                Ok(None)
            }
        }
    }

    fn finish(
        &self,
        request: &GradeRequest<'_>,
        trail: Trail,
        method: GradingMethod,
        is_correct: bool,
        matched_alternative: Option<String>,
    ) -> GradingResult {
        let exercise = request.exercise;
        let (normalized_user_answer, normalized_expected_answer) = match exercise.kind {
            ExerciseKind::Predict => (
                normalize_predicted_output(request.answer),
                normalize_predicted_output(&exercise.expected_answer),
            ),
            ExerciseKind::Write | ExerciseKind::FillIn => (
                normalize_answer(request.answer),
                normalize_answer(&exercise.expected_answer),
            ),
        };
        let (used_target_construct, coaching_feedback) = evaluate_construct(
            request.answer,
            is_correct,
            exercise.target_construct.as_ref(),
        );
        let fallback = trail.into_fallback();

        tracing::debug!(
            exercise = %exercise.slug,
            %method,
            is_correct,
            fallback = fallback.is_some(),
            "graded submission"
        );

        GradingResult {
            is_correct,
            used_target_construct,
            coaching_feedback,
            grading_method: method,
            normalized_user_answer,
            normalized_expected_answer,
            matched_alternative,
            fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRuntime;
    use crate::model::{Language, TargetConstruct};
    use crate::runtime::{AstCompareResult, ExecutionResult};

    fn write_exercise(expected: &str) -> RenderedExercise {
        RenderedExercise {
            slug: "string-slice".into(),
            title: "Slice a string".into(),
            kind: ExerciseKind::Write,
            language: Language::Python,
            prompt: "Slice word from 1 to 4".into(),
            expected_answer: expected.into(),
            accepted_solutions: Vec::new(),
            verification_template: None,
            code: None,
            target_construct: None,
            timeout_ms: None,
            generated_params: None,
            seed: None,
        }
    }

    fn with_template(mut exercise: RenderedExercise) -> RenderedExercise {
        exercise.verification_template = Some("word = 'python'\nprint({{answer}})".into());
        exercise
    }

    async fn grade(
        grader: &Grader,
        answer: &str,
        exercise: &RenderedExercise,
        runtime: Option<&dyn LanguageRuntime>,
    ) -> Result<GradingResult, GradingError> {
        grader
            .grade(&GradeRequest {
                answer,
                exercise,
                runtime,
            })
            .await
    }

    #[tokio::test]
    async fn exact_match_short_circuits() {
        let runtime = MockRuntime::new(Language::Python);
        let exercise = write_exercise("word[1:4]");
        let result = grade(&Grader::default(), "  word[1:4]\n", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Exact);
        assert_eq!(result.normalized_user_answer, "word[1:4]");
        assert!(result.fallback.is_none());
        assert_eq!(runtime.execute_calls(), 0);
    }

    #[tokio::test]
    async fn token_comparison_ignores_whitespace() {
        let runtime = MockRuntime::new(Language::Python);
        let exercise = write_exercise("word[1:4]");
        let result = grade(&Grader::default(), "word[ 1 : 4 ]", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Token);
    }

    #[tokio::test]
    async fn structural_comparison_ignores_quote_style() {
        let runtime = MockRuntime::new(Language::Python);
        let exercise = write_exercise("d['key']");
        let result = grade(&Grader::default(), "d[\"key\"]", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Ast);
    }

    #[tokio::test]
    async fn missing_runtime_records_fallback() {
        let exercise = write_exercise("word[1:4]");
        let result = grade(&Grader::default(), "word[ 1 : 4 ]", &exercise, None)
            .await
            .unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Exact);
        let fallback = result.fallback.unwrap();
        let methods: Vec<_> = fallback.skipped.iter().map(|s| s.method).collect();
        assert_eq!(methods, vec![GradingMethod::Token, GradingMethod::Ast]);
    }

    #[tokio::test]
    async fn unavailable_ast_is_not_a_mismatch() {
        let runtime = MockRuntime::new(Language::Python).without_ast();
        let exercise = write_exercise("word[1:4]");
        let result = grade(&Grader::default(), "word[0:4]", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Token);
        let fallback = result.fallback.unwrap();
        assert_eq!(fallback.skipped[0].method, GradingMethod::Ast);
    }

    #[tokio::test]
    async fn ast_parse_failure_counts_as_mismatch() {
        let runtime = MockRuntime::new(Language::Python)
            .with_ast_result(AstCompareResult::parse_failure("invalid syntax"));
        let exercise = write_exercise("word[1:4]");
        let result = grade(&Grader::default(), "word[1:4", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Ast);
        assert!(result.fallback.is_none());
    }

    #[tokio::test]
    async fn execution_accepts_equivalent_code() {
        let runtime = MockRuntime::new(Language::Python)
            .with_output("print(word[1:4])", ExecutionResult::ok("yth\n"))
            .with_output("print(word[1:-2])", ExecutionResult::ok("yth\n"));
        let exercise = with_template(write_exercise("word[1:4]"));
        let result = grade(&Grader::default(), "word[1:-2]", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Execution);
        assert_eq!(runtime.execute_calls(), 2);
    }

    #[tokio::test]
    async fn learner_failure_is_incorrect() {
        let runtime = MockRuntime::new(Language::Python)
            .with_output("print(word[1:4])", ExecutionResult::ok("yth\n"))
            .with_default_output(ExecutionResult::failed("NameError: name 'wrd' is not defined"));
        let exercise = with_template(write_exercise("word[1:4]"));
        let result = grade(&Grader::default(), "wrd[1:4]", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Execution);
    }

    #[tokio::test]
    async fn learner_error_mentioning_timeout_is_incorrect() {
        let runtime = MockRuntime::new(Language::Python)
            .with_output("print(word[1:4])", ExecutionResult::ok("yth\n"))
            .with_default_output(ExecutionResult::failed(
                "NameError: name 'timeout' is not defined",
            ));
        let exercise = with_template(write_exercise("word[1:4]"));
        let result = grade(&Grader::default(), "timeout", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Execution);
        assert!(result.fallback.is_none());
    }

    #[tokio::test]
    async fn runtime_enforced_timeout_propagates() {
        let runtime = MockRuntime::new(Language::Python)
            .with_output("print(word[1:4])", ExecutionResult::ok("yth\n"))
            .with_default_output(ExecutionResult::timed_out(Duration::from_millis(300)));
        let exercise = with_template(write_exercise("word[1:4]"));
        let err = grade(&Grader::default(), "slow(word)", &exercise, Some(&runtime))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GradingError::Verification(VerificationError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn timeout_propagates_by_default() {
        let runtime =
            MockRuntime::new(Language::Python).with_execute_delay(Duration::from_secs(5));
        let mut exercise = with_template(write_exercise("word[1:4]"));
        exercise.timeout_ms = Some(20);
        let err = grade(&Grader::default(), "word[1:-2]", &exercise, Some(&runtime))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GradingError::Verification(VerificationError::Timeout { timeout_ms: 20 })
        ));
    }

    #[tokio::test]
    async fn timeout_falls_back_when_configured() {
        let runtime =
            MockRuntime::new(Language::Python).with_execute_delay(Duration::from_secs(5));
        let mut exercise = with_template(write_exercise("word[1:4]"));
        exercise.timeout_ms = Some(20);
        let grader = Grader::new(GradingConfig {
            on_execution_failure: ExecutionFailurePolicy::FallBack,
            ..GradingConfig::default()
        });
        let result = grade(&grader, "word[1:-2]", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Ast);
        let reason = result.fallback.unwrap().reason();
        assert!(reason.starts_with("execution:"), "{reason}");
        assert!(reason.contains("timeout"), "{reason}");
    }

    #[tokio::test]
    async fn disabled_execution_is_skipped() {
        let runtime = MockRuntime::new(Language::Python);
        let exercise = with_template(write_exercise("word[1:4]"));
        let grader = Grader::new(GradingConfig {
            allow_execution: false,
            ..GradingConfig::default()
        });
        let result = grade(&grader, "word[1:-2]", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(!result.is_correct);
        assert_eq!(runtime.execute_calls(), 0);
        assert!(result.fallback.unwrap().reason().contains("execution disabled"));
    }

    #[tokio::test]
    async fn predict_runs_snippet_when_exact_fails() {
        let runtime = MockRuntime::new(Language::Python)
            .with_output("print(len(items))", ExecutionResult::ok("3\n"));
        let mut exercise = write_exercise("three");
        exercise.kind = ExerciseKind::Predict;
        exercise.code = Some("items = [1, 2, 3]\nprint(len(items))".into());

        let result = grade(&Grader::default(), "3\n", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Execution);

        let result = grade(&Grader::default(), "4", &exercise, Some(&runtime))
            .await
            .unwrap();
        assert!(!result.is_correct);
    }

    #[tokio::test]
    async fn predict_without_runtime_stays_exact() {
        let mut exercise = write_exercise("3");
        exercise.kind = ExerciseKind::Predict;
        exercise.code = Some("print(3)".into());
        let result = grade(&Grader::default(), "4", &exercise, None).await.unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.grading_method, GradingMethod::Exact);
        assert_eq!(
            result.fallback.unwrap().skipped[0].method,
            GradingMethod::Execution
        );
    }

    #[tokio::test]
    async fn correct_answer_without_construct_is_coached() {
        let mut exercise = write_exercise("items[0:3]");
        exercise.accepted_solutions = vec!["[items[0], items[1], items[2]]".into()];
        exercise.target_construct = Some(TargetConstruct {
            name: "slice".into(),
            markers: vec![":".into()],
            tip: "Try a slice: items[:3]".into(),
        });

        let result = grade(
            &Grader::default(),
            "[items[0], items[1], items[2]]",
            &exercise,
            None,
        )
        .await
        .unwrap();
        assert!(result.is_correct);
        assert_eq!(result.used_target_construct, Some(false));
        assert_eq!(result.coaching_feedback.as_deref(), Some("Try a slice: items[:3]"));
        assert_eq!(
            result.matched_alternative.as_deref(),
            Some("[items[0], items[1], items[2]]")
        );
    }

    #[tokio::test]
    async fn grade_with_registry_looks_up_language() {
        let registry = RuntimeRegistry::new();
        registry
            .register(Arc::new(MockRuntime::new(Language::Python)))
            .unwrap();
        let exercise = write_exercise("word[1:4]");
        let result = Grader::default()
            .grade_with_registry("word[1 :4]", &exercise, &registry)
            .await
            .unwrap();
        assert_eq!(result.grading_method, GradingMethod::Token);
    }
}
