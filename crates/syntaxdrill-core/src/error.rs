//! Engine error types.
//!
//! Configuration problems (unknown generators, broken templates, duplicate
//! registrations) are fatal and surface immediately. Verification failures
//! are raised by execution-based checking to whoever asked for it, so that a
//! higher-level policy can decide how to degrade.

use thiserror::Error;

use crate::runtime::ExecutionResult;

/// Configuration and contract errors raised by the engine.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// An exercise names a generator that was never registered.
    #[error("unknown generator: {0}")]
    UnknownGenerator(String),

    /// Two generators were registered under the same name.
    #[error("generator already registered: {0}")]
    DuplicateGenerator(String),

    /// A template references a parameter the generator did not produce.
    #[error("template references undefined parameter '{key}'")]
    UndefinedParameter { key: String },

    /// A template has an opening `{{` without a matching `}}`.
    #[error("malformed template: unterminated placeholder at byte {offset}")]
    MalformedTemplate { offset: usize },

    /// `pick` was called on an empty collection.
    #[error("cannot pick from an empty collection")]
    EmptyCollection,

    /// A runtime for this language is already registered.
    #[error("runtime already registered for language: {0}")]
    DuplicateRuntime(String),

    /// A generator produced parameters that its own `validate` rejects.
    #[error("generator '{generator}' produced invalid parameters for seed {seed}")]
    GenerationInconsistency { generator: String, seed: String },
}

impl EngineError {
    /// Returns `true` for errors caused by exercise or registry configuration.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            EngineError::EmptyCollection | EngineError::GenerationInconsistency { .. }
        )
    }
}

/// Failures of execution-based verification.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VerificationError {
    /// The sandboxed call did not finish within the configured timeout.
    #[error("execution timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The reference solution itself failed to run.
    #[error("reference solution failed: {0}")]
    ReferenceFailed(String),

    /// The learner's code raised an error.
    #[error("learner code failed: {0}")]
    LearnerFailed(String),

    /// No ready runtime is available for the exercise language.
    #[error("runtime unavailable: {0}")]
    RuntimeUnavailable(String),
}

impl VerificationError {
    /// Returns `true` if the failure says nothing about the learner's answer.
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, VerificationError::LearnerFailed(_))
    }

    /// Classify a failed execution.
    ///
    /// Only a result flagged `timed_out` by the runtime counts as a timeout;
    /// the message text is never inspected.
    pub fn from_execution(result: &ExecutionResult, timeout_ms: u64, reference: bool) -> Self {
        if result.timed_out {
            return VerificationError::Timeout { timeout_ms };
        }
        let message = result
            .error
            .clone()
            .unwrap_or_else(|| "unknown execution failure".into());
        if reference {
            VerificationError::ReferenceFailed(message)
        } else {
            VerificationError::LearnerFailed(message)
        }
    }
}

/// Errors returned by the grading pipeline to its caller.
#[derive(Debug, Error)]
pub enum GradingError {
    /// Execution-based verification failed and the policy is to propagate.
    #[error("verification failed: {0}")]
    Verification(#[from] VerificationError),

    /// The exercise is misconfigured.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timed_out_result_is_a_timeout() {
        let result = ExecutionResult::timed_out(Duration::from_millis(50));
        let err = VerificationError::from_execution(&result, 50, false);
        assert_eq!(err, VerificationError::Timeout { timeout_ms: 50 });
        assert!(err.is_infrastructure());
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn learner_failure_is_not_infrastructure() {
        let result = ExecutionResult::failed("NameError: name 'x' is not defined");
        let err = VerificationError::from_execution(&result, 50, false);
        assert!(matches!(err, VerificationError::LearnerFailed(_)));
        assert!(!err.is_infrastructure());

        let err = VerificationError::from_execution(&ExecutionResult::failed("SyntaxError"), 50, true);
        assert!(matches!(err, VerificationError::ReferenceFailed(_)));
    }

    #[test]
    fn timeout_in_message_text_is_still_a_learner_failure() {
        for message in [
            "NameError: name 'timeout' is not defined",
            "TimeoutError",
            "Execution timeout after 50ms",
        ] {
            let err = VerificationError::from_execution(&ExecutionResult::failed(message), 50, false);
            assert_eq!(err, VerificationError::LearnerFailed(message.to_string()));
        }
    }

    #[test]
    fn configuration_classification() {
        assert!(EngineError::UnknownGenerator("x".into()).is_configuration());
        assert!(EngineError::UndefinedParameter { key: "k".into() }.is_configuration());
        assert!(!EngineError::EmptyCollection.is_configuration());
    }
}
