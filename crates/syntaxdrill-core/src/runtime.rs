//! Runtime contract for sandboxed language interpreters.
//!
//! The engine never talks to an interpreter directly. Each language gets one
//! [`LanguageRuntime`] in a [`RuntimeRegistry`], and the grading pipeline
//! goes through that interface for tokenizing, structural comparison and
//! execution. Implemented by `syntaxdrill-runner`.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::Language;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Outcome of running code in the sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Captured standard output; `None` on failure.
    pub output: Option<String>,
    /// Failure description; `None` on success.
    pub error: Option<String>,
    /// Set only when the run was cut off by its time limit.
    #[serde(default)]
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
            timed_out: false,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            timed_out: false,
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            timed_out: true,
            ..Self::failed(format!("Execution timeout after {}ms", timeout.as_millis()))
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }
}

/// Options for a single execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Hard limit the runtime should enforce itself.
    pub timeout: Option<Duration>,
    /// Data fed to standard input.
    pub stdin: Option<String>,
}

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Name,
    Number,
    String,
    Operator,
    Comment,
    Newline,
    Whitespace,
    Unknown,
}

impl TokenKind {
    /// Tokens that never affect comparison.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Comment | TokenKind::Newline | TokenKind::Whitespace
        )
    }
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Result of token-stream comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenCompareResult {
    #[serde(rename = "match")]
    pub matched: bool,
    /// Which accepted alternative matched, if not the expected answer.
    pub matched_alternative: Option<String>,
}

impl TokenCompareResult {
    pub fn no_match() -> Self {
        Self::default()
    }
}

/// Result of structural comparison.
///
/// `infra_available == false` means the comparison never ran; `matched` is
/// meaningless in that case and must not be read as a mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstCompareResult {
    #[serde(rename = "match")]
    pub matched: bool,
    pub matched_alternative: Option<String>,
    pub infra_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AstCompareResult {
    pub fn matched(alternative: Option<String>) -> Self {
        Self {
            matched: true,
            matched_alternative: alternative,
            infra_available: true,
            error: None,
        }
    }

    pub fn mismatch() -> Self {
        Self {
            matched: false,
            matched_alternative: None,
            infra_available: true,
            error: None,
        }
    }

    /// The comparison ran but an input could not be parsed.
    pub fn parse_failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::mismatch()
        }
    }

    /// The comparison could not run at all.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            matched: false,
            matched_alternative: None,
            infra_available: false,
            error: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime trait
// ---------------------------------------------------------------------------

/// A sandboxed interpreter for one language.
#[async_trait]
pub trait LanguageRuntime: Send + Sync {
    /// The language this runtime serves.
    fn language(&self) -> Language;

    /// Prepare the runtime (load the interpreter, probe binaries).
    async fn initialize(&self) -> anyhow::Result<()>;

    /// Whether `initialize` has completed successfully.
    fn is_ready(&self) -> bool;

    /// Run code and capture its standard output.
    async fn execute(&self, code: &str, options: &ExecuteOptions) -> ExecutionResult;

    /// Lex code into tokens, or `None` if it cannot be tokenized.
    async fn tokenize(&self, code: &str) -> Option<Vec<Token>>;

    /// Compare ignoring whitespace and comments.
    ///
    /// Tokenizer failures resolve as no match rather than an error.
    async fn compare_by_tokens(
        &self,
        user_code: &str,
        expected: &str,
        alternatives: &[String],
    ) -> TokenCompareResult {
        let Some(user) = self.tokenize(user_code).await else {
            return TokenCompareResult::no_match();
        };
        let user = significant_tokens(&user);

        if let Some(expected_tokens) = self.tokenize(expected).await {
            if significant_tokens(&expected_tokens) == user {
                return TokenCompareResult {
                    matched: true,
                    matched_alternative: None,
                };
            }
        }

        for alternative in alternatives {
            if let Some(alt_tokens) = self.tokenize(alternative).await {
                if significant_tokens(&alt_tokens) == user {
                    return TokenCompareResult {
                        matched: true,
                        matched_alternative: Some(alternative.clone()),
                    };
                }
            }
        }

        TokenCompareResult::no_match()
    }

    /// Compare at a coarser structural level.
    async fn compare_by_ast(
        &self,
        user_code: &str,
        expected: &str,
        alternatives: &[String],
    ) -> AstCompareResult;

    /// Release interpreter resources.
    async fn terminate(&self);
}

/// Tokens that take part in comparison.
pub fn significant_tokens(tokens: &[Token]) -> Vec<&Token> {
    tokens.iter().filter(|t| !t.kind.is_trivia()).collect()
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Language-keyed collection of runtimes.
#[derive(Default)]
pub struct RuntimeRegistry {
    runtimes: RwLock<HashMap<Language, Arc<dyn LanguageRuntime>>>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static RuntimeRegistry {
        static GLOBAL: OnceLock<RuntimeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(RuntimeRegistry::new)
    }

    /// Register a runtime under its language. Duplicates are rejected.
    pub fn register(&self, runtime: Arc<dyn LanguageRuntime>) -> Result<(), EngineError> {
        let language = runtime.language();
        let mut runtimes = self.runtimes.write().unwrap_or_else(PoisonError::into_inner);
        if runtimes.contains_key(&language) {
            return Err(EngineError::DuplicateRuntime(language.to_string()));
        }
        tracing::debug!(%language, "registered runtime");
        runtimes.insert(language, runtime);
        Ok(())
    }

    pub fn get(&self, language: Language) -> Option<Arc<dyn LanguageRuntime>> {
        self.runtimes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&language)
            .cloned()
    }

    pub fn has(&self, language: Language) -> bool {
        self.runtimes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&language)
    }

    pub fn languages(&self) -> Vec<Language> {
        self.runtimes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Remove and terminate every registered runtime.
    pub async fn clear(&self) {
        let drained: Vec<Arc<dyn LanguageRuntime>> = {
            let mut runtimes = self.runtimes.write().unwrap_or_else(PoisonError::into_inner);
            runtimes.drain().map(|(_, runtime)| runtime).collect()
        };
        for runtime in drained {
            tracing::debug!(language = %runtime.language(), "terminating runtime");
            runtime.terminate().await;
        }
    }
}
