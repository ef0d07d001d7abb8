//! Mock runtime for testing the grading pipeline without an interpreter.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::model::Language;
use crate::runtime::{
    significant_tokens, AstCompareResult, ExecuteOptions, ExecutionResult, LanguageRuntime, Token,
    TokenKind,
};

/// A scriptable [`LanguageRuntime`].
///
/// Execution results are chosen by the first configured code fragment the
/// submitted code contains. Tokenization is a small Python-flavoured lexer.
pub struct MockRuntime {
    language: Language,
    ready: AtomicBool,
    terminated: AtomicBool,
    /// Code fragment → execution result, checked in insertion order.
    outputs: Vec<(String, ExecutionResult)>,
    /// Result when no fragment matches.
    default_output: ExecutionResult,
    execute_delay: Option<Duration>,
    ast_available: bool,
    ast_override: Option<AstCompareResult>,
    failing_tokenizer: bool,
    execute_calls: AtomicU32,
    last_code: Mutex<Option<String>>,
}

impl MockRuntime {
    /// A ready mock that prints nothing.
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ready: AtomicBool::new(true),
            terminated: AtomicBool::new(false),
            outputs: Vec::new(),
            default_output: ExecutionResult::ok(""),
            execute_delay: None,
            ast_available: true,
            ast_override: None,
            failing_tokenizer: false,
            execute_calls: AtomicU32::new(0),
            last_code: Mutex::new(None),
        }
    }

    /// Start un-initialized.
    pub fn not_ready(self) -> Self {
        self.ready.store(false, Ordering::SeqCst);
        self
    }

    /// Return `result` for any code containing `fragment`.
    pub fn with_output(mut self, fragment: &str, result: ExecutionResult) -> Self {
        self.outputs.push((fragment.to_string(), result));
        self
    }

    pub fn with_default_output(mut self, result: ExecutionResult) -> Self {
        self.default_output = result;
        self
    }

    /// Sleep before every execution.
    pub fn with_execute_delay(mut self, delay: Duration) -> Self {
        self.execute_delay = Some(delay);
        self
    }

    /// Report structural comparison as unavailable.
    pub fn without_ast(mut self) -> Self {
        self.ast_available = false;
        self
    }

    /// Always return this structural comparison result.
    pub fn with_ast_result(mut self, result: AstCompareResult) -> Self {
        self.ast_override = Some(result);
        self
    }

    /// Make every tokenize call fail.
    pub fn with_failing_tokenizer(mut self) -> Self {
        self.failing_tokenizer = true;
        self
    }

    pub fn execute_calls(&self) -> u32 {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn last_code(&self) -> Option<String> {
        self.last_code
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    fn structural_key(&self, code: &str) -> Option<Vec<(TokenKind, String)>> {
        let tokens = lex(code)?;
        Some(
            significant_tokens(&tokens)
                .into_iter()
                .map(|t| match t.kind {
                    TokenKind::String => (t.kind, t.text.trim_matches(['\'', '"']).to_string()),
                    _ => (t.kind, t.text.clone()),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl LanguageRuntime for MockRuntime {
    fn language(&self) -> Language {
        self.language
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        self.ready.store(true, Ordering::SeqCst);
        self.terminated.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn execute(&self, code: &str, _options: &ExecuteOptions) -> ExecutionResult {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_code
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(code.to_string());

        if let Some(delay) = self.execute_delay {
            tokio::time::sleep(delay).await;
        }

        self.outputs
            .iter()
            .find(|(fragment, _)| code.contains(fragment.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| self.default_output.clone())
    }

    async fn tokenize(&self, code: &str) -> Option<Vec<Token>> {
        if self.failing_tokenizer {
            return None;
        }
        lex(code)
    }

    async fn compare_by_ast(
        &self,
        user_code: &str,
        expected: &str,
        alternatives: &[String],
    ) -> AstCompareResult {
        if !self.ast_available {
            return AstCompareResult::unavailable("structural comparison not available");
        }
        if let Some(result) = &self.ast_override {
            return result.clone();
        }

        let Some(user) = self.structural_key(user_code) else {
            return AstCompareResult::parse_failure("could not tokenize answer");
        };
        if self.structural_key(expected).as_ref() == Some(&user) {
            return AstCompareResult::matched(None);
        }
        for alternative in alternatives {
            if self.structural_key(alternative).as_ref() == Some(&user) {
                return AstCompareResult::matched(Some(alternative.clone()));
            }
        }
        AstCompareResult::mismatch()
    }

    async fn terminate(&self) {
        self.ready.store(false, Ordering::SeqCst);
        self.terminated.store(true, Ordering::SeqCst);
    }
}

const TWO_CHAR_OPS: &[&str] = &["==", "!=", "<=", ">=", "**", "//", "+=", "-=", "->"];

/// Minimal lexer: names, numbers, quoted strings, comments, operators.
fn lex(code: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = code.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let kind = if c == '\n' {
            i += 1;
            TokenKind::Newline
        } else if c.is_whitespace() {
            while i < chars.len() && chars[i].is_whitespace() && chars[i] != '\n' {
                i += 1;
            }
            TokenKind::Whitespace
        } else if c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            TokenKind::Comment
        } else if c.is_ascii_digit() {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            TokenKind::Number
        } else if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            TokenKind::Name
        } else if c == '\'' || c == '"' {
            i += 1;
            while i < chars.len() && chars[i] != c {
                i += 1;
            }
            if i == chars.len() {
                return None;
            }
            i += 1;
            TokenKind::String
        } else {
            let pair: String = chars[i..chars.len().min(i + 2)].iter().collect();
            i += if TWO_CHAR_OPS.contains(&pair.as_str()) { 2 } else { 1 };
            TokenKind::Operator
        };
        tokens.push(Token::new(kind, chars[start..i].iter().collect::<String>()));
    }

    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_splits_operators_and_comments() {
        let tokens = lex("x **= 2  # square").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Name,
                TokenKind::Whitespace,
                TokenKind::Operator,
                TokenKind::Operator,
                TokenKind::Whitespace,
                TokenKind::Number,
                TokenKind::Whitespace,
                TokenKind::Comment,
            ]
        );
        assert!(lex("'unterminated").is_none());
    }

    #[tokio::test]
    async fn fragment_matching_and_call_count() {
        let runtime = MockRuntime::new(Language::Python)
            .with_output("print(1)", ExecutionResult::ok("1\n"))
            .with_default_output(ExecutionResult::failed("NameError"));

        let hit = runtime.execute("print(1)", &ExecuteOptions::default()).await;
        assert_eq!(hit.output.as_deref(), Some("1\n"));
        let miss = runtime.execute("print(y)", &ExecuteOptions::default()).await;
        assert!(!miss.success);
        assert_eq!(runtime.execute_calls(), 2);
        assert_eq!(runtime.last_code().as_deref(), Some("print(y)"));
    }

    #[tokio::test]
    async fn lifecycle() {
        let runtime = MockRuntime::new(Language::Python).not_ready();
        assert!(!runtime.is_ready());
        runtime.initialize().await.unwrap();
        assert!(runtime.is_ready());
        runtime.terminate().await;
        assert!(!runtime.is_ready());
        assert!(runtime.is_terminated());
    }

    #[tokio::test]
    async fn structural_compare_ignores_quote_style() {
        let runtime = MockRuntime::new(Language::Python);
        assert!(runtime.compare_by_ast("print('hi')", "print(\"hi\")", &[]).await.matched);
        assert!(!runtime.compare_by_ast("items[:3]", "items[0:3]", &[]).await.matched);
        let unavailable = MockRuntime::new(Language::Python).without_ast();
        assert!(!unavailable.compare_by_ast("a", "a", &[]).await.infra_available);
    }
}
