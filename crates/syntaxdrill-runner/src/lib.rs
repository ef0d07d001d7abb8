//! syntaxdrill-runner: Sandboxed Python runtime.
//!
//! Runs learner answers with a local Python interpreter in throwaway
//! directories, and provides the tokenizer and structural comparison the
//! grading pipeline uses for Python exercises.

pub mod config;
pub mod executor;
pub mod sandbox;
pub mod structure;
pub mod tokenizer;

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use syntaxdrill_core::model::Language;
use syntaxdrill_core::runtime::{
    AstCompareResult, ExecuteOptions, ExecutionResult, LanguageRuntime, Token,
};

pub use config::{create_runtime, load_config, load_config_from, RunnerConfig};

/// How long `initialize` waits for `python --version`.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Python runtime backed by a local interpreter.
///
/// Tokenization and structural comparison work without an interpreter; only
/// execution needs [`LanguageRuntime::initialize`] to have succeeded.
pub struct PythonRuntime {
    config: RunnerConfig,
    ready: AtomicBool,
    version: Mutex<Option<String>>,
    /// One sandboxed process at a time.
    exec_lock: tokio::sync::Mutex<()>,
}

impl PythonRuntime {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            ready: AtomicBool::new(false),
            version: Mutex::new(None),
            exec_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Interpreter version reported during `initialize`.
    pub fn version(&self) -> Option<String> {
        self.version
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn probe(&self) -> Result<String> {
        let python = &self.config.python_path;
        let mut cmd = Command::new(python);
        cmd.arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(PROBE_TIMEOUT, cmd.output())
            .await
            .context("python version probe timed out")?
            .with_context(|| format!("failed to run {}", python.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} --version exited with {}",
                python.display(),
                output.status
            );
        }

        // Python 2 printed its version to stderr.
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).trim().to_string()
        } else {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        };
        if !text.starts_with("Python 3") {
            anyhow::bail!("unsupported interpreter: {text}");
        }
        Ok(text)
    }
}

#[async_trait]
impl LanguageRuntime for PythonRuntime {
    fn language(&self) -> Language {
        Language::Python
    }

    async fn initialize(&self) -> Result<()> {
        let version = self.probe().await?;
        tracing::info!(
            python = %self.config.python_path.display(),
            %version,
            "python runtime ready"
        );
        *self.version.lock().unwrap_or_else(PoisonError::into_inner) = Some(version);
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn execute(&self, code: &str, options: &ExecuteOptions) -> ExecutionResult {
        if !self.is_ready() {
            return ExecutionResult::failed("python runtime is not ready");
        }

        let _guard = self.exec_lock.lock().await;
        let timeout = options.timeout.unwrap_or(self.config.default_timeout());

        let sandbox = match sandbox::Sandbox::new(timeout) {
            Ok(sandbox) => sandbox.with_env(&self.config.env),
            Err(e) => return ExecutionResult::failed(format!("{e:#}")),
        };
        if let Err(e) = sandbox.write_script(code) {
            return ExecutionResult::failed(format!("{e:#}"));
        }

        match executor::run_script(
            &self.config.python_path,
            &sandbox,
            options.stdin.as_deref(),
            self.config.max_output_bytes,
        )
        .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("python execution failed to start: {e:#}");
                ExecutionResult::failed(format!("{e:#}"))
            }
        }
    }

    async fn tokenize(&self, code: &str) -> Option<Vec<Token>> {
        tokenizer::tokenize(code)
    }

    async fn compare_by_ast(
        &self,
        user_code: &str,
        expected: &str,
        alternatives: &[String],
    ) -> AstCompareResult {
        if !self.config.structural_compare {
            return AstCompareResult::unavailable("structural comparison disabled");
        }
        structure::compare_structure(user_code, expected, alternatives)
    }

    async fn terminate(&self) {
        // Waits for an in-flight execution to finish.
        let _guard = self.exec_lock.lock().await;
        self.ready.store(false, Ordering::SeqCst);
        tracing::debug!("python runtime terminated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(config: RunnerConfig) -> PythonRuntime {
        PythonRuntime::new(config)
    }

    #[tokio::test]
    async fn execute_before_initialize_fails() {
        let rt = runtime(RunnerConfig::default());
        let result = rt.execute("print(1)", &ExecuteOptions::default()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not ready"));
    }

    #[tokio::test]
    async fn initialize_with_missing_interpreter_fails() {
        let rt = runtime(RunnerConfig {
            python_path: "/nonexistent/python-for-syntaxdrill".into(),
            ..RunnerConfig::default()
        });
        assert!(rt.initialize().await.is_err());
        assert!(!rt.is_ready());
        assert!(rt.version().is_none());
    }

    #[tokio::test]
    async fn comparison_works_without_interpreter() {
        let rt = runtime(RunnerConfig::default());
        assert!(rt.compare_by_tokens("word[ 1:4 ]", "word[1:4]", &[]).await.matched);
        assert!(rt.compare_by_ast("(word[1:4])", "word[1:4]", &[]).await.matched);
        assert!(!rt.compare_by_tokens("'abc", "'abc'", &[]).await.matched);
    }

    #[tokio::test]
    async fn disabled_structure_is_unavailable() {
        let rt = runtime(RunnerConfig {
            structural_compare: false,
            ..RunnerConfig::default()
        });
        let result = rt.compare_by_ast("a", "a", &[]).await;
        assert!(!result.infra_available);
        assert!(!result.matched);
    }
}
