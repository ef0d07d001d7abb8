//! Runner configuration and runtime factory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use syntaxdrill_core::grading::{ExecutionFailurePolicy, GradingConfig};
use syntaxdrill_core::model::Language;
use syntaxdrill_core::runtime::LanguageRuntime;
use syntaxdrill_core::telemetry::Environment;

use crate::executor::DEFAULT_MAX_OUTPUT_BYTES;
use crate::PythonRuntime;

/// Top-level syntaxdrill configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Python interpreter to run answers with.
    #[serde(default = "default_python_path")]
    pub python_path: PathBuf,
    /// Execution timeout when an exercise sets none.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// Whether structural comparison is offered.
    #[serde(default = "default_true")]
    pub structural_compare: bool,
    /// Whether execution-based verification may run.
    #[serde(default = "default_true")]
    pub allow_execution: bool,
    /// What to do when execution cannot produce a verdict.
    #[serde(default)]
    pub on_execution_failure: ExecutionFailurePolicy,
    /// Cap on captured standard output.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Deployment environment; telemetry is only logged in development.
    #[serde(default)]
    pub environment: Environment,
    /// Extra variables set for every sandboxed process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_python_path() -> PathBuf {
    PathBuf::from("python3")
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_true() -> bool {
    true
}
fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            python_path: default_python_path(),
            default_timeout_ms: default_timeout_ms(),
            structural_compare: true,
            allow_execution: true,
            on_execution_failure: ExecutionFailurePolicy::default(),
            max_output_bytes: default_max_output_bytes(),
            environment: Environment::default(),
            env: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Grader settings derived from this configuration.
    pub fn grading_config(&self) -> GradingConfig {
        GradingConfig {
            execution_timeout: self.default_timeout(),
            on_execution_failure: self.on_execution_failure,
            allow_execution: self.allow_execution,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `syntaxdrill.toml` in the current directory
/// 2. `~/.config/syntaxdrill/config.toml`
///
/// Environment variable override: `SYNTAXDRILL_PYTHON`.
pub fn load_config() -> Result<RunnerConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<RunnerConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("syntaxdrill.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => RunnerConfig::default(),
    };

    if let Ok(python) = std::env::var("SYNTAXDRILL_PYTHON") {
        if !python.is_empty() {
            config.python_path = PathBuf::from(python);
        }
    }

    Ok(config)
}

/// Parse a config file body, expanding `${VAR}` in path and env values.
pub fn parse_config(content: &str) -> Result<RunnerConfig> {
    let mut config: RunnerConfig = toml::from_str(content)?;
    config.python_path = PathBuf::from(resolve_env_vars(&config.python_path.to_string_lossy()));
    for value in config.env.values_mut() {
        *value = resolve_env_vars(value);
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("syntaxdrill"))
}

/// Create an uninitialized runtime for a language.
pub fn create_runtime(
    language: Language,
    config: &RunnerConfig,
) -> Result<Arc<dyn LanguageRuntime>> {
    match language {
        Language::Python => Ok(Arc::new(PythonRuntime::new(config.clone()))),
        other => anyhow::bail!("no runtime available for {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_SYNTAXDRILL_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_SYNTAXDRILL_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_SYNTAXDRILL_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no_close_${"), "no_close_${");
        std::env::remove_var("_SYNTAXDRILL_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.python_path, PathBuf::from("python3"));
        assert_eq!(config.default_timeout(), Duration::from_secs(5));
        assert!(config.structural_compare);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(
            config.grading_config().on_execution_failure,
            ExecutionFailurePolicy::Propagate
        );
    }

    #[test]
    fn parse_full_config() {
        std::env::set_var("_SYNTAXDRILL_TEST_VENV", "/opt/venv");
        let config = parse_config(
            r#"
python_path = "${_SYNTAXDRILL_TEST_VENV}/bin/python"
default_timeout_ms = 2000
structural_compare = false
on_execution_failure = "fallback"
environment = "production"

[env]
DRILL_DATA = "${_SYNTAXDRILL_TEST_VENV}/data"
"#,
        )
        .unwrap();
        std::env::remove_var("_SYNTAXDRILL_TEST_VENV");

        assert_eq!(config.python_path, PathBuf::from("/opt/venv/bin/python"));
        assert_eq!(config.default_timeout_ms, 2000);
        assert!(!config.structural_compare);
        assert_eq!(config.on_execution_failure, ExecutionFailurePolicy::FallBack);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.env["DRILL_DATA"], "/opt/venv/data");
    }

    #[test]
    fn empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.default_timeout_ms, 5000);
        assert!(config.allow_execution);
    }

    #[test]
    fn explicit_missing_path_errors() {
        let err = load_config_from(Some(Path::new("/nonexistent/syntaxdrill.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syntaxdrill.toml");
        std::fs::write(&path, "default_timeout_ms = 750\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_timeout_ms, 750);
    }

    #[test]
    fn only_python_has_a_runtime() {
        let config = RunnerConfig::default();
        let runtime = create_runtime(Language::Python, &config).unwrap();
        assert_eq!(runtime.language(), Language::Python);
        assert!(!runtime.is_ready());
        assert!(create_runtime(Language::Rust, &config).is_err());
    }
}
