//! Scratch directory for running one Python script.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;

/// File name the learner's code is written to.
pub const SCRIPT_NAME: &str = "script.py";

/// Variables passed through from the parent environment.
const PASSTHROUGH_VARS: &[&str] = &["PATH", "LANG", "LC_ALL", "SYSTEMROOT", "TZ"];

/// A temporary directory holding a script to execute.
///
/// On drop, the temporary directory is automatically cleaned up.
pub struct Sandbox {
    work_dir: TempDir,
    timeout: Duration,
    /// Extra variables set for the child process.
    extra_env: BTreeMap<String, String>,
}

impl Sandbox {
    pub fn new(timeout: Duration) -> Result<Self> {
        let work_dir = tempfile::Builder::new()
            .prefix("syntaxdrill-")
            .tempdir()
            .context("failed to create temp directory")?;

        Ok(Self {
            work_dir,
            timeout,
            extra_env: BTreeMap::new(),
        })
    }

    pub fn with_env(mut self, env: &BTreeMap<String, String>) -> Self {
        self.extra_env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Write the script to execute, replacing any previous one.
    pub fn write_script(&self, code: &str) -> Result<PathBuf> {
        let path = self.work_dir.path().join(SCRIPT_NAME);
        std::fs::write(&path, code).with_context(|| format!("failed to write {SCRIPT_NAME}"))?;
        Ok(path)
    }

    /// Environment for the child process.
    ///
    /// The child starts from an empty environment: only a few locale and
    /// path variables are inherited, so credentials never reach learner code.
    pub fn build_env(&self) -> Vec<(String, String)> {
        let mut env: Vec<(String, String)> = PASSTHROUGH_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok().map(|v| (var.to_string(), v)))
            .collect();

        env.push((
            "HOME".to_string(),
            self.work_dir.path().to_string_lossy().to_string(),
        ));
        env.push(("PYTHONIOENCODING".to_string(), "utf-8".to_string()));
        env.push(("PYTHONHASHSEED".to_string(), "0".to_string()));
        env.push(("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string()));

        for (key, value) in &self.extra_env {
            env.retain(|(k, _)| k != key);
            env.push((key.clone(), value.clone()));
        }

        env
    }
}
