//! Runs a sandboxed script with the Python interpreter.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use syntaxdrill_core::runtime::ExecutionResult;

use crate::sandbox::{Sandbox, SCRIPT_NAME};

/// Output beyond this many bytes is cut off.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// Run the sandbox script.
///
/// Errors only if the interpreter could not be started. A script that
/// raises, exits non-zero or runs past the sandbox timeout yields a failed
/// [`ExecutionResult`].
pub async fn run_script(
    python: &Path,
    sandbox: &Sandbox,
    stdin: Option<&str>,
    max_output_bytes: usize,
) -> Result<ExecutionResult> {
    let start = Instant::now();

    let mut cmd = Command::new(python);
    // -s: no user site-packages, -B: no .pyc files. Not -I: that implies -E,
    // which would drop PYTHONHASHSEED and make set ordering vary per run.
    cmd.arg("-s")
        .arg("-B")
        .arg(SCRIPT_NAME)
        .current_dir(sandbox.work_dir())
        .env_clear()
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, val) in sandbox.build_env() {
        cmd.env(&key, &val);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to start {}", python.display()))?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        // A script that exits without reading stdin closes the pipe early.
        if let Err(e) = pipe.write_all(input.as_bytes()).await {
            tracing::debug!("stdin write failed: {e}");
        }
    }

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let collect = async {
        let (stdout, stderr, status) = tokio::join!(
            read_bounded(stdout_pipe, max_output_bytes),
            read_tail(stderr_pipe, max_output_bytes),
            child.wait(),
        );
        Ok::<_, std::io::Error>((stdout?, stderr?, status?))
    };

    let outcome = tokio::time::timeout(sandbox.timeout(), collect).await;
    let (stdout, stderr, status) = match outcome {
        Ok(result) => result.context("failed to wait for python process")?,
        Err(_) => {
            if let Err(e) = child.start_kill() {
                tracing::debug!("kill after timeout failed: {e}");
            }
            tracing::debug!(
                timeout_ms = sandbox.timeout().as_millis() as u64,
                "python process killed after timeout"
            );
            return Ok(ExecutionResult::timed_out(sandbox.timeout()));
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let text = truncate(&String::from_utf8_lossy(&stdout.bytes), max_output_bytes);
    let stderr_text = String::from_utf8_lossy(&stderr);

    tracing::debug!(
        duration_ms,
        status = ?status.code(),
        stdout_bytes = stdout.bytes.len(),
        stdout_truncated = stdout.truncated,
        "python process finished"
    );

    if status.success() {
        Ok(ExecutionResult::ok(text))
    } else {
        Ok(ExecutionResult::failed(error_summary(&stderr_text, status.code())))
    }
}

/// Captured bytes of one output stream.
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    /// More output arrived than was kept.
    truncated: bool,
}

/// Keep at most `limit` bytes of a stream and discard the rest.
///
/// The stream is drained to the end so the child never blocks on a full pipe.
async fn read_bounded<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
) -> std::io::Result<Captured> {
    let Some(reader) = reader else {
        return Ok(Captured::default());
    };
    let mut bounded = reader.take(limit as u64);
    let mut bytes = Vec::new();
    bounded.read_to_end(&mut bytes).await?;
    let discarded = tokio::io::copy(&mut bounded.into_inner(), &mut tokio::io::sink()).await?;
    Ok(Captured {
        bytes,
        truncated: discarded > 0,
    })
}

/// Keep the last `limit` bytes of a stream, where a traceback ends.
async fn read_tail<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
) -> std::io::Result<Vec<u8>> {
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };
    let mut tail = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        tail.extend_from_slice(&chunk[..n]);
        if tail.len() > limit.saturating_mul(2) {
            tail.drain(..tail.len() - limit);
        }
    }
    if tail.len() > limit {
        tail.drain(..tail.len() - limit);
    }
    Ok(tail)
}

/// The last non-empty stderr line, which for a traceback is the exception.
pub fn error_summary(stderr: &str, code: Option<i32>) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match code {
            Some(code) => format!("process exited with status {code}"),
            None => "process terminated by signal".to_string(),
        })
}

fn truncate(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
