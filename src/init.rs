//! Database initialization: wait for the server, then replay a script.
//!
//! Both steps go through the [`QueryRunner`], so the initializer needs
//! nothing beyond the container runtime. A replay is a single invocation:
//! all batches share one connection.

use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{RunnerError, Result};
use crate::runner::{Overrides, QueryRunner};

/// Statement used to check that the server accepts connections.
pub const READINESS_SQL: &str = "SELECT 1";

/// Database the initializer connects to before the course database exists.
pub const BOOTSTRAP_DATABASE: &str = "master";

/// How long to wait for the server to come up.
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_secs(2),
        }
    }
}

/// Outcome of replaying a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Number of batches found.
    pub total: usize,

    /// 1-based indices of batches that failed.
    pub failed: Vec<usize>,
}

impl ReplaySummary {
    pub fn succeeded(&self) -> usize {
        self.total - self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Polls the server with [`READINESS_SQL`] until it answers.
///
/// Returns `false` once all attempts are used up.
pub fn wait_for_server<W: Write>(
    runner: &QueryRunner<'_>,
    policy: &WaitPolicy,
    out: &mut W,
) -> Result<bool> {
    let settings = runner.settings();
    writeln!(out, "Waiting for SQL Server at {}:{}...", settings.server, settings.port)?;

    for attempt in 1..=policy.attempts {
        let execution = runner.invoke(READINESS_SQL, &Overrides::default())?;
        if execution.succeeded() {
            writeln!(out, "✓ SQL Server is ready!")?;
            return Ok(true);
        }

        writeln!(
            out,
            "  Attempt {attempt}/{}: {}",
            policy.attempts,
            execution.output.stderr.trim()
        )?;
        if attempt < policy.attempts {
            thread::sleep(policy.interval);
        }
    }

    warn!("Server did not answer after {} attempts", policy.attempts);
    Ok(false)
}

/// Splits a script into batches on lines consisting only of `GO`.
///
/// Blank batches are dropped; each batch is trimmed.
pub fn split_batches(script: &str) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();

    for line in script.lines() {
        if line.trim().eq_ignore_ascii_case("GO") {
            push_batch(&mut batches, &current);
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    push_batch(&mut batches, &current);
    batches
}

fn push_batch(batches: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        batches.push(trimmed.to_string());
    }
}

/// Executes every batch of `script` in order on one connection,
/// continuing past failures.
pub fn replay<W: Write>(
    runner: &QueryRunner<'_>,
    script: &str,
    out: &mut W,
) -> Result<ReplaySummary> {
    let batches = split_batches(script);
    writeln!(out, "Found {} batches", batches.len())?;

    let total = batches.len();
    let mut summary = ReplaySummary {
        total,
        failed: Vec::new(),
    };
    if total == 0 {
        return Ok(summary);
    }

    debug!(
        "Replaying {total} batches, {} bytes",
        batches.iter().map(String::len).sum::<usize>()
    );
    let run = runner.invoke_batches(&batches)?;
    let Some(report) = run.report else {
        writeln!(out, "  Replay aborted: {}", run.output.stderr.trim())?;
        summary.failed = (1..=total).collect();
        warn!("Replay payload exited with status {:?}", run.output.status);
        return Ok(summary);
    };

    for index in 1..=total {
        match report.batches.get(index - 1) {
            Some(status) if status.ok => writeln!(out, "  Batch {index}/{total} ✓")?,
            Some(status) => {
                writeln!(
                    out,
                    "  Batch {index}/{total} ✗: {}",
                    status.error.as_deref().unwrap_or("unknown error")
                )?;
                summary.failed.push(index);
            }
            None => {
                writeln!(out, "  Batch {index}/{total} ✗: no status reported")?;
                summary.failed.push(index);
            }
        }
    }

    info!(
        "Replay finished: {}/{} batches succeeded",
        summary.succeeded(),
        summary.total
    );
    Ok(summary)
}

/// Reads `path` and replays it.
pub fn replay_file<W: Write>(
    runner: &QueryRunner<'_>,
    path: &Path,
    out: &mut W,
) -> Result<ReplaySummary> {
    writeln!(out, "\nReading: {}", path.display())?;
    let script = std::fs::read_to_string(path).map_err(|e| {
        RunnerError::config(format!("Failed to read script {}: {e}", path.display()))
    })?;
    replay(runner, &script, out)
}
