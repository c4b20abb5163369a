//! Query execution through a one-shot client container.
//!
//! Each call stages the SQL text (or a batch list) and the executor payload as
//! temporary files, runs the client image with both files mounted, and
//! reports the captured output. The temporary files are owned by [`StagedFiles`] and removed when
//! it is dropped, so every exit path cleans up.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::Settings;
use crate::db::{BatchReport, ResultSet};
use crate::error::{RunnerError, Result};
use crate::format;
use crate::payload::{
    PayloadKind, PayloadStrategy, BATCHES_MOUNT, EXECUTOR_MOUNT, QUERY_MOUNT,
};
use crate::runtime::{ContainerRuntime, Mount, ProcessOutput, RunSpec};

/// Per-call replacements for the configured network and image.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub network: Option<String>,
    pub image: Option<String>,
}

/// Outcome of a completed invocation.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Raw process output.
    pub output: ProcessOutput,

    /// Result document decoded from stdout, if the payload produced one.
    pub result: Option<ResultSet>,
}

impl Execution {
    /// Returns true if the invocation exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.output.success()
    }
}

/// What the payload reads: a single query or a list of script batches.
struct Input<'q> {
    contents: &'q str,
    suffix: &'static str,
    mount: &'static str,
}

/// Outcome of a batch replay invocation.
#[derive(Debug, Clone)]
pub struct BatchRun {
    /// Raw process output.
    pub output: ProcessOutput,

    /// Per-batch statuses decoded from stdout.
    pub report: Option<BatchReport>,
}

/// The two temporary files backing one invocation.
struct StagedFiles {
    input: NamedTempFile,
    input_mount: &'static str,
    executor: NamedTempFile,
}

impl StagedFiles {
    fn create(dir: Option<&Path>, input: &Input<'_>, script: &str) -> Result<Self> {
        Ok(Self {
            input: write_temp(dir, input.suffix, input.contents)?,
            input_mount: input.mount,
            executor: write_temp(dir, ".py", script)?,
        })
    }
}

fn write_temp(dir: Option<&Path>, suffix: &str, contents: &str) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("sqlrun-").suffix(suffix);
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Runs SQL statements through the container runtime.
pub struct QueryRunner<'a> {
    settings: &'a Settings,
    runtime: &'a dyn ContainerRuntime,
    payload: Box<dyn PayloadStrategy>,
    scratch_dir: Option<PathBuf>,
}

impl<'a> QueryRunner<'a> {
    /// Creates a runner using the default payload strategy.
    pub fn new(settings: &'a Settings, runtime: &'a dyn ContainerRuntime) -> Self {
        Self {
            settings,
            runtime,
            payload: PayloadKind::default().strategy(),
            scratch_dir: None,
        }
    }

    /// Replaces the payload strategy.
    pub fn with_payload(mut self, payload: Box<dyn PayloadStrategy>) -> Self {
        self.payload = payload;
        self
    }

    /// Stages temporary files in `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Returns the settings this runner uses.
    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Executes `query` and prints a report to `out`.
    ///
    /// A failing statement is reported, not returned as an error. Only a
    /// missing runtime binary or a local I/O failure yields `Err`.
    pub fn execute<W: Write>(
        &self,
        query: &str,
        description: &str,
        overrides: &Overrides,
        out: &mut W,
    ) -> Result<Execution> {
        writeln!(out, "\n=== {description} ===")?;

        let execution = match self.invoke(query, overrides) {
            Ok(execution) => execution,
            Err(e @ RunnerError::RuntimeNotFound(_)) => {
                writeln!(
                    out,
                    "STDERR: {} command not found. Is it installed and on PATH?",
                    self.runtime.name()
                )?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        report(&execution, out)?;
        Ok(execution)
    }

    /// Executes `query` without printing anything.
    pub fn invoke(&self, query: &str, overrides: &Overrides) -> Result<Execution> {
        let input = Input {
            contents: query,
            suffix: ".sql",
            mount: QUERY_MOUNT,
        };
        let output = self.run_staged(&input, overrides)?;
        let result = if output.success() {
            ResultSet::parse(&output.stdout)
        } else {
            None
        };
        Ok(Execution { output, result })
    }

    /// Executes `batches` in order on a single connection.
    ///
    /// Session state such as the current database carries from one batch to
    /// the next. The report is `None` when the payload failed before running
    /// any batch.
    pub fn invoke_batches(&self, batches: &[String]) -> Result<BatchRun> {
        let list = serde_json::to_string(batches)
            .map_err(|e| RunnerError::internal(format!("Failed to encode batches: {e}")))?;
        let input = Input {
            contents: &list,
            suffix: ".json",
            mount: BATCHES_MOUNT,
        };
        let output = self.run_staged(&input, &Overrides::default())?;
        let report = if output.success() {
            BatchReport::parse(&output.stdout)
        } else {
            None
        };
        Ok(BatchRun { output, report })
    }

    fn run_staged(&self, input: &Input<'_>, overrides: &Overrides) -> Result<ProcessOutput> {
        let script = self.payload.script(self.settings);
        let staged = StagedFiles::create(self.scratch_dir.as_deref(), input, &script)?;
        let spec = self.run_spec(&staged, overrides);

        info!("Executing {} on {} via {}", input.mount, spec.network, spec.image);
        let output = self.runtime.run(&spec);
        drop(staged);
        let output = output?;

        debug!("Invocation finished with status {:?}", output.status);
        Ok(output)
    }

    fn run_spec(&self, staged: &StagedFiles, overrides: &Overrides) -> RunSpec {
        RunSpec {
            network: overrides
                .network
                .clone()
                .unwrap_or_else(|| self.settings.network.clone()),
            image: overrides
                .image
                .clone()
                .unwrap_or_else(|| self.settings.image.clone()),
            mounts: vec![
                Mount::new(staged.input.path(), staged.input_mount),
                Mount::new(staged.executor.path(), EXECUTOR_MOUNT),
            ],
            env: self.payload.env(self.settings),
            command: vec![
                self.settings.interpreter.clone(),
                EXECUTOR_MOUNT.to_string(),
            ],
        }
    }
}

/// Prints stdout (as a table when it is a result document) and, on failure,
/// the captured stderr.
fn report<W: Write>(execution: &Execution, out: &mut W) -> Result<()> {
    let output = &execution.output;
    match &execution.result {
        Some(result) => out.write_all(format::render(result).as_bytes())?,
        None if !output.stdout.is_empty() => out.write_all(output.stdout.as_bytes())?,
        None => {}
    }

    if !output.success() && !output.stderr.is_empty() {
        writeln!(out, "STDERR: {}", output.stderr)?;
    }
    Ok(())
}
