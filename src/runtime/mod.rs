//! Container runtime abstraction for sqlrun.
//!
//! Provides a trait-based interface over the container CLI so the runner and
//! pre-flight checks can be driven by a scripted runtime in tests.

mod docker;
mod mock;

pub use docker::DockerCli;
pub use mock::{RecordedCall, ScriptedResponse, ScriptedRuntime};

use crate::error::Result;
use std::path::PathBuf;

/// Captured result of a finished runtime invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,

    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,

    /// Exit code; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
}

impl ProcessOutput {
    /// Creates an output with the given exit code and streams.
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            status: Some(status),
        }
    }

    /// Returns true if the process exited with status zero.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// A host file bind-mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: PathBuf,
    pub container: String,
}

impl Mount {
    pub fn new(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }

    fn as_arg(&self) -> String {
        format!("{}:{}", self.host.display(), self.container)
    }
}

/// Description of a one-shot `run --rm` invocation.
#[derive(Debug, Clone, Default)]
pub struct RunSpec {
    /// Network the container joins.
    pub network: String,

    /// Image to run.
    pub image: String,

    /// Files mounted into the container.
    pub mounts: Vec<Mount>,

    /// Variables forwarded into the container. Only the names appear on the
    /// command line; values travel through the runtime process environment.
    pub env: Vec<(String, String)>,

    /// Command executed inside the container.
    pub command: Vec<String>,
}

impl RunSpec {
    /// Builds the runtime argument list for this invocation.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--network".to_string(),
            self.network.clone(),
        ];
        for (key, _) in &self.env {
            args.push("-e".to_string());
            args.push(key.clone());
        }
        for mount in &self.mounts {
            args.push("-v".to_string());
            args.push(mount.as_arg());
        }
        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());
        args
    }
}

/// Trait defining the interface for container runtimes.
pub trait ContainerRuntime {
    /// Name of the runtime, used in diagnostics.
    fn name(&self) -> &str;

    /// Runs the runtime with `args`, adding `env` to its environment.
    ///
    /// A non-zero exit is returned as output, not as an error. Failing to
    /// find the runtime binary yields `RunnerError::RuntimeNotFound`.
    fn exec(&self, args: &[String], env: &[(String, String)]) -> Result<ProcessOutput>;

    /// Runs a one-shot container.
    fn run(&self, spec: &RunSpec) -> Result<ProcessOutput> {
        self.exec(&spec.args(), &spec.env)
    }
}
