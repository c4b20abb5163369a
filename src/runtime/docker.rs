//! Container runtime backed by a CLI binary (`docker`, `podman`, ...).

use super::{ContainerRuntime, ProcessOutput};
use crate::error::{RunnerError, Result};
use std::io::ErrorKind;
use std::process::{Command, Stdio};
use tracing::debug;

/// Invokes a Docker-compatible CLI as a blocking child process.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    /// Creates a runtime that invokes `binary`.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RUNTIME)
    }
}

impl ContainerRuntime for DockerCli {
    fn name(&self) -> &str {
        &self.binary
    }

    fn exec(&self, args: &[String], env: &[(String, String)]) -> Result<ProcessOutput> {
        debug!("Running {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RunnerError::RuntimeNotFound(self.binary.clone()),
                _ => RunnerError::Io(e),
            })?;

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        };
        debug!("{} exited with {:?}", self.binary, result.status);
        Ok(result)
    }
}
