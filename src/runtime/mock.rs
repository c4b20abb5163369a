//! Scripted container runtime for testing.
//!
//! Replays queued responses in order and records every invocation, including
//! the contents of mounted files at the moment the call was made.

use super::{ContainerRuntime, ProcessOutput};
use crate::error::{RunnerError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;

/// A canned reaction to one runtime invocation.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// The process ran and produced this output.
    Output(ProcessOutput),
    /// The runtime binary could not be found.
    NotFound,
}

/// One recorded invocation.
#[derive(Debug, Clone, Default)]
pub struct RecordedCall {
    /// Arguments passed to the runtime.
    pub args: Vec<String>,
    /// Environment added to the runtime process.
    pub env: Vec<(String, String)>,
    /// `(host path, container path, contents)` for each `-v` mount.
    /// Contents are `None` when the host file did not exist during the call.
    pub mounts: Vec<(PathBuf, String, Option<String>)>,
}

impl RecordedCall {
    /// Returns the contents of the file mounted at `container_path`.
    pub fn mounted(&self, container_path: &str) -> Option<&str> {
        self.mounts
            .iter()
            .find(|(_, target, _)| target == container_path)
            .and_then(|(_, _, contents)| contents.as_deref())
    }

    /// Returns the host paths of all mounts.
    pub fn host_paths(&self) -> Vec<PathBuf> {
        self.mounts.iter().map(|(host, _, _)| host.clone()).collect()
    }
}

/// A runtime that returns predefined results.
///
/// When the queue runs dry every call succeeds with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRuntime {
    responses: RefCell<VecDeque<ScriptedResponse>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedRuntime {
    /// Creates a runtime with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a process output.
    pub fn push_output(&self, status: i32, stdout: &str, stderr: &str) {
        self.responses
            .borrow_mut()
            .push_back(ScriptedResponse::Output(ProcessOutput::new(
                status, stdout, stderr,
            )));
    }

    /// Queues a missing-binary failure.
    pub fn push_not_found(&self) {
        self.responses
            .borrow_mut()
            .push_back(ScriptedResponse::NotFound);
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl ContainerRuntime for ScriptedRuntime {
    fn name(&self) -> &str {
        "scripted"
    }

    fn exec(&self, args: &[String], env: &[(String, String)]) -> Result<ProcessOutput> {
        let mounts = args
            .windows(2)
            .filter(|pair| pair[0] == "-v")
            .filter_map(|pair| pair[1].rsplit_once(':'))
            .map(|(host, target)| {
                let host = PathBuf::from(host);
                let contents = std::fs::read_to_string(&host).ok();
                (host, target.to_string(), contents)
            })
            .collect();

        self.calls.borrow_mut().push(RecordedCall {
            args: args.to_vec(),
            env: env.to_vec(),
            mounts,
        });

        match self.responses.borrow_mut().pop_front() {
            Some(ScriptedResponse::Output(output)) => Ok(output),
            Some(ScriptedResponse::NotFound) => {
                Err(RunnerError::RuntimeNotFound(self.name().to_string()))
            }
            None => Ok(ProcessOutput::new(0, "", "")),
        }
    }
}
