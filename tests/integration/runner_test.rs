//! Query runner integration tests.
//!
//! Exercises the full pipeline through real child processes, using a shell
//! script standing in for the container CLI.

use pretty_assertions::assert_eq;
use sqlrun::config::Settings;
use sqlrun::error::{Result, RunnerError};
use sqlrun::payload::TemplatedPayload;
use sqlrun::runner::{Overrides, QueryRunner};
use sqlrun::runtime::{ContainerRuntime, DockerCli, ProcessOutput};
use std::path::Path;
use tempfile::tempdir;

/// Fake container CLI: copies the mounted query next to `$SEEN_DIR`, then
/// prints `$FAKE_STDOUT` / `$FAKE_STDERR` and exits with `$FAKE_STATUS`.
const FAKE_CLI: &str = r#"
while [ $# -gt 0 ]; do
  if [ "$1" = "-v" ]; then
    case "$2" in
      *:/query.sql) cp "${2%:/query.sql}" "$SEEN_DIR/seen.sql" ;;
      *:/run_query.py) cp "${2%:/run_query.py}" "$SEEN_DIR/seen.py" ;;
    esac
    shift
  fi
  shift
done
printf '%s' "$FAKE_STDOUT"
printf '%s' "$FAKE_STDERR" >&2
exit "$FAKE_STATUS"
"#;

/// Runs [`FAKE_CLI`] through `sh` with the runner's arguments.
struct ShellRuntime {
    shell: DockerCli,
    env: Vec<(String, String)>,
}

impl ShellRuntime {
    fn new(seen_dir: &Path, status: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            shell: DockerCli::new("sh"),
            env: vec![
                ("SEEN_DIR".to_string(), seen_dir.display().to_string()),
                ("FAKE_STATUS".to_string(), status.to_string()),
                ("FAKE_STDOUT".to_string(), stdout.to_string()),
                ("FAKE_STDERR".to_string(), stderr.to_string()),
            ],
        }
    }
}

impl ContainerRuntime for ShellRuntime {
    fn name(&self) -> &str {
        "fake-docker"
    }

    fn exec(&self, args: &[String], env: &[(String, String)]) -> Result<ProcessOutput> {
        let mut full = vec![
            "-c".to_string(),
            FAKE_CLI.to_string(),
            "fake-docker".to_string(),
        ];
        full.extend(args.iter().cloned());
        let mut all_env = self.env.clone();
        all_env.extend(env.iter().cloned());
        self.shell.exec(&full, &all_env)
    }
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[cfg(unix)]
#[test]
fn test_execute_through_process_prints_table() {
    let scratch = tempdir().unwrap();
    let seen = tempdir().unwrap();
    let runtime = ShellRuntime::new(
        seen.path(),
        0,
        r#"{"columns": ["a", "b"], "rows": [[1, "x"], [null, "y"]]}"#,
        "",
    );
    let settings = Settings::default();
    let runner = QueryRunner::new(&settings, &runtime)
        .with_payload(Box::new(TemplatedPayload))
        .with_scratch_dir(scratch.path());

    let mut out = Vec::new();
    let execution = runner
        .execute("SELECT a, b FROM pairs", "Pairs", &Overrides::default(), &mut out)
        .unwrap();

    assert!(execution.succeeded());
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("a | b\n"));
    assert!(text.contains("1 | x\n"));
    assert!(text.contains("NULL | y\n"));
    assert!(text.contains("(2 row(s) returned)"));

    assert_eq!(
        std::fs::read_to_string(seen.path().join("seen.sql")).unwrap(),
        "SELECT a, b FROM pairs"
    );
    let script = std::fs::read_to_string(seen.path().join("seen.py")).unwrap();
    assert!(script.contains("import pymssql"));
    assert!(dir_is_empty(scratch.path()));
}

#[cfg(unix)]
#[test]
fn test_execute_failure_prints_stderr_and_returns() {
    let scratch = tempdir().unwrap();
    let seen = tempdir().unwrap();
    let runtime = ShellRuntime::new(
        seen.path(),
        1,
        "",
        "Error: Incorrect syntax near 'SELEC'.\n",
    );
    let settings = Settings::default();
    let runner = QueryRunner::new(&settings, &runtime).with_scratch_dir(scratch.path());

    let mut out = Vec::new();
    let execution = runner
        .execute("SELEC 1", "Typo", &Overrides::default(), &mut out)
        .unwrap();

    assert_eq!(execution.output.status, Some(1));
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "\n=== Typo ===\nSTDERR: Error: Incorrect syntax near 'SELEC'.\n\n"
    );
    assert!(dir_is_empty(scratch.path()));
}

#[test]
fn test_missing_runtime_binary_cleans_up() {
    let scratch = tempdir().unwrap();
    let runtime = DockerCli::new("sqlrun-definitely-missing-runtime");
    let settings = Settings::default();
    let runner = QueryRunner::new(&settings, &runtime).with_scratch_dir(scratch.path());

    let mut out = Vec::new();
    let err = runner
        .execute("SELECT 1", "Query", &Overrides::default(), &mut out)
        .unwrap_err();

    assert!(matches!(err, RunnerError::RuntimeNotFound(_)));
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("\n=== Query ===\n"));
    assert!(text.contains("STDERR: sqlrun-definitely-missing-runtime command not found"));
    assert!(dir_is_empty(scratch.path()));
}
