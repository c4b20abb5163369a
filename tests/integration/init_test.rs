//! Database initializer integration tests.

use sqlrun::config::Settings;
use sqlrun::init::{self, WaitPolicy, BOOTSTRAP_DATABASE};
use sqlrun::payload::{TemplatedPayload, BATCHES_MOUNT, EXECUTOR_MOUNT};
use sqlrun::runner::QueryRunner;
use sqlrun::runtime::ScriptedRuntime;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_wait_then_replay_script_file() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("01-university-complete.sql");
    std::fs::write(
        &script,
        "CREATE DATABASE university;\nGO\nUSE university;\nCREATE TABLE students (id INT);\nGO\n",
    )
    .unwrap();

    let settings = Settings::default().with_database(BOOTSTRAP_DATABASE);
    let runtime = ScriptedRuntime::new();
    runtime.push_output(1, "", "Error: Adaptive Server is unavailable");
    runtime.push_output(0, "{\"columns\": [\"\"], \"rows\": [[1]]}", "");
    runtime.push_output(0, r#"{"batches": [{"ok": true}, {"ok": true}]}"#, "");

    let runner = QueryRunner::new(&settings, &runtime).with_payload(Box::new(TemplatedPayload));
    let policy = WaitPolicy {
        attempts: 5,
        interval: Duration::ZERO,
    };

    let mut out = Vec::new();
    assert!(init::wait_for_server(&runner, &policy, &mut out).unwrap());
    let summary = init::replay_file(&runner, &script, &mut out).unwrap();

    assert_eq!(summary.total, 2);
    assert!(summary.is_clean());

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Found 2 batches"));
    assert!(text.contains("  Batch 2/2 ✓"));

    let calls = runtime.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0]
        .mounted(EXECUTOR_MOUNT)
        .unwrap()
        .contains("DATABASE = \"master\""));
    let batches: Vec<String> =
        serde_json::from_str(calls[2].mounted(BATCHES_MOUNT).unwrap()).unwrap();
    assert_eq!(
        batches,
        vec![
            "CREATE DATABASE university;",
            "USE university;\nCREATE TABLE students (id INT);",
        ]
    );
}
