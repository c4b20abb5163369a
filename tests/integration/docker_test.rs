//! Tests against a real container environment.
//!
//! These require the course containers to be running.
//! Set SQLRUN_DOCKER_TESTS=1 to run them.

use sqlrun::config::{EnvLayer, Settings};
use sqlrun::preflight;
use sqlrun::runner::{Overrides, QueryRunner};
use sqlrun::runtime::DockerCli;

/// Helper to load settings when docker tests are enabled.
fn docker_settings() -> Option<Settings> {
    std::env::var("SQLRUN_DOCKER_TESTS").ok()?;
    let env = EnvLayer::load(&std::env::current_dir().ok()?);
    Settings::from_env(&env).ok()
}

#[test]
fn test_preflight_against_docker() {
    let Some(settings) = docker_settings() else {
        eprintln!("Skipping test: SQLRUN_DOCKER_TESTS not set");
        return;
    };

    let runtime = DockerCli::new(&settings.runtime);
    preflight::validate(&settings, &runtime, &mut std::io::stderr()).unwrap();
}

#[test]
fn test_select_against_docker() {
    let Some(settings) = docker_settings() else {
        eprintln!("Skipping test: SQLRUN_DOCKER_TESTS not set");
        return;
    };

    let runtime = DockerCli::new(&settings.runtime);
    let runner = QueryRunner::new(&settings, &runtime);
    let mut out = Vec::new();
    let execution = runner
        .execute("SELECT 1 AS num, NULL AS nothing", "Smoke", &Overrides::default(), &mut out)
        .unwrap();

    assert!(execution.succeeded(), "{}", execution.output.stderr);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("num | nothing"));
    assert!(text.contains("1 | NULL"));
    assert!(text.contains("(1 row(s) returned)"));
}
