//! Configuration resolution integration tests.

use sqlrun::config::{discover_env_file, EnvLayer, Settings, ENV_FILENAME};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_load_reads_nearest_env_file() {
    let dir = tempdir().unwrap();
    let notebooks = dir.path().join("exercises_notebooks");
    fs::create_dir_all(&notebooks).unwrap();
    fs::write(
        dir.path().join(ENV_FILENAME),
        "# local overrides\nSQLRUN_IT_MARKER=course-root\n",
    )
    .unwrap();

    let env = EnvLayer::load(&notebooks);
    assert_eq!(env.get("SQLRUN_IT_MARKER"), Some("course-root"));
    assert_eq!(env.source(), Some(dir.path().join(ENV_FILENAME).as_path()));
}

#[test]
fn test_only_nearest_file_is_consulted() {
    let dir = tempdir().unwrap();
    let inner = dir.path().join("inner");
    fs::create_dir_all(&inner).unwrap();
    fs::write(dir.path().join(ENV_FILENAME), "SQLRUN_OUTER_ONLY=yes\n").unwrap();
    fs::write(inner.join(ENV_FILENAME), "SQL_DATABASE=inner_db\n").unwrap();

    let path = discover_env_file(&inner, ENV_FILENAME).unwrap();
    let mut env = EnvLayer::default();
    env.apply_env_file(&path).unwrap();

    assert_eq!(env.get("SQL_DATABASE"), Some("inner_db"));
    assert_eq!(env.get("SQLRUN_OUTER_ONLY"), None);
}

#[test]
fn test_settings_from_env_file_and_environment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(ENV_FILENAME);
    fs::write(
        &path,
        "SQL_DOCKER_NETWORK=file_net\nSQL_PORT=1500\nnot a valid line\nSQL_USER=file_user\n",
    )
    .unwrap();

    let mut env = EnvLayer::from_vars([("SQL_USER", "env_user")]);
    env.apply_env_file(&path).unwrap();
    let settings = Settings::from_env(&env).unwrap();

    assert_eq!(settings.network, "file_net");
    assert_eq!(settings.port, 1500);
    assert_eq!(settings.user, "env_user");
    assert_eq!(settings.image, Settings::default().image);
}
