//! Pre-flight validation of the container environment.
//!
//! Optional: the runner does not require it. Every hard failure is reported
//! as `RunnerError::Environment` with a remediation hint. Failing to confirm
//! that the database container is attached to the network only prints a
//! warning.

use std::collections::HashMap;
use std::io::Write;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::{RunnerError, Result};
use crate::runtime::{ContainerRuntime, ProcessOutput};

const START_HINT: &str = "Please start the environment (e.g. `docker-compose up -d`).";

/// One entry of `network inspect` output.
#[derive(Debug, Deserialize)]
struct NetworkInfo {
    #[serde(rename = "Containers", default)]
    containers: Option<HashMap<String, serde_json::Value>>,
}

/// Result of network attachment verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Attached,
    Detached,
    Unknown,
}

/// Validates runtime, image, network and database container.
///
/// Warnings are written to `out`.
pub fn validate<W: Write>(
    settings: &Settings,
    runtime: &dyn ContainerRuntime,
    out: &mut W,
) -> Result<Attachment> {
    let name = runtime.name().to_string();

    let version = call(runtime, &["--version"]).map_err(|_| unavailable(&name))?;
    if !version.success() {
        return Err(unavailable(&name));
    }
    debug!("Runtime: {}", version.stdout.trim());

    let image = call(runtime, &["image", "inspect", &settings.image])?;
    if !image.success() {
        return Err(RunnerError::environment(
            format!("Docker image '{}' not found.", settings.image),
            "Please build the image (e.g. `docker-compose build`).",
        ));
    }

    let network = call(runtime, &["network", "inspect", &settings.network])?;
    if !network.success() {
        return Err(RunnerError::environment(
            format!("Docker network '{}' not found.", settings.network),
            START_HINT,
        ));
    }

    let container = &settings.db_container;
    let running = call(runtime, &["inspect", "-f", "{{.State.Running}}", container])?;
    if !running.success() {
        return Err(RunnerError::environment(
            format!("Database container '{container}' does not exist."),
            START_HINT,
        ));
    }
    if !running.stdout.trim().eq_ignore_ascii_case("true") {
        return Err(RunnerError::environment(
            format!("Database container '{container}' is not running."),
            format!("Please start it (e.g. `docker start {container}` or `docker-compose up -d`)."),
        ));
    }

    let attachment = check_attachment(runtime, &network.stdout, container)?;
    if attachment == Attachment::Detached {
        writeln!(
            out,
            "WARNING: Database container '{container}' is running but NOT attached to network '{}'.\n\
             It won't be reachable. Check your docker-compose configuration.",
            settings.network
        )?;
    }

    info!("Environment check passed ({:?})", attachment);
    Ok(attachment)
}

fn check_attachment(
    runtime: &dyn ContainerRuntime,
    network_json: &str,
    container: &str,
) -> Result<Attachment> {
    let Some(members) = network_members(network_json) else {
        debug!("Could not parse network inspection output; skipping attachment check");
        return Ok(Attachment::Unknown);
    };

    let id = call(runtime, &["inspect", "-f", "{{.Id}}", container])?;
    if !id.success() {
        return Ok(Attachment::Unknown);
    }

    if members.contains_key(id.stdout.trim()) {
        Ok(Attachment::Attached)
    } else {
        Ok(Attachment::Detached)
    }
}

/// Extracts the container map of the first network, if present.
fn network_members(json: &str) -> Option<HashMap<String, serde_json::Value>> {
    let networks: Vec<NetworkInfo> = serde_json::from_str(json).ok()?;
    networks.into_iter().next()?.containers
}

fn call(runtime: &dyn ContainerRuntime, args: &[&str]) -> Result<ProcessOutput> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    runtime.exec(&args, &[]).map_err(|e| match e {
        RunnerError::RuntimeNotFound(name) => RunnerError::environment(
            format!("{name} command not found."),
            "Please install it and ensure it is in your PATH.",
        ),
        other => other,
    })
}

fn unavailable(name: &str) -> RunnerError {
    RunnerError::environment(
        format!("{name} is not available."),
        format!("Please install {name} and ensure it is in your PATH."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ScriptedRuntime;

    const NETWORK_WITH_DB: &str =
        r#"[{"Name": "net", "Containers": {"abc123": {"Name": "sqlserver_db-uek"}}}]"#;

    fn healthy(network_json: &str, db_id: &str) -> ScriptedRuntime {
        let runtime = ScriptedRuntime::new();
        runtime.push_output(0, "Docker version 27.0.3\n", "");
        runtime.push_output(0, "[]", "");
        runtime.push_output(0, network_json, "");
        runtime.push_output(0, "true\n", "");
        runtime.push_output(0, &format!("{db_id}\n"), "");
        runtime
    }

    #[test]
    fn test_validate_attached() {
        let runtime = healthy(NETWORK_WITH_DB, "abc123");
        let mut out = Vec::new();
        let result = validate(&Settings::default(), &runtime, &mut out).unwrap();

        assert_eq!(result, Attachment::Attached);
        assert!(out.is_empty());

        let calls = runtime.calls();
        assert_eq!(calls[1].args, ["image", "inspect", "sql-data-analysis-init-db"]);
        assert_eq!(calls[3].args, ["inspect", "-f", "{{.State.Running}}", "sqlserver_db-uek"]);
    }

    #[test]
    fn test_validate_detached_warns() {
        let runtime = healthy(NETWORK_WITH_DB, "zzz999");
        let mut out = Vec::new();
        let result = validate(&Settings::default(), &runtime, &mut out).unwrap();

        assert_eq!(result, Attachment::Detached);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("WARNING: Database container 'sqlserver_db-uek'"));
    }

    #[test]
    fn test_validate_unparseable_network_is_unknown() {
        let runtime = healthy("not json", "abc123");
        let mut out = Vec::new();
        let result = validate(&Settings::default(), &runtime, &mut out).unwrap();

        assert_eq!(result, Attachment::Unknown);
        assert!(out.is_empty());
        assert_eq!(runtime.calls().len(), 4);
    }

    #[test]
    fn test_validate_runtime_missing() {
        let runtime = ScriptedRuntime::new();
        runtime.push_not_found();
        let err = validate(&Settings::default(), &runtime, &mut Vec::new()).unwrap_err();

        assert_eq!(err.category(), "Environment Misconfigured");
        assert!(err.to_string().contains("not available"));
    }

    #[test]
    fn test_validate_image_missing() {
        let runtime = ScriptedRuntime::new();
        runtime.push_output(0, "Docker version 27.0.3", "");
        runtime.push_output(1, "", "No such image");
        let err = validate(&Settings::default(), &runtime, &mut Vec::new()).unwrap_err();

        assert!(err.to_string().contains("image 'sql-data-analysis-init-db' not found"));
        assert!(err.hint().unwrap().contains("docker-compose build"));
    }

    #[test]
    fn test_validate_network_missing() {
        let runtime = ScriptedRuntime::new();
        runtime.push_output(0, "Docker version 27.0.3", "");
        runtime.push_output(0, "[]", "");
        runtime.push_output(1, "", "network not found");
        let err = validate(&Settings::default(), &runtime, &mut Vec::new()).unwrap_err();

        assert!(err.to_string().contains("network 'sql-data-analysis_db_network_uek'"));
    }

    #[test]
    fn test_validate_container_missing() {
        let runtime = ScriptedRuntime::new();
        runtime.push_output(0, "Docker version 27.0.3", "");
        runtime.push_output(0, "[]", "");
        runtime.push_output(0, NETWORK_WITH_DB, "");
        runtime.push_output(1, "", "No such object");
        let err = validate(&Settings::default(), &runtime, &mut Vec::new()).unwrap_err();

        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_container_stopped() {
        let runtime = ScriptedRuntime::new();
        runtime.push_output(0, "Docker version 27.0.3", "");
        runtime.push_output(0, "[]", "");
        runtime.push_output(0, NETWORK_WITH_DB, "");
        runtime.push_output(0, "false\n", "");
        let err = validate(&Settings::default(), &runtime, &mut Vec::new()).unwrap_err();

        assert!(err.to_string().contains("is not running"));
        assert!(err.hint().unwrap().contains("docker start sqlserver_db-uek"));
    }

    #[test]
    fn test_network_members_missing_key() {
        assert!(network_members(r#"[{"Name": "net"}]"#).is_none());
        assert!(network_members("[]").is_none());
    }
}
