//! Configuration management for sqlrun.
//!
//! Settings are resolved from the process environment, overlaid with the
//! nearest ancestor `.env` file. Values from the file only fill keys that are
//! not already set, and the first occurrence of a key in the file wins.

use crate::error::{RunnerError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name searched for when discovering an env file.
pub const ENV_FILENAME: &str = ".env";

pub const NETWORK_VAR: &str = "SQL_DOCKER_NETWORK";
pub const IMAGE_VAR: &str = "SQL_DOCKER_IMAGE";
pub const SERVER_VAR: &str = "SQL_SERVER";
pub const DB_CONTAINER_VAR: &str = "SQL_DB_CONTAINER_NAME";
pub const PORT_VAR: &str = "SQL_PORT";
pub const USER_VAR: &str = "SQL_USER";
pub const PASSWORD_VAR: &str = "SQL_PASSWORD";
pub const DATABASE_VAR: &str = "SQL_DATABASE";
pub const RUNTIME_VAR: &str = "SQL_CONTAINER_RUNTIME";
pub const INTERPRETER_VAR: &str = "SQL_INTERPRETER";

pub const DEFAULT_NETWORK: &str = "sql-data-analysis_db_network_uek";
pub const DEFAULT_IMAGE: &str = "sql-data-analysis-init-db";
pub const DEFAULT_SERVER: &str = "sqlserver";
pub const DEFAULT_DB_CONTAINER: &str = "sqlserver_db-uek";
pub const DEFAULT_PORT: u16 = 1433;
pub const DEFAULT_USER: &str = "sa";
pub const DEFAULT_PASSWORD: &str = "YourStrong@Passw0rd";
pub const DEFAULT_DATABASE: &str = "university";
pub const DEFAULT_RUNTIME: &str = "docker";
pub const DEFAULT_INTERPRETER: &str = "python";

const REDACTED: &str = "********";

/// A snapshot of environment variables with an optional env file layered
/// underneath.
#[derive(Debug, Clone, Default)]
pub struct EnvLayer {
    vars: HashMap<String, String>,
    source: Option<PathBuf>,
}

impl EnvLayer {
    /// Creates a layer from explicit key/value pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            source: None,
        }
    }

    /// Snapshots the current process environment.
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Snapshots the process environment and layers the nearest `.env` file
    /// found by walking up from `start`.
    ///
    /// An unreadable env file is logged and ignored.
    pub fn load(start: &Path) -> Self {
        let mut layer = Self::from_process();
        if let Some(path) = discover_env_file(start, ENV_FILENAME) {
            if let Err(e) = layer.apply_env_file(&path) {
                warn!("Ignoring env file {}: {}", path.display(), e);
            }
        }
        layer
    }

    /// Layers the given env file beneath the current values.
    ///
    /// Keys already present are left untouched. Malformed lines are skipped.
    pub fn apply_env_file(&mut self, path: &Path) -> Result<()> {
        let entries = dotenvy::from_path_iter(path).map_err(|e| {
            RunnerError::config(format!("Failed to read {}: {e}", path.display()))
        })?;

        for entry in entries {
            match entry {
                Ok((key, value)) => {
                    self.vars.entry(key).or_insert(value);
                }
                Err(dotenvy::Error::Io(e)) => {
                    warn!("Stopped reading {}: {}", path.display(), e);
                    break;
                }
                Err(e) => debug!("Skipping malformed line in {}: {}", path.display(), e),
            }
        }

        info!("Loaded environment defaults from {}", path.display());
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    /// Returns the value of `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Returns the env file that was layered in, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }
}

/// Finds `filename` in `start` or the closest ancestor directory.
pub fn discover_env_file(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}

/// Resolved settings for reaching the database through the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Container network the client container joins.
    pub network: String,

    /// Image providing the interpreter and database driver.
    pub image: String,

    /// Database server hostname, as seen from inside the network.
    pub server: String,

    /// Name of the database server container (used by pre-flight checks).
    pub db_container: String,

    /// Database server port.
    pub port: u16,

    /// Database user.
    pub user: String,

    /// Database password.
    pub password: String,

    /// Database name.
    pub database: String,

    /// Container runtime binary.
    pub runtime: String,

    /// Interpreter used to run the executor payload inside the container.
    pub interpreter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            server: DEFAULT_SERVER.to_string(),
            db_container: DEFAULT_DB_CONTAINER.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            runtime: DEFAULT_RUNTIME.to_string(),
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }
}

impl Settings {
    /// Resolves settings from the environment layer, falling back to the
    /// documented defaults.
    pub fn from_env(env: &EnvLayer) -> Result<Self> {
        let port = match env.get(PORT_VAR) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                RunnerError::config(format!("{PORT_VAR} must be a port number, got '{raw}'"))
            })?,
            None => DEFAULT_PORT,
        };

        if env.get(PASSWORD_VAR).is_none() {
            info!("{PASSWORD_VAR} not set; using the default course password");
        }

        Ok(Self {
            network: env.get_or(NETWORK_VAR, DEFAULT_NETWORK),
            image: env.get_or(IMAGE_VAR, DEFAULT_IMAGE),
            server: env.get_or(SERVER_VAR, DEFAULT_SERVER),
            db_container: env.get_or(DB_CONTAINER_VAR, DEFAULT_DB_CONTAINER),
            port,
            user: env.get_or(USER_VAR, DEFAULT_USER),
            password: env.get_or(PASSWORD_VAR, DEFAULT_PASSWORD),
            database: env.get_or(DATABASE_VAR, DEFAULT_DATABASE),
            runtime: env.get_or(RUNTIME_VAR, DEFAULT_RUNTIME),
            interpreter: env.get_or(INTERPRETER_VAR, DEFAULT_INTERPRETER),
        })
    }

    /// Returns a copy pointed at a different database.
    pub fn with_database(&self, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with the password masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            password: REDACTED.to_string(),
            ..self.clone()
        }
    }

    /// Returns a display-safe summary (no password).
    pub fn display_string(&self) -> String {
        format!(
            "{}@{}:{}/{} via {} (network {}, image {})",
            self.user, self.server, self.port, self.database, self.runtime, self.network, self.image
        )
    }
}
