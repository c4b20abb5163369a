//! Command-line argument parsing for sqlrun.

use clap::{Args, Parser, Subcommand};
use sqlrun::error::{RunnerError, Result};
use sqlrun::init::BOOTSTRAP_DATABASE;
use sqlrun::payload::PayloadKind;
use sqlrun::runner::Overrides;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

/// Run SQL statements through a containerized database client.
#[derive(Parser, Debug)]
#[command(name = "sqlrun")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Env file to layer under the process environment (default: nearest `.env`)
    #[arg(long, value_name = "PATH", global = true)]
    pub env_file: Option<PathBuf>,

    /// How connection parameters reach the executor payload
    #[arg(
        long,
        value_enum,
        value_name = "KIND",
        default_value_t = PayloadKind::Env,
        env = "SQLRUN_PAYLOAD",
        global = true
    )]
    pub payload: PayloadKind,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a SQL statement and print the result table
    Query(QueryArgs),

    /// Check that the runtime, image, network and database container are ready
    Check,

    /// Wait for the server, then replay a GO-delimited SQL script
    Init(InitArgs),

    /// Print the resolved configuration (password redacted)
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SQL text (reads stdin when neither SQL nor --file is given)
    #[arg(value_name = "SQL", conflicts_with = "file")]
    pub sql: Option<String>,

    /// Read the SQL statement from a file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Label printed above the result
    #[arg(short, long, value_name = "TEXT", default_value = "Query")]
    pub description: String,

    /// Container network (overrides SQL_DOCKER_NETWORK)
    #[arg(long, value_name = "NAME")]
    pub network: Option<String>,

    /// Client image (overrides SQL_DOCKER_IMAGE)
    #[arg(long, value_name = "IMAGE")]
    pub image: Option<String>,
}

impl QueryArgs {
    /// Returns the SQL text from the argument, the file, or stdin.
    pub fn read_sql(&self) -> Result<String> {
        if let Some(sql) = &self.sql {
            return Ok(sql.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path).map_err(|e| {
                RunnerError::config(format!("Failed to read {}: {e}", path.display()))
            });
        }
        let mut sql = String::new();
        std::io::stdin().read_to_string(&mut sql)?;
        Ok(sql)
    }

    /// Returns the per-call network and image overrides.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            network: self.network.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// SQL script to replay
    #[arg(long, value_name = "PATH")]
    pub script: PathBuf,

    /// Database to connect to while initializing
    #[arg(long, value_name = "NAME", default_value = BOOTSTRAP_DATABASE)]
    pub database: String,

    /// Connection attempts before giving up
    #[arg(long, value_name = "N", default_value_t = 30)]
    pub attempts: u32,

    /// Seconds between connection attempts
    #[arg(long, value_name = "SECS", default_value_t = 2)]
    pub interval_secs: u64,
}

impl InitArgs {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
