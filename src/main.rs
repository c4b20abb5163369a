//! sqlrun - Run SQL statements through a containerized database client.

mod cli;

use cli::{Cli, Command, InitArgs, QueryArgs};
use sqlrun::config::{EnvLayer, Settings};
use sqlrun::error::{RunnerError, Result};
use sqlrun::init::{self, WaitPolicy};
use sqlrun::logging;
use sqlrun::preflight;
use sqlrun::runner::QueryRunner;
use sqlrun::runtime::{ContainerRuntime, DockerCli};
use std::io::{self, Write};
use tracing::{debug, info};

fn main() {
    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            debug!("Command failed: {e:?}");
            eprintln!("{}", e.report());
            std::process::exit(1);
        }
    }
}

/// Runs the selected command and returns the process exit code.
fn run(cli: Cli) -> Result<i32> {
    let env = load_env(&cli)?;
    let settings = Settings::from_env(&env)?;
    info!("Settings: {}", settings.display_string());

    let runtime = DockerCli::new(&settings.runtime);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let code = match &cli.command {
        Command::Query(args) => run_query(&cli, args, &settings, &runtime, &mut out),
        Command::Check => {
            preflight::validate(&settings, &runtime, &mut out)?;
            writeln!(out, "Environment OK: {}", settings.display_string())?;
            Ok(0)
        }
        Command::Init(args) => run_init(&cli, args, &settings, &runtime, &mut out),
        Command::Config { json } => {
            print_config(&settings, env.source(), *json, &mut out)?;
            Ok(0)
        }
    }?;

    out.flush()?;
    Ok(code)
}

/// Builds the environment layer from `--env-file` or the nearest `.env`.
fn load_env(cli: &Cli) -> Result<EnvLayer> {
    match &cli.env_file {
        Some(path) => {
            let mut env = EnvLayer::from_process();
            env.apply_env_file(path)?;
            Ok(env)
        }
        None => Ok(EnvLayer::load(&std::env::current_dir()?)),
    }
}

fn run_query<W: Write>(
    cli: &Cli,
    args: &QueryArgs,
    settings: &Settings,
    runtime: &dyn ContainerRuntime,
    out: &mut W,
) -> Result<i32> {
    let sql = args.read_sql()?;
    let runner = QueryRunner::new(settings, runtime).with_payload(cli.payload.strategy());
    let execution = runner.execute(&sql, &args.description, &args.overrides(), out)?;
    Ok(if execution.succeeded() { 0 } else { 1 })
}

fn run_init<W: Write>(
    cli: &Cli,
    args: &InitArgs,
    settings: &Settings,
    runtime: &dyn ContainerRuntime,
    out: &mut W,
) -> Result<i32> {
    let settings = settings.with_database(&args.database);
    let runner = QueryRunner::new(&settings, runtime).with_payload(cli.payload.strategy());
    let policy = WaitPolicy {
        attempts: args.attempts,
        interval: args.interval(),
    };

    if !init::wait_for_server(&runner, &policy, out)? {
        writeln!(out, "✗ Could not connect to SQL Server")?;
        return Ok(1);
    }

    let summary = init::replay_file(&runner, &args.script, out)?;
    if summary.is_clean() {
        writeln!(out, "\n✓ Database initialized successfully!")?;
        Ok(0)
    } else {
        writeln!(
            out,
            "\n✗ {} of {} batches failed",
            summary.failed.len(),
            summary.total
        )?;
        Ok(1)
    }
}

fn print_config<W: Write>(
    settings: &Settings,
    source: Option<&std::path::Path>,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let shown = settings.redacted();
    if json {
        let text = serde_json::to_string_pretty(&shown)
            .map_err(|e| RunnerError::internal(format!("Failed to serialize settings: {e}")))?;
        writeln!(out, "{text}")?;
        return Ok(());
    }

    match source {
        Some(path) => writeln!(out, "# env file: {}", path.display())?,
        None => writeln!(out, "# env file: none")?,
    }
    writeln!(out, "network      = {}", shown.network)?;
    writeln!(out, "image        = {}", shown.image)?;
    writeln!(out, "server       = {}", shown.server)?;
    writeln!(out, "port         = {}", shown.port)?;
    writeln!(out, "user         = {}", shown.user)?;
    writeln!(out, "password     = {}", shown.password)?;
    writeln!(out, "database     = {}", shown.database)?;
    writeln!(out, "db_container = {}", shown.db_container)?;
    writeln!(out, "runtime      = {}", shown.runtime)?;
    writeln!(out, "interpreter  = {}", shown.interpreter)?;
    Ok(())
}
