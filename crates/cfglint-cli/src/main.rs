//! # cfglint entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cfglint_cli::schemas::{run_schemas, SchemasArgs};
use cfglint_cli::validate::{run_validate, ValidateArgs};

/// Validate project configuration files against the host framework's schemas.
#[derive(Parser, Debug)]
#[command(name = "cfglint", version, about, long_about = None)]
struct Cli {
    /// Increase log detail. Repeat for more (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only show warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit log events as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a run-configuration file (default: <root>/cfglint.yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every config file under the project root.
    Validate(ValidateArgs),

    /// List the schemas provided by the host framework.
    Schemas(SchemasArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal());
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "cfglint starting");

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, config),
        Commands::Schemas(args) => run_schemas(&args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
