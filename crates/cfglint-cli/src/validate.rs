//! # Validate Subcommand
//!
//! Scans a project root and validates every config file whose base name
//! matches one of the host framework's schemas.
//!
//! Per-file problems are diagnostics: the scan always covers the whole tree
//! unless something fatal happens (framework missing, no schemas, a broken
//! schema, an unreadable directory).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cfglint_core::{DiagnosticSink, TracingSink};
use cfglint_schema::{Checker, ScanSummary};
use clap::Args;

use crate::config::{FrameworkArgs, Settings, FRAMEWORK_ENV};
use crate::host::{excluded_dirs, load_registry, locate_framework};
use crate::walk::walk_files;

/// Printed after a completed scan.
pub const DONE_MESSAGE: &str = "cfglint validate done.";

/// Arguments for the `cfglint validate` subcommand.
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub framework: FrameworkArgs,

    /// Exit with status 1 if any file has violations or cannot be parsed.
    #[arg(long)]
    pub strict: bool,

    /// Print the scan summary as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the validate subcommand.
///
/// Returns the exit code: 0, or 1 under `--strict` when the scan was not
/// clean.
pub fn run_validate(args: &ValidateArgs, config: Option<&Path>) -> Result<u8> {
    let env_framework = std::env::var_os(FRAMEWORK_ENV).map(PathBuf::from);
    let settings = Settings::resolve(&args.framework, config, env_framework)
        .context("failed to resolve run settings")?;

    let summary = scan(&settings, &mut TracingSink)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    println!("{DONE_MESSAGE}");

    Ok(if args.strict && !summary.is_clean() { 1 } else { 0 })
}

/// Locate the framework, load its schemas, and check every file under the root.
pub fn scan(settings: &Settings, sink: &mut dyn DiagnosticSink) -> Result<ScanSummary> {
    let framework = locate_framework(settings)?;
    tracing::debug!(framework = %framework.display(), "located host framework");

    let registry = load_registry(&framework, &settings.schema_dir_name, sink)?;
    let excludes = excluded_dirs(settings, &framework);
    let checker = Checker::new(&registry);

    let mut summary = ScanSummary::default();
    for file in walk_files(&settings.root, &excludes) {
        let file = file?;
        let outcome = checker
            .check_file(&file, sink)
            .with_context(|| format!("cannot validate {}", file.display()))?;
        summary.record(outcome);
    }

    tracing::debug!(
        scanned = summary.scanned,
        violations = summary.violations,
        "scan complete"
    );
    Ok(summary)
}
