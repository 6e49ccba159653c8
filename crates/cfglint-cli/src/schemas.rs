//! # Schemas Subcommand
//!
//! Lists the schemas the host framework provides, with the draft each is
//! evaluated under. Useful for checking which config files a scan will
//! pick up.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cfglint_core::TracingSink;
use cfglint_schema::SchemaRegistry;
use clap::Args;

use crate::config::{FrameworkArgs, Settings, FRAMEWORK_ENV};
use crate::host::{load_registry, locate_framework};

/// Arguments for the `cfglint schemas` subcommand.
#[derive(Args, Debug, Default)]
pub struct SchemasArgs {
    #[command(flatten)]
    pub framework: FrameworkArgs,
}

/// Execute the schemas subcommand.
pub fn run_schemas(args: &SchemasArgs, config: Option<&Path>) -> Result<u8> {
    let env_framework = std::env::var_os(FRAMEWORK_ENV).map(PathBuf::from);
    let settings = Settings::resolve(&args.framework, config, env_framework)
        .context("failed to resolve run settings")?;
    let framework = locate_framework(&settings)?;
    let registry = load_registry(&framework, &settings.schema_dir_name, &mut TracingSink)?;

    for line in schema_lines(&registry) {
        println!("{line}");
    }
    Ok(0)
}

/// One `name  draft  path` line per schema, sorted by name.
pub fn schema_lines(registry: &SchemaRegistry) -> Vec<String> {
    let names = registry.names();
    let width = names.iter().map(|n| n.as_str().len()).max().unwrap_or(0);
    names
        .into_iter()
        .filter_map(|name| registry.lookup(name.as_str()))
        .map(|doc| {
            format!(
                "{:<width$}  {:<8}  {}",
                doc.name().as_str(),
                doc.draft().to_string(),
                doc.path().display()
            )
        })
        .collect()
}
