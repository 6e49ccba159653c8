//! # Run Configuration
//!
//! Settings for one run come from three layers, highest priority first:
//!
//! 1. command-line flags ([`FrameworkArgs`]),
//! 2. a YAML run-configuration file ([`RunConfig`]): `--config <file>`, or
//!    `<root>/cfglint.yaml` when it exists,
//! 3. the `CFGLINT_FRAMEWORK` environment variable (framework path only).
//!
//! Relative paths in the file are taken relative to the scan root.

use std::path::{Path, PathBuf};

use cfglint_core::CfglintError;
use clap::Args;
use serde::Deserialize;

/// File looked up in the scan root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "cfglint.yaml";

/// Environment variable naming the framework directory.
pub const FRAMEWORK_ENV: &str = "CFGLINT_FRAMEWORK";

/// Schema directory name inside the framework.
pub const DEFAULT_SCHEMA_DIR: &str = "schemas";

/// Directory under the root holding build output.
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Flags shared by every subcommand that needs the framework's schemas.
#[derive(Args, Debug, Clone, Default)]
pub struct FrameworkArgs {
    /// Project root to scan. Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Host framework installation directory.
    #[arg(long, value_name = "DIR")]
    pub framework: Option<PathBuf>,

    /// Framework package name, searched for under node_modules/ from the root upwards.
    #[arg(long, value_name = "NAME")]
    pub framework_name: Option<String>,

    /// Name of the schema directory inside the framework.
    #[arg(long, value_name = "NAME")]
    pub schema_dir_name: Option<String>,

    /// Directory to skip, relative to the root. Repeatable.
    #[arg(long = "exclude", value_name = "DIR")]
    pub excludes: Vec<PathBuf>,
}

/// Contents of a run-configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Framework directory.
    pub framework: Option<PathBuf>,
    /// Framework package name.
    pub framework_name: Option<String>,
    /// Schema directory name.
    pub schema_dir_name: Option<String>,
    /// Extra directories to skip.
    pub excludes: Vec<PathBuf>,
}

impl RunConfig {
    /// Read and decode the file at `path`.
    pub fn load(path: &Path) -> Result<Self, CfglintError> {
        let content = std::fs::read_to_string(path).map_err(|e| CfglintError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        // An empty file decodes as YAML null.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| CfglintError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load `explicit` if given, else `<root>/cfglint.yaml` if present, else defaults.
    pub fn discover(explicit: Option<&Path>, root: &Path) -> Result<Self, CfglintError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = root.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using run configuration");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Canonical scan root.
    pub root: PathBuf,
    /// Explicit framework directory, if configured anywhere.
    pub framework: Option<PathBuf>,
    /// Package name to search for when no directory is configured.
    pub framework_name: Option<String>,
    /// Schema directory name inside the framework.
    pub schema_dir_name: String,
    /// User exclusions as absolute paths.
    pub excludes: Vec<PathBuf>,
}

impl Settings {
    /// Merge flags, the run-configuration file and the environment.
    ///
    /// `env_framework` is the value of [`FRAMEWORK_ENV`], passed in by the
    /// caller.
    pub fn resolve(
        args: &FrameworkArgs,
        config_file: Option<&Path>,
        env_framework: Option<PathBuf>,
    ) -> Result<Self, CfglintError> {
        let root = match &args.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        let root = std::fs::canonicalize(&root).map_err(|e| CfglintError::Config {
            path: root.clone(),
            reason: format!("scan root is not accessible: {e}"),
        })?;
        let file = RunConfig::discover(config_file, &root)?;

        let framework = args
            .framework
            .clone()
            .or(file.framework)
            .or(env_framework)
            .map(|p| absolute(&root, &p));

        let excludes = file
            .excludes
            .iter()
            .chain(&args.excludes)
            .map(|p| absolute(&root, p))
            .collect();

        Ok(Self {
            framework,
            framework_name: args.framework_name.clone().or(file.framework_name),
            schema_dir_name: args
                .schema_dir_name
                .clone()
                .or(file.schema_dir_name)
                .unwrap_or_else(|| DEFAULT_SCHEMA_DIR.to_string()),
            excludes,
            root,
        })
    }

    /// The build output directory under the root.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.root.join(ARTIFACTS_DIR)
    }
}

/// Resolve `path` against `root`, canonicalising when it exists so it
/// compares equal to walked paths.
fn absolute(root: &Path, path: &Path) -> PathBuf {
    let joined = root.join(path);
    std::fs::canonicalize(&joined).unwrap_or(joined)
}
