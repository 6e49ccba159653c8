//! # Host Framework
//!
//! Finding the framework installation, the schemas it ships, and the
//! directories a scan must never descend into.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cfglint_core::{CfglintError, Diagnostic, DiagnosticSink};
use cfglint_schema::SchemaRegistry;

use crate::config::Settings;

/// Directory packages are installed into.
const PACKAGE_DIR: &str = "node_modules";

/// Locate the framework directory.
///
/// A configured path must be a directory. Otherwise the first
/// `node_modules/<framework_name>` directory found from the root upwards is
/// used.
pub fn locate_framework(settings: &Settings) -> Result<PathBuf, CfglintError> {
    if let Some(path) = &settings.framework {
        return if path.is_dir() {
            Ok(path.clone())
        } else {
            Err(CfglintError::FrameworkNotFound(format!(
                "{} is not a directory",
                path.display()
            )))
        };
    }

    let Some(name) = &settings.framework_name else {
        return Err(CfglintError::FrameworkNotFound(
            "no framework path or name configured".to_string(),
        ));
    };
    settings
        .root
        .ancestors()
        .map(|dir| dir.join(PACKAGE_DIR).join(name))
        .find(|candidate| candidate.is_dir())
        .ok_or_else(|| {
            CfglintError::FrameworkNotFound(format!(
                "no {PACKAGE_DIR}/{name} found from {} upwards",
                settings.root.display()
            ))
        })
}

/// Directories the walker prunes: the artifacts directory, the framework,
/// its `<name>-*` add-on siblings, and the user's exclusions.
pub fn excluded_dirs(settings: &Settings, framework: &Path) -> Vec<PathBuf> {
    let mut excludes = vec![settings.artifacts_dir(), framework.to_path_buf()];

    let sibling_prefix = framework
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| format!("{n}-"));
    if let (Some(parent), Some(prefix)) = (framework.parent(), sibling_prefix) {
        if let Ok(entries) = std::fs::read_dir(parent) {
            let mut addons: Vec<PathBuf> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_dir()
                        && path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| n.starts_with(&prefix))
                })
                .collect();
            addons.sort();
            excludes.extend(addons);
        }
    }

    excludes.extend(settings.excludes.iter().cloned());
    tracing::debug!(?excludes, "excluded directories");
    excludes
}

/// Build the registry for a run from `<framework>/<dir_name>`.
///
/// A missing directory is reported as a debug diagnostic before failing.
///
/// # Errors
///
/// Fails with [`CfglintError::NoSchemas`] if nothing was found, and on any
/// schema that cannot be loaded.
pub fn load_registry(
    framework: &Path,
    dir_name: &str,
    sink: &mut dyn DiagnosticSink,
) -> Result<SchemaRegistry> {
    let dir = framework.join(dir_name);
    if !dir.is_dir() {
        sink.emit(Diagnostic::SchemaDirMissing { path: dir.clone() });
        return Err(CfglintError::NoSchemas(dir).into());
    }

    let registry = SchemaRegistry::load_dir(&dir)
        .with_context(|| format!("failed to load schemas from {}", dir.display()))?;
    if registry.is_empty() {
        return Err(CfglintError::NoSchemas(dir).into());
    }
    Ok(registry)
}
