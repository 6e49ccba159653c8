//! # Error Types: Run-Level Failures
//!
//! Errors in this module abort a whole run. Per-file problems (syntax
//! errors, unmatched files) are never errors in this sense; they become
//! diagnostics and the scan moves on.
//!
//! Schema-specific failures (unreadable or malformed schema documents,
//! invalid patterns) live in `cfglint-schema` next to the code that raises
//! them.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a cfglint run.
#[derive(Error, Debug)]
pub enum CfglintError {
    /// The host framework installation could not be located.
    #[error("cannot find host framework: {0}")]
    FrameworkNotFound(String),

    /// The framework's schema directory yielded no schema documents.
    #[error("cannot find configuration schemas in {}", .0.display())]
    NoSchemas(PathBuf),

    /// Walking the scan root failed.
    #[error("cannot traverse {}: {source}", path.display())]
    Traversal {
        /// Entry at which traversal failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The run configuration file is unreadable or malformed.
    #[error("invalid run configuration {}: {reason}", path.display())]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
