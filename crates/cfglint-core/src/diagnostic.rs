//! # Diagnostics
//!
//! Everything the validation pipeline has to tell an operator goes through
//! a [`DiagnosticSink`] as a typed [`Diagnostic`]. Each variant has a fixed
//! [`Severity`]:
//!
//! | Diagnostic | Severity |
//! |---|---|
//! | `SchemaDirMissing` | debug |
//! | `ParseFailed` | error |
//! | `SyntaxDetail` | warn |
//! | `Passed` | info |
//! | `ViolationsFound` | error |
//! | `Violation` | warn |
//!
//! A parse failure is always an error/warn pair: `ParseFailed` names the
//! file, `SyntaxDetail` carries the decoder's explanation. A file with
//! violations yields one `ViolationsFound` header followed by one
//! `Violation` per record, in report order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::ConfigFormat;

/// Log level of a diagnostic, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Internal detail, hidden by default.
    Debug,
    /// Progress and pass messages.
    Info,
    /// Per-item problems: syntax detail, individual violations.
    Warn,
    /// Per-file failures: unparseable file, violation header.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One operator-facing message produced during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The host framework has no schema directory at `path`.
    SchemaDirMissing {
        /// Directory that was probed.
        path: PathBuf,
    },

    /// A config file could not be decoded.
    ParseFailed {
        /// The offending file.
        path: PathBuf,
        /// The format it was decoded as.
        format: ConfigFormat,
    },

    /// Decoder explanation accompanying a [`Diagnostic::ParseFailed`].
    SyntaxDetail {
        /// The offending file.
        path: PathBuf,
        /// Human-readable syntax error, possibly multi-line.
        detail: String,
    },

    /// A config file satisfied its schema.
    Passed {
        /// The validated file.
        path: PathBuf,
    },

    /// Header preceding the violations of one file.
    ViolationsFound {
        /// The validated file.
        path: PathBuf,
        /// Number of `Violation` diagnostics that follow.
        count: usize,
    },

    /// A single schema violation, rendered for display.
    Violation {
        /// The validated file.
        path: PathBuf,
        /// Display trail into the config value, e.g. `context -> routes[0]`.
        config: String,
        /// Constraint failure message.
        message: String,
    },
}

impl Diagnostic {
    /// Fixed severity of this diagnostic kind.
    pub fn severity(&self) -> Severity {
        match self {
            Self::SchemaDirMissing { .. } => Severity::Debug,
            Self::ParseFailed { .. } | Self::ViolationsFound { .. } => Severity::Error,
            Self::SyntaxDetail { .. } | Self::Violation { .. } => Severity::Warn,
            Self::Passed { .. } => Severity::Info,
        }
    }

    /// The file or directory the diagnostic refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::SchemaDirMissing { path }
            | Self::ParseFailed { path, .. }
            | Self::SyntaxDetail { path, .. }
            | Self::Passed { path }
            | Self::ViolationsFound { path, .. }
            | Self::Violation { path, .. } => path,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaDirMissing { path } => {
                write!(f, "no schemas found at {}", path.display())
            }
            Self::ParseFailed { path, format } => {
                write!(f, "{format} parse error in file: {}", path.display())
            }
            Self::SyntaxDetail { detail, .. } => f.write_str(detail),
            Self::Passed { path } => {
                write!(f, "config validation passed ({}).", path.display())
            }
            Self::ViolationsFound { path, .. } => {
                write!(f, "possible errors in config file: {}", path.display())
            }
            Self::Violation { config, message, .. } => {
                write!(f, "{{ config: {config}, message: {message} }}")
            }
        }
    }
}

/// Destination for diagnostics.
pub trait DiagnosticSink {
    /// Accept one diagnostic. Sinks must not reorder what they receive.
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` at their severity.
///
/// Violations carry the display trail in a structured `config` field so a
/// JSON subscriber keeps it separate from the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::Violation { path, config, message } => {
                tracing::warn!(file = %path.display(), config = %config, "{message}");
            }
            other => match other.severity() {
                Severity::Debug => tracing::debug!("{other}"),
                Severity::Info => tracing::info!("{other}"),
                Severity::Warn => tracing::warn!("{other}"),
                Severity::Error => tracing::error!("{other}"),
            },
        }
    }
}

/// Records diagnostics in arrival order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    diagnostics: Vec<Diagnostic>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded diagnostics, oldest first.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Recorded diagnostics of one severity, oldest first.
    pub fn at(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity() == severity)
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Consumes the sink and returns the recorded diagnostics.
    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
