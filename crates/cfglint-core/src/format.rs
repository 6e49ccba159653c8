//! # Config File Formats
//!
//! Only two formats are recognised, and only by their exact lowercase
//! extension: `.json` and `.yaml`. Anything else (including `.yml`) is not
//! a config file as far as the scan is concerned.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Structured-data format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    /// `.json` files, parsed strictly.
    Json,
    /// `.yaml` files.
    Yaml,
}

impl ConfigFormat {
    /// Map a bare extension (no leading dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(Self::Json),
            "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Detect the format from the last extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// The extension this format is recognised by, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// Upper-case label used in operator messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
