//! TOML configuration file support.
//!
//! Store settings can be kept in a file instead of passed as flags:
//!
//! ```toml
//! # mzscan.toml
//! [store]
//! window_size = 65536
//! tail_size = 1024
//! force_sequential = false
//! verify_trailer = true
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use mzscan::store::StoreConfig;

/// Root configuration structure for mzscan.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Settings used when opening scan files.
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
