//! Local CLI configuration.
//!
//! Stores which server and organization this machine talks to. The
//! password is never written anywhere; it is prompted for per run and
//! the keys are re-derived each time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-machine chatpool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Server base URL.
    pub server_url: String,
    /// Default organization slug.
    pub org_slug: String,
}

impl CliConfig {
    /// Load configuration from a data directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("config.json");
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Not configured yet. Run 'chatpool signup' first.")?;
        serde_json::from_str(&contents).context("Invalid configuration file")
    }

    /// Save configuration to a data directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join("config.json");
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save configuration")?;
        Ok(())
    }
}
