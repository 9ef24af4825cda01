//! Configuration management for the bar indexer
//!
//! Supports TOML-based configuration with environment variable overrides
//! for development and production deployments.

use crate::deployment;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use types::Address;

/// Complete indexer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Share token contract (the bar)
    pub bar_address: Address,

    /// Underlying asset held by the bar
    pub token_address: Address,

    /// JSON-RPC endpoint for logs and contract reads
    pub rpc_url: String,

    /// First block to scan when no cursor has been persisted yet
    pub start_block: u64,

    /// Blocks per eth_getLogs request
    pub batch_size: u64,

    /// Delay between polls once the feed reaches the chain head
    pub poll_interval_ms: u64,

    /// Snapshot directory (None = in-memory only)
    pub data_dir: Option<PathBuf>,

    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            // Constants are checked by deployment::tests
            bar_address: deployment::BAR_ADDRESS.parse().unwrap_or_default(),
            token_address: deployment::UNDERLYING_TOKEN_ADDRESS
                .parse()
                .unwrap_or_default(),
            rpc_url: "http://localhost:8545".to_string(),
            start_block: 0,
            batch_size: 2_000,
            poll_interval_ms: 5_000,
            data_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl IndexerConfig {
    /// Load configuration from TOML file
    pub fn from_toml_file(file_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file: {:?}", file_path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {:?}", file_path))
    }

    /// Load configuration from TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    /// Load configuration with environment variable overrides
    ///
    /// A missing file falls back to defaults so the binary can run from
    /// environment variables alone.
    pub fn from_toml_with_env_overrides(file_path: &Path) -> Result<Self> {
        let mut config = if file_path.exists() {
            info!("Loading indexer config from {:?}", file_path);
            Self::from_toml_file(file_path)?
        } else {
            debug!("Config file {:?} not found, using defaults", file_path);
            Self::default()
        };

        config.apply_env_overrides()?;
        config.expand_paths()?;

        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(url) = env::var("BAR_INDEXER_RPC_URL") {
            self.rpc_url = url;
        }

        if let Ok(block) = env::var("BAR_INDEXER_START_BLOCK") {
            self.start_block = block
                .parse()
                .with_context(|| format!("Invalid BAR_INDEXER_START_BLOCK: {}", block))?;
        }

        if let Ok(dir) = env::var("BAR_INDEXER_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }

        if let Ok(level) = env::var("BAR_INDEXER_LOG_LEVEL") {
            self.log_level = level;
        }

        Ok(())
    }

    /// Expand `~` and `$VARS` in the data directory
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(dir) = &self.data_dir {
            let raw = dir.to_string_lossy();
            let expanded =
                shellexpand::full(&raw).context("Failed to expand data_dir")?;
            self.data_dir = Some(PathBuf::from(expanded.as_ref()));
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.bar_address.is_zero() {
            return Err(anyhow::anyhow!("bar_address cannot be the zero address"));
        }

        if self.token_address.is_zero() {
            return Err(anyhow::anyhow!("token_address cannot be the zero address"));
        }

        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "RPC URL must start with http:// or https://"
            ));
        }

        if self.batch_size == 0 {
            return Err(anyhow::anyhow!("batch_size must be greater than 0"));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Save configuration to TOML file
    pub fn save_toml_file(&self, file_path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        std::fs::write(file_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", file_path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = IndexerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.bar_address.to_hex(),
            deployment::BAR_ADDRESS.to_lowercase()
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = IndexerConfig::from_toml_str(
            r#"
rpc_url = "https://rpc.example.org"
start_block = 12345
"#,
        )
        .unwrap();

        assert_eq!(config.rpc_url, "https://rpc.example.org");
        assert_eq!(config.start_block, 12345);
        assert_eq!(config.batch_size, 2_000);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = IndexerConfig::default();
        config.rpc_url = "ws://localhost:8546".to_string();
        assert!(config.validate().is_err());

        let mut config = IndexerConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = IndexerConfig::default();
        config.bar_address = Address::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indexer.toml");

        let mut config = IndexerConfig::default();
        config.data_dir = Some(dir.path().join("snapshots"));
        config.save_toml_file(&path).unwrap();

        let reloaded = IndexerConfig::from_toml_file(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("BAR_INDEXER_RPC_URL", "https://override.example.org");
        env::set_var("BAR_INDEXER_START_BLOCK", "777");

        let mut config = IndexerConfig::default();
        config.apply_env_overrides().unwrap();

        assert_eq!(config.rpc_url, "https://override.example.org");
        assert_eq!(config.start_block, 777);

        env::remove_var("BAR_INDEXER_RPC_URL");
        env::remove_var("BAR_INDEXER_START_BLOCK");
    }
}
