//! # Bar Indexer Configuration
//!
//! Deployment constants and configuration loading shared by the indexer
//! services.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use staking_config::{deployment, IndexerConfig};
//! use std::path::Path;
//!
//! let config = IndexerConfig::from_toml_with_env_overrides(Path::new("indexer.toml"))?;
//! config.validate()?;
//! println!("indexing bar {} (default {})", config.bar_address, deployment::BAR_ADDRESS);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod deployment;
pub mod indexer_config;

pub use indexer_config::IndexerConfig;
