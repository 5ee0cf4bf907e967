//! Registry configuration module
//!
//! Handles loading and parsing of registry configuration from files and environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/areas.toml";

/// Area registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Path to the configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Flat file holding one committed region per line
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Maximum horizontal footprint (width x depth) of a single region
    #[serde(default = "default_protected_area_limit")]
    pub protected_area_limit: u64,

    /// Height the first corner of a tall region is pinned to
    #[serde(default = "default_world_floor")]
    pub world_floor: i32,

    /// Height the second corner of a tall region is pinned to
    #[serde(default = "default_world_ceiling")]
    pub world_ceiling: i32,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

// Default value functions
fn default_data_path() -> PathBuf {
    PathBuf::from("./data/area-list.txt")
}

fn default_protected_area_limit() -> u64 {
    2500 // 50 x 50 blocks
}

fn default_world_floor() -> i32 {
    0
}

fn default_world_ceiling() -> i32 {
    255
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            data_path: default_data_path(),
            protected_area_limit: default_protected_area_limit(),
            world_floor: default_world_floor(),
            world_ceiling: default_world_ceiling(),
            debug: false,
        }
    }
}

impl AreaConfig {
    /// Load configuration from file and environment variables
    pub async fn load() -> Result<Self> {
        let config_path = env::var("AREA_REGISTRY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path)
                .await
                .with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                })?;

            Self::from_toml(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.config_path = config_path;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration document, filling unset fields with defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("AREA_REGISTRY_DATA_PATH") {
            self.data_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("AREA_REGISTRY_AREA_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.protected_area_limit = limit;
            }
        }
        if let Ok(val) = env::var("AREA_REGISTRY_DEBUG") {
            self.debug = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Log filter directives used when `RUST_LOG` is not set
    pub fn log_directives(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.world_floor >= self.world_ceiling {
            anyhow::bail!(
                "World floor ({}) must be below world ceiling ({})",
                self.world_floor,
                self.world_ceiling
            );
        }

        if self.data_path.as_os_str().is_empty() {
            anyhow::bail!("Data path must not be empty");
        }

        Ok(())
    }
}
