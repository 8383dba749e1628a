//! Configuration for a scene world

use crate::core::entity::hierarchy::DEFAULT_MAX_DEPTH;
use crate::core::entity::order::OrderStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Default log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors that can occur while loading a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error when reading the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunables for hierarchy maintenance and logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// How the traversal order is rebuilt after structural changes
    pub order_strategy: OrderStrategy,
    /// Cap on parent-chain walks; deeper chains are treated as cut off
    pub max_hierarchy_depth: usize,
    /// Fallback filter for [`crate::init_logging`]
    pub log_filter: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            order_strategy: OrderStrategy::default(),
            max_hierarchy_depth: DEFAULT_MAX_DEPTH,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl SceneConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        debug!(
            order_strategy = ?config.order_strategy,
            max_hierarchy_depth = config.max_hierarchy_depth,
            log_filter = %config.log_filter,
            "Parsed SceneConfig"
        );
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = ?path, "Loading scene config");

        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Write the configuration as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = ?path, "Saved scene config");
        Ok(())
    }
}
