//! PerfectPick Likes
//!
//! Graph storage layer for user/media relationships:
//! - Like / dislike / block preferences (PREF edges)
//! - Numeric ratings with per-media averages (RTE edges)
//! - Wishlists (WSH edges)
//!
//! Backed by Neo4j. Request routing lives outside this crate and calls into
//! [`likes::LikesManager`].

pub mod error;
pub mod likes;
pub mod neo4j;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{Result, StoreError};
pub use likes::LikesManager;

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Config file looked up in the working directory when no path is given
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub neo4j: Neo4jYamlConfig,
    pub pool: PoolYamlConfig,
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Target database; the server default when absent
    pub database: Option<String>,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "neo4j".into(),
            database: None,
        }
    }
}

/// Connection pool section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolYamlConfig {
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for PoolYamlConfig {
    fn default() -> Self {
        Self {
            max_connections: 16,
            fetch_size: 200,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_database: Option<String>,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Config {
    /// Load configuration from environment variables and `config.yaml` in CWD, if any
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> anyhow::Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        Ok(Self {
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            neo4j_database: std::env::var("NEO4J_DATABASE")
                .ok()
                .or(yaml.neo4j.database),
            max_connections: std::env::var("NEO4J_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.pool.max_connections),
            fetch_size: std::env::var("NEO4J_FETCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.pool.fetch_size),
        })
    }

    /// Read the YAML layer, falling back to defaults when the file is absent,
    /// unreadable or malformed. Only a missing file is silent.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let path = yaml_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using env and defaults");
                return YamlConfig::default();
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config file unreadable, using defaults");
                return YamlConfig::default();
            }
        };

        serde_yaml::from_str(&contents)
            .map(|config| {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            })
            .unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                YamlConfig::default()
            })
    }
}

/// Shared application state handed to request handlers
#[derive(Clone)]
pub struct AppState {
    pub likes: LikesManager,
    pub config: Arc<Config>,
}

impl AppState {
    /// Connect to Neo4j and build the manager
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let neo4j = Arc::new(neo4j::Neo4jClient::new(&config).await?);

        Ok(Self {
            likes: LikesManager::new(neo4j),
            config: Arc::new(config),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
