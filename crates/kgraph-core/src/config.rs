//! Configuration for the kgraph query engine.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`KGRAPH__QUERY__` prefix)
//! 2. Config file (`kgraph.toml`, `[query]` section)
//! 3. Defaults

use std::time::Duration;

use serde::Deserialize;

use crate::error::{KgraphError, Result};

/// Engine-wide defaults and hard bounds.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QueryConfig {
    /// Per-kind fetch bound for full-graph listings (default: 1000).
    #[serde(default = "default_full_graph_limit")]
    pub full_graph_limit: usize,

    /// Traversal depth when the caller gives none (default: 3).
    #[serde(default = "default_traverse_max_depth")]
    pub traverse_max_depth: u32,

    /// Node cap for traversals when the caller gives none (default: 1000).
    #[serde(default = "default_traverse_limit")]
    pub traverse_limit: usize,

    /// Search depth for path queries when the caller gives none (default: 6).
    #[serde(default = "default_path_max_depth")]
    pub path_max_depth: u32,

    /// Largest depth any caller may request (default: 32).
    #[serde(default = "default_max_depth_cap")]
    pub max_depth_cap: u32,

    /// Concurrent relation fetches within one BFS layer (default: 8).
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Per-query deadline in milliseconds. None = no deadline.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_full_graph_limit() -> usize {
    1000
}

fn default_traverse_max_depth() -> u32 {
    3
}

fn default_traverse_limit() -> usize {
    1000
}

fn default_path_max_depth() -> u32 {
    6
}

fn default_max_depth_cap() -> u32 {
    32
}

fn default_fetch_concurrency() -> usize {
    8
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            full_graph_limit: default_full_graph_limit(),
            traverse_max_depth: default_traverse_max_depth(),
            traverse_limit: default_traverse_limit(),
            path_max_depth: default_path_max_depth(),
            max_depth_cap: default_max_depth_cap(),
            fetch_concurrency: default_fetch_concurrency(),
            timeout_ms: None,
        }
    }
}

impl QueryConfig {
    /// Load from `<file_prefix>.toml` and `KGRAPH__QUERY__*` env vars.
    ///
    /// A missing file or missing `[query]` section yields defaults; a present
    /// but malformed section is an error.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("KGRAPH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded = match cfg.get::<QueryConfig>("query") {
            Ok(c) => c,
            Err(config::ConfigError::NotFound(_)) => QueryConfig::default(),
            Err(e) => return Err(e.into()),
        };

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.full_graph_limit == 0 {
            return Err(KgraphError::Config(
                "query.full_graph_limit must be greater than 0".to_string(),
            ));
        }
        if self.traverse_limit == 0 {
            return Err(KgraphError::Config(
                "query.traverse_limit must be greater than 0".to_string(),
            ));
        }
        if self.fetch_concurrency == 0 {
            return Err(KgraphError::Config(
                "query.fetch_concurrency must be greater than 0".to_string(),
            ));
        }
        if self.traverse_max_depth > self.max_depth_cap || self.path_max_depth > self.max_depth_cap
        {
            return Err(KgraphError::Config(format!(
                "default depths must not exceed query.max_depth_cap ({})",
                self.max_depth_cap
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueryConfig::default();
        assert_eq!(config.full_graph_limit, 1000);
        assert_eq!(config.traverse_max_depth, 3);
        assert_eq!(config.path_max_depth, 6);
        assert_eq!(config.max_depth_cap, 32);
        assert_eq!(config.fetch_concurrency, 8);
        assert!(config.timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let config = QueryConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config, QueryConfig::default());
    }

    #[test]
    fn test_load_partial_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kgraph.toml");
        std::fs::write(
            &path,
            "[query]\ntraverse_max_depth = 5\ntimeout_ms = 2500\n",
        )
        .unwrap();

        let prefix = dir.path().join("kgraph");
        let config = QueryConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.traverse_max_depth, 5);
        assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.full_graph_limit, 1000);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = QueryConfig {
            fetch_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(KgraphError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_default_depth_over_cap() {
        let config = QueryConfig {
            max_depth_cap: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
