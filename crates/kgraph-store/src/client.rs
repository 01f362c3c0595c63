//! Neo4j connection handling for the read-only store adapter.

use std::time::Instant;

use neo4rs::{query, ConfigBuilder, Graph, Query, Row};

use crate::error::{Result, StoreError};

/// Where and how to reach Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database name. `None` uses the server default.
    pub database: Option<String>,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "kgraph-dev".to_string(),
            database: None,
            max_connections: 16,
            fetch_size: 256,
        }
    }
}

/// Pooled Neo4j handle serving `EntityStore` and `RelationStore` reads
/// (see `queries`). Clone is cheap.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Open the pool and run a trivial query so bad credentials fail here
    /// rather than on the first store call.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let client = Self { graph };
        client.ping().await?;

        tracing::info!(uri = %config.uri, database = ?config.database, "Connected to Neo4j");
        Ok(client)
    }

    /// Round-trip `RETURN 1`.
    pub async fn ping(&self) -> Result<()> {
        self.query_one(query("RETURN 1 AS ok"))
            .await
            .map_err(|e| StoreError::Connection(format!("Neo4j ping failed: {e}")))?
            .ok_or_else(|| StoreError::Connection("Neo4j ping returned no rows".to_string()))?;
        Ok(())
    }

    /// Raw driver handle, for fixtures and admin tooling.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    /// Stream a read query to completion.
    pub async fn query_rows(&self, q: Query) -> Result<Vec<Row>> {
        let started = Instant::now();
        let mut stream = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        tracing::trace!(
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cypher read"
        );
        Ok(rows)
    }

    /// First row of a read query, if any.
    pub async fn query_one(&self, q: Query) -> Result<Option<Row>> {
        let mut stream = self.graph.execute(q).await?;
        Ok(stream.next().await?)
    }
}
