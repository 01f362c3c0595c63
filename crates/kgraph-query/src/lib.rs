//! kgraph-query: Tenant-scoped read queries over the kgraph knowledge graph.
//!
//! Wraps an `EntityStore` and a `RelationStore` and answers four questions
//! about one scope at a time: what is in it (bounded listing), what is near
//! an entity (breadth-first traversal), how two entities connect (fewest-hop
//! path), and what touches an entity (one-hop neighbors). Nothing is
//! written; every call builds its working state from scratch.

pub mod context;
pub mod error;
pub mod fetch;
pub mod neighbors;
pub mod path;
pub mod scope;
pub mod traversal;
pub mod types;

pub use context::QueryContext;
pub use error::QueryError;
pub use traversal::TraverseParams;
pub use types::{FullGraphOptions, NeighborOptions, PathOptions, TraverseOptions};

use std::sync::Arc;
use std::time::Instant;

use kgraph_core::{EntityId, GraphView, Neighbor, PathView, QueryConfig, ScopeId};
use kgraph_store::{EntityStore, RelationStore};

use crate::types::{check_depth, check_limit};

/// The query engine. Cheap to clone; holds only shared store handles and
/// configuration.
#[derive(Clone)]
pub struct GraphQueryEngine {
    entities: Arc<dyn EntityStore>,
    relations: Arc<dyn RelationStore>,
    config: QueryConfig,
}

impl GraphQueryEngine {
    /// Create an engine over separate entity and relation stores with
    /// default configuration.
    pub fn new(entities: Arc<dyn EntityStore>, relations: Arc<dyn RelationStore>) -> Self {
        Self {
            entities,
            relations,
            config: QueryConfig::default(),
        }
    }

    /// Create an engine over one backend that serves both roles.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: EntityStore + RelationStore + 'static,
    {
        Self::new(store.clone(), store)
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Bounded listing of a scope: up to `limit` entities and, separately,
    /// up to `limit` relations. The two halves need not reference each other.
    pub async fn full_graph(
        &self,
        ctx: &QueryContext,
        scope: &ScopeId,
        options: &FullGraphOptions,
    ) -> error::Result<GraphView> {
        let limit = check_limit("limit", options.limit.unwrap_or(self.config.full_graph_limit))?;
        let ctx = self.bounded(ctx);
        let started = Instant::now();

        let view = fetch::fetch_scope_graph(
            &ctx,
            self.entities.as_ref(),
            self.relations.as_ref(),
            scope,
            limit,
        )
        .await?;

        tracing::info!(
            scope = %scope,
            nodes = view.nodes.len(),
            edges = view.edges.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Full graph listed"
        );
        Ok(view)
    }

    /// Breadth-first traversal from `start`, following relations both ways.
    ///
    /// A missing start entity yields an empty view. `max_depth` 0 returns the
    /// start entity alone.
    pub async fn traverse(
        &self,
        ctx: &QueryContext,
        scope: &ScopeId,
        start: &EntityId,
        options: &TraverseOptions,
    ) -> error::Result<GraphView> {
        let max_depth = check_depth(
            "max_depth",
            options.max_depth.unwrap_or(self.config.traverse_max_depth),
            self.config.max_depth_cap,
        )?;
        let limit = check_limit("limit", options.limit.unwrap_or(self.config.traverse_limit))?;
        let params = TraverseParams {
            max_depth,
            limit,
            entity_types: options.entity_types.as_deref(),
            relation_types: options.relation_types.as_deref(),
            concurrency: self.config.fetch_concurrency,
        };
        let ctx = self.bounded(ctx);
        let started = Instant::now();

        let view = traversal::traverse(
            &ctx,
            self.entities.as_ref(),
            self.relations.as_ref(),
            scope,
            start,
            &params,
        )
        .await?;

        tracing::info!(
            scope = %scope,
            start = %start,
            max_depth,
            nodes = view.nodes.len(),
            edges = view.edges.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Traversal complete"
        );
        Ok(view)
    }

    /// Fewest-hop path from `source` to `target`, ignoring relation
    /// direction. `Ok(None)` means no path within `max_depth`.
    pub async fn find_path(
        &self,
        ctx: &QueryContext,
        scope: &ScopeId,
        source: &EntityId,
        target: &EntityId,
        options: &PathOptions,
    ) -> error::Result<Option<PathView>> {
        let max_depth = check_depth(
            "max_depth",
            options.max_depth.unwrap_or(self.config.path_max_depth),
            self.config.max_depth_cap,
        )?;
        let ctx = self.bounded(ctx);
        let started = Instant::now();

        let path = path::shortest_path(
            &ctx,
            self.entities.as_ref(),
            self.relations.as_ref(),
            scope,
            source,
            target,
            max_depth,
            self.config.fetch_concurrency,
        )
        .await?;

        tracing::info!(
            scope = %scope,
            source = %source,
            target = %target,
            hops = path.as_ref().map(|p| p.hops()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Path search complete"
        );
        Ok(path)
    }

    /// Relations touching `entity_id` that match the direction and type
    /// filters, each paired with the entity on the other end.
    pub async fn neighbors(
        &self,
        ctx: &QueryContext,
        scope: &ScopeId,
        entity_id: &EntityId,
        options: &NeighborOptions,
    ) -> error::Result<Vec<Neighbor>> {
        let ctx = self.bounded(ctx);

        let found = neighbors::neighbors(
            &ctx,
            self.entities.as_ref(),
            self.relations.as_ref(),
            scope,
            entity_id,
            options.direction,
            options.relation_types.as_deref(),
        )
        .await?;

        tracing::debug!(
            scope = %scope,
            entity = %entity_id,
            direction = %options.direction,
            count = found.len(),
            "Neighbors listed"
        );
        Ok(found)
    }

    fn bounded(&self, ctx: &QueryContext) -> QueryContext {
        ctx.clone().or_timeout(self.config.timeout())
    }
}
