//! kgraph-core: Shared types, configuration, and error handling for kgraph.
//!
//! This crate provides the foundational types used across all kgraph crates:
//! - Entities and relations of a scope's knowledge graph
//! - Property values (JSON-shaped tagged union)
//! - Graph, path, and neighbor views returned by the query engine
//! - JSON graph snapshots for fixtures and offline use
//! - Query engine configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod snapshot;
pub mod types;

pub use config::QueryConfig;
pub use error::KgraphError;
pub use snapshot::GraphSnapshot;
pub use types::{
    Direction, Entity, EntityId, GraphView, Neighbor, PathView, Properties, PropertyValue,
    Relation, RelationId, ScopeId,
};
