//! kgraph-store: read-side collaborators for the kgraph query engine.
//!
//! Defines the `EntityStore` and `RelationStore` interfaces the engine is
//! built against, plus two implementations: an in-memory store for tests and
//! snapshot files, and a read-only Neo4j adapter. Every read is scoped to a
//! single `ScopeId`.

pub mod client;
pub mod error;
pub mod memory;
pub mod queries;
pub mod store;

pub use client::{GraphClient, GraphConfig};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{EntityStore, FindOptions, RelationStore};
