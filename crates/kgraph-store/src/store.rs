//! Collaborator interfaces consumed by the query engine.
//!
//! Implementations must scope every read to the given `ScopeId`. The engine
//! double-checks ownership, but a store that leaks across scopes is broken.

use async_trait::async_trait;

use kgraph_core::{Entity, EntityId, Relation, ScopeId};

use crate::error::Result;

/// Bounds for bulk fetches. `limit: None` means "whatever the store returns".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }

    pub fn unbounded() -> Self {
        Self { limit: None }
    }
}

/// Read access to entities.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// `Ok(None)` when the entity does not exist in `scope`.
    async fn find_by_id(&self, scope: &ScopeId, id: &EntityId) -> Result<Option<Entity>>;

    /// Entities owned by `scope`, in a stable store-defined order.
    async fn find_many(&self, scope: &ScopeId, options: FindOptions) -> Result<Vec<Entity>>;
}

/// Read access to relations.
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Relations owned by `scope`, in a stable store-defined order.
    async fn find_by_scope(&self, scope: &ScopeId, options: FindOptions) -> Result<Vec<Relation>>;

    /// Relations where `entity_id` is the source or the target.
    async fn find_by_entity(
        &self,
        scope: &ScopeId,
        entity_id: &EntityId,
        options: FindOptions,
    ) -> Result<Vec<Relation>>;
}
