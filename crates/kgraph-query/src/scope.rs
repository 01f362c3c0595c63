//! Ownership guards, per-call entity resolution, and filtering helpers
//! shared by every query.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use kgraph_core::{Entity, EntityId, Relation, ScopeId};
use kgraph_store::EntityStore;

use crate::context::QueryContext;
use crate::error::{QueryError, Result};

/// Resolves entity ids within one scope, remembering answers for the
/// lifetime of a single query.
pub(crate) struct Resolver<'a> {
    ctx: &'a QueryContext,
    store: &'a dyn EntityStore,
    scope: &'a ScopeId,
    cache: HashMap<EntityId, Option<Entity>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(ctx: &'a QueryContext, store: &'a dyn EntityStore, scope: &'a ScopeId) -> Self {
        Self {
            ctx,
            store,
            scope,
            cache: HashMap::new(),
        }
    }

    /// `Ok(None)` for missing or foreign-scope entities. Store failures propagate.
    pub(crate) async fn resolve(&mut self, id: &EntityId) -> Result<Option<Entity>> {
        if let Some(hit) = self.cache.get(id) {
            return Ok(hit.clone());
        }

        let (store, scope) = (self.store, self.scope);
        let found = self
            .ctx
            .guard(async { store.find_by_id(scope, id).await.map_err(QueryError::from) })
            .await?
            .filter(|entity| owned_by(scope, "entity", entity.id.as_str(), &entity.owner_scope));

        self.cache.insert(id.clone(), found.clone());
        Ok(found)
    }

    pub(crate) fn lookups(&self) -> usize {
        self.cache.len()
    }
}

fn owned_by(scope: &ScopeId, kind: &'static str, id: &str, owner: &ScopeId) -> bool {
    if owner == scope {
        return true;
    }
    tracing::warn!(
        scope = %scope,
        owner = %owner,
        kind,
        id,
        "Store returned a record from another scope, dropping it"
    );
    false
}

pub(crate) fn entities_in_scope(scope: &ScopeId, entities: Vec<Entity>) -> Vec<Entity> {
    entities
        .into_iter()
        .filter(|e| owned_by(scope, "entity", e.id.as_str(), &e.owner_scope))
        .collect()
}

pub(crate) fn relations_in_scope(scope: &ScopeId, relations: Vec<Relation>) -> Vec<Relation> {
    relations
        .into_iter()
        .filter(|r| owned_by(scope, "relation", r.id.as_str(), &r.owner_scope))
        .collect()
}

/// Keep the first occurrence of each key, preserving order.
pub(crate) fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> &K,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(key(item).clone()))
        .collect()
}

/// Allow-list check. `None` or an empty list lets everything through.
pub(crate) fn type_allowed(filter: Option<&[String]>, value: &str) -> bool {
    match filter {
        Some(types) if !types.is_empty() => types.iter().any(|t| t == value),
        _ => true,
    }
}
