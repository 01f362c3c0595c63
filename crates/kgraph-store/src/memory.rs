//! In-memory store backing tests, fixtures, and snapshot-driven CLI runs.
//!
//! Insertion order is preserved so listings are deterministic.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use kgraph_core::{Entity, EntityId, GraphSnapshot, Relation, RelationId, ScopeId};

use crate::error::{Result, StoreError};
use crate::store::{EntityStore, FindOptions, RelationStore};

type EntityKey = (ScopeId, EntityId);
type RelationKey = (ScopeId, RelationId);

#[derive(Default)]
struct Inner {
    entities: HashMap<EntityKey, Entity>,
    entity_order: Vec<EntityKey>,
    relations: Vec<Relation>,
    relation_index: HashMap<RelationKey, usize>,
}

/// Thread-safe in-memory implementation of both store traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding everything in `snapshot`, all scopes included.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let store = Self::new();
        for entity in snapshot.entities {
            store.insert_entity(entity)?;
        }
        for relation in snapshot.relations {
            store.insert_relation(relation)?;
        }
        Ok(store)
    }

    /// Insert or replace an entity. Replacing keeps its original position.
    pub fn insert_entity(&self, entity: Entity) -> Result<()> {
        let mut inner = self.write()?;
        let key = (entity.owner_scope.clone(), entity.id.clone());
        if inner.entities.insert(key.clone(), entity).is_none() {
            inner.entity_order.push(key);
        }
        Ok(())
    }

    /// Insert or replace a relation. Endpoints are not checked.
    pub fn insert_relation(&self, relation: Relation) -> Result<()> {
        let mut inner = self.write()?;
        let key = (relation.owner_scope.clone(), relation.id.clone());
        match inner.relation_index.get(&key).copied() {
            Some(pos) => inner.relations[pos] = relation,
            None => {
                let pos = inner.relations.len();
                inner.relations.push(relation);
                inner.relation_index.insert(key, pos);
            }
        }
        Ok(())
    }

    /// Remove an entity, leaving any relations that point at it dangling.
    pub fn remove_entity(&self, scope: &ScopeId, id: &EntityId) -> Result<Option<Entity>> {
        let mut inner = self.write()?;
        let key = (scope.clone(), id.clone());
        let removed = inner.entities.remove(&key);
        if removed.is_some() {
            inner.entity_order.retain(|k| k != &key);
        }
        Ok(removed)
    }

    pub fn entity_count(&self) -> Result<usize> {
        Ok(self.read()?.entities.len())
    }

    pub fn relation_count(&self) -> Result<usize> {
        Ok(self.read()?.relations.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn cap(options: FindOptions) -> usize {
    options.limit.unwrap_or(usize::MAX)
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_by_id(&self, scope: &ScopeId, id: &EntityId) -> Result<Option<Entity>> {
        let inner = self.read()?;
        Ok(inner.entities.get(&(scope.clone(), id.clone())).cloned())
    }

    async fn find_many(&self, scope: &ScopeId, options: FindOptions) -> Result<Vec<Entity>> {
        let inner = self.read()?;
        Ok(inner
            .entity_order
            .iter()
            .filter(|(owner, _)| owner == scope)
            .filter_map(|key| inner.entities.get(key).cloned())
            .take(cap(options))
            .collect())
    }
}

#[async_trait]
impl RelationStore for MemoryStore {
    async fn find_by_scope(&self, scope: &ScopeId, options: FindOptions) -> Result<Vec<Relation>> {
        let inner = self.read()?;
        Ok(inner
            .relations
            .iter()
            .filter(|r| &r.owner_scope == scope)
            .take(cap(options))
            .cloned()
            .collect())
    }

    async fn find_by_entity(
        &self,
        scope: &ScopeId,
        entity_id: &EntityId,
        options: FindOptions,
    ) -> Result<Vec<Relation>> {
        let inner = self.read()?;
        Ok(inner
            .relations
            .iter()
            .filter(|r| &r.owner_scope == scope && r.touches(entity_id))
            .take(cap(options))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(scope: &ScopeId) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_entity(Entity::new(scope.clone(), "e1", "Person", "Ada"))
            .unwrap();
        store
            .insert_entity(Entity::new(scope.clone(), "e2", "Company", "Acme"))
            .unwrap();
        store
            .insert_entity(Entity::new(scope.clone(), "e3", "City", "London"))
            .unwrap();
        store
            .insert_relation(Relation::new(scope.clone(), "r1", "e1", "e2", "WORKS_AT"))
            .unwrap();
        store
            .insert_relation(Relation::new(scope.clone(), "r2", "e2", "e3", "LOCATED_IN"))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_find_by_id_is_scoped() {
        let scope = ScopeId::new();
        let other = ScopeId::new();
        let store = seeded(&scope);

        let found = store.find_by_id(&scope, &"e1".into()).await.unwrap();
        assert_eq!(found.map(|e| e.name), Some("Ada".to_string()));

        let leaked = store.find_by_id(&other, &"e1".into()).await.unwrap();
        assert!(leaked.is_none());
    }

    #[tokio::test]
    async fn test_find_many_preserves_order_and_limit() {
        let scope = ScopeId::new();
        let store = seeded(&scope);

        let all = store.find_many(&scope, FindOptions::unbounded()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2", "e3"]);

        let two = store.find_many(&scope, FindOptions::limit(2)).await.unwrap();
        assert_eq!(two.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_entity_both_directions() {
        let scope = ScopeId::new();
        let store = seeded(&scope);

        let rels = store
            .find_by_entity(&scope, &"e2".into(), FindOptions::unbounded())
            .await
            .unwrap();
        let ids: Vec<&str> = rels.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[tokio::test]
    async fn test_replace_keeps_position() {
        let scope = ScopeId::new();
        let store = seeded(&scope);
        store
            .insert_entity(Entity::new(scope.clone(), "e1", "Person", "Ada Lovelace"))
            .unwrap();

        let all = store.find_many(&scope, FindOptions::unbounded()).await.unwrap();
        assert_eq!(all[0].name, "Ada Lovelace");
        assert_eq!(store.entity_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_remove_entity_leaves_dangling_relation() {
        let scope = ScopeId::new();
        let store = seeded(&scope);

        let removed = store.remove_entity(&scope, &"e3".into()).unwrap();
        assert!(removed.is_some());
        assert!(store.find_by_id(&scope, &"e3".into()).await.unwrap().is_none());
        assert_eq!(store.relation_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_from_snapshot() {
        let scope = ScopeId::new();
        let snapshot = GraphSnapshot {
            entities: vec![Entity::new(scope.clone(), "a", "Thing", "A")],
            relations: vec![Relation::new(scope.clone(), "r", "a", "a", "SELF")],
        };
        let store = MemoryStore::from_snapshot(snapshot).unwrap();

        let rels = store
            .find_by_scope(&scope, FindOptions::unbounded())
            .await
            .unwrap();
        assert_eq!(rels.len(), 1);
    }
}
