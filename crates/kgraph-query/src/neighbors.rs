//! One-hop neighbor enumeration.

use kgraph_core::{Direction, EntityId, Neighbor, ScopeId};
use kgraph_store::{EntityStore, FindOptions, RelationStore};

use crate::context::QueryContext;
use crate::error::{QueryError, Result};
use crate::scope::{dedup_by_key, relations_in_scope, type_allowed, Resolver};

/// Pair every matching relation touching `entity_id` with the entity at its
/// other end, in store order. Relations whose far end is missing are
/// skipped. A self-loop yields the entity itself and matches any direction.
pub async fn neighbors(
    ctx: &QueryContext,
    entities: &dyn EntityStore,
    relations: &dyn RelationStore,
    scope: &ScopeId,
    entity_id: &EntityId,
    direction: Direction,
    relation_types: Option<&[String]>,
) -> Result<Vec<Neighbor>> {
    let touching = ctx
        .guard(async {
            relations
                .find_by_entity(scope, entity_id, FindOptions::unbounded())
                .await
                .map_err(QueryError::from)
        })
        .await?;
    let touching = dedup_by_key(relations_in_scope(scope, touching), |r| &r.id);

    let mut resolver = Resolver::new(ctx, entities, scope);
    let mut out = Vec::new();

    for relation in touching {
        if !direction.matches(&relation, entity_id) {
            continue;
        }
        if !type_allowed(relation_types, &relation.relation_type) {
            continue;
        }
        let Some(other_id) = relation.other_endpoint(entity_id).cloned() else {
            continue;
        };

        ctx.check()?;
        match resolver.resolve(&other_id).await? {
            Some(entity) => out.push(Neighbor { relation, entity }),
            None => {
                tracing::debug!(relation = %relation.id, missing = %other_id, "Skipping dangling neighbor");
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::{Entity, Relation};
    use kgraph_store::MemoryStore;

    #[tokio::test]
    async fn test_self_loop_matches_every_direction() {
        let scope = ScopeId::new();
        let store = MemoryStore::new();
        store
            .insert_entity(Entity::new(scope.clone(), "a", "Node", "A"))
            .unwrap();
        store
            .insert_relation(Relation::new(scope.clone(), "aa", "a", "a", "SELF"))
            .unwrap();
        let ctx = QueryContext::new();

        for direction in [Direction::Out, Direction::In, Direction::Both] {
            let found = neighbors(&ctx, &store, &store, &scope, &"a".into(), direction, None)
                .await
                .unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].entity.id.as_str(), "a");
        }
    }

    #[tokio::test]
    async fn test_relation_type_filter() {
        let scope = ScopeId::new();
        let store = MemoryStore::new();
        for id in ["a", "b", "c"] {
            store
                .insert_entity(Entity::new(scope.clone(), id, "Node", id))
                .unwrap();
        }
        store
            .insert_relation(Relation::new(scope.clone(), "ab", "a", "b", "KNOWS"))
            .unwrap();
        store
            .insert_relation(Relation::new(scope.clone(), "ac", "a", "c", "OWNS"))
            .unwrap();

        let only = vec!["OWNS".to_string()];
        let found = neighbors(
            &QueryContext::new(),
            &store,
            &store,
            &scope,
            &"a".into(),
            Direction::Both,
            Some(only.as_slice()),
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity.id.as_str(), "c");
    }
}
