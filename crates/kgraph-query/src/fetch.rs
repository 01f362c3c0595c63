//! Store round-trips: scoped bulk listings and per-layer relation fetches.

use futures::{StreamExt, TryStreamExt};

use kgraph_core::{EntityId, GraphView, Relation, ScopeId};
use kgraph_store::{EntityStore, FindOptions, RelationStore, StoreError};

use crate::context::QueryContext;
use crate::error::{QueryError, Result};
use crate::scope::{dedup_by_key, entities_in_scope, relations_in_scope};

/// List up to `limit` entities and, separately, up to `limit` relations.
///
/// This is a bounded listing, not a dump: callers wanting more must page
/// through the stores directly.
pub async fn fetch_scope_graph(
    ctx: &QueryContext,
    entities: &dyn EntityStore,
    relations: &dyn RelationStore,
    scope: &ScopeId,
    limit: usize,
) -> Result<GraphView> {
    let options = FindOptions::limit(limit);
    let (nodes, edges) = ctx
        .guard(async {
            futures::try_join!(
                entities.find_many(scope, options),
                relations.find_by_scope(scope, options)
            )
            .map_err(QueryError::from)
        })
        .await?;

    let nodes = dedup_by_key(entities_in_scope(scope, nodes), |e| &e.id);
    let edges = dedup_by_key(relations_in_scope(scope, edges), |r| &r.id);

    Ok(GraphView { nodes, edges })
}

/// Fetch every relation touching each id in `layer`.
///
/// Fetches run concurrently (at most `concurrency` in flight) but results
/// come back in `layer` order, so callers can process them as if the
/// frontier were drained one node at a time.
pub async fn fetch_layer(
    ctx: &QueryContext,
    relations: &dyn RelationStore,
    scope: &ScopeId,
    layer: Vec<EntityId>,
    concurrency: usize,
) -> Result<Vec<(EntityId, Vec<Relation>)>> {
    let fetches = futures::stream::iter(layer.into_iter().map(|id| async move {
        let touching = relations
            .find_by_entity(scope, &id, FindOptions::unbounded())
            .await?;
        Ok::<_, StoreError>((id, relations_in_scope(scope, touching)))
    }))
    .buffered(concurrency.max(1))
    .try_collect::<Vec<_>>();

    ctx.guard(async { fetches.await.map_err(QueryError::from) })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::Entity;
    use kgraph_store::MemoryStore;

    #[tokio::test]
    async fn test_fetch_layer_preserves_order() {
        let scope = ScopeId::new();
        let store = MemoryStore::new();
        for id in ["a", "b", "c"] {
            store
                .insert_entity(Entity::new(scope.clone(), id, "Node", id))
                .unwrap();
        }
        store
            .insert_relation(Relation::new(scope.clone(), "ab", "a", "b", "LINK"))
            .unwrap();
        store
            .insert_relation(Relation::new(scope.clone(), "bc", "b", "c", "LINK"))
            .unwrap();

        let layer = vec![EntityId::from("c"), EntityId::from("a"), EntityId::from("b")];
        let fetched = fetch_layer(&QueryContext::new(), &store, &scope, layer, 2)
            .await
            .unwrap();

        let order: Vec<&str> = fetched.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(fetched[2].1.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_scope_graph_limits_each_kind() {
        let scope = ScopeId::new();
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert_entity(Entity::new(scope.clone(), format!("e{i}"), "Node", "n"))
                .unwrap();
            store
                .insert_relation(Relation::new(scope.clone(), format!("r{i}"), "e0", "e1", "LINK"))
                .unwrap();
        }

        let view = fetch_scope_graph(&QueryContext::new(), &store, &store, &scope, 3)
            .await
            .unwrap();
        assert_eq!(view.nodes.len(), 3);
        assert_eq!(view.edges.len(), 3);
    }
}
