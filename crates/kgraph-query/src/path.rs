//! Fewest-hop path search between two entities.
//!
//! Relations are walked in both directions. The search expands whole depth
//! layers, so the first time the target is reached is along a shortest
//! path; ties go to whichever relation the store listed first.

use std::collections::{HashMap, HashSet};

use kgraph_core::{Entity, EntityId, PathView, Relation, ScopeId};
use kgraph_store::{EntityStore, RelationStore};

use crate::context::QueryContext;
use crate::error::Result;
use crate::fetch::fetch_layer;
use crate::scope::Resolver;
use crate::traversal::Frontier;

/// Returns `Ok(None)` when either endpoint is missing or no path exists
/// within `max_depth` hops.
#[allow(clippy::too_many_arguments)]
pub async fn shortest_path(
    ctx: &QueryContext,
    entities: &dyn EntityStore,
    relations: &dyn RelationStore,
    scope: &ScopeId,
    source: &EntityId,
    target: &EntityId,
    max_depth: u32,
    concurrency: usize,
) -> Result<Option<PathView>> {
    ctx.check()?;

    let mut resolver = Resolver::new(ctx, entities, scope);
    let Some(source_entity) = resolver.resolve(source).await? else {
        tracing::debug!(source = %source, "Path source not found");
        return Ok(None);
    };

    if source == target {
        return Ok(Some(PathView {
            nodes: vec![source_entity],
            edges: Vec::new(),
        }));
    }

    if resolver.resolve(target).await?.is_none() {
        tracing::debug!(target = %target, "Path target not found");
        return Ok(None);
    }

    // child -> (parent, relation used to reach child)
    let mut parents: HashMap<EntityId, (EntityId, Relation)> = HashMap::new();
    let mut found: HashMap<EntityId, Entity> = HashMap::new();
    found.insert(source.clone(), source_entity);
    let mut visited: HashSet<EntityId> = HashSet::new();
    visited.insert(source.clone());

    let mut frontier = Frontier::seeded(source.clone());

    'search: while let Some((depth, layer)) = frontier.next_layer() {
        if depth >= max_depth {
            break;
        }
        ctx.check()?;

        tracing::debug!(depth, layer = layer.len(), "Expanding path layer");
        let fetched = fetch_layer(ctx, relations, scope, layer, concurrency).await?;

        for (node_id, touching) in fetched {
            for relation in touching {
                let Some(other_id) = relation.other_endpoint(&node_id).cloned() else {
                    continue;
                };
                if visited.contains(&other_id) {
                    continue;
                }
                let Some(other) = resolver.resolve(&other_id).await? else {
                    continue;
                };

                visited.insert(other_id.clone());
                found.insert(other_id.clone(), other);
                parents.insert(other_id.clone(), (node_id.clone(), relation));

                if &other_id == target {
                    break 'search;
                }
                frontier.push(other_id, depth + 1);
            }
        }
    }

    Ok(rebuild(source, target, parents, found))
}

/// Walk parent links back from `target`, then reverse into source order.
fn rebuild(
    source: &EntityId,
    target: &EntityId,
    mut parents: HashMap<EntityId, (EntityId, Relation)>,
    mut found: HashMap<EntityId, Entity>,
) -> Option<PathView> {
    if !parents.contains_key(target) {
        return None;
    }

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut current = target.clone();

    while &current != source {
        let (parent, relation) = parents.remove(&current)?;
        nodes.push(found.remove(&current)?);
        edges.push(relation);
        current = parent;
    }
    nodes.push(found.remove(source)?);

    nodes.reverse();
    edges.reverse();
    Some(PathView { nodes, edges })
}
