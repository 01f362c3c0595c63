//! Bounded breadth-first traversal from a start entity.
//!
//! Relations are followed in both directions. The frontier is drained one
//! depth layer at a time: relation fetches for a layer run concurrently,
//! then discoveries are applied in frontier order so the visited and
//! edge sets only ever change at one point.

use std::collections::{HashSet, VecDeque};

use kgraph_core::{EntityId, GraphView, RelationId, ScopeId};
use kgraph_store::{EntityStore, RelationStore};

use crate::context::QueryContext;
use crate::error::Result;
use crate::fetch::fetch_layer;
use crate::scope::{type_allowed, Resolver};

/// Resolved traversal bounds (defaults already applied and validated).
#[derive(Debug, Clone)]
pub struct TraverseParams<'a> {
    pub max_depth: u32,
    pub limit: usize,
    pub entity_types: Option<&'a [String]>,
    pub relation_types: Option<&'a [String]>,
    pub concurrency: usize,
}

/// FIFO of `(entity, depth)` pairs, drained a depth layer at a time.
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    queue: VecDeque<(EntityId, u32)>,
}

impl Frontier {
    pub(crate) fn seeded(start: EntityId) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back((start, 0));
        Self { queue }
    }

    pub(crate) fn push(&mut self, id: EntityId, depth: u32) {
        self.queue.push_back((id, depth));
    }

    /// Pop every queued entry that shares the front entry's depth.
    pub(crate) fn next_layer(&mut self) -> Option<(u32, Vec<EntityId>)> {
        let depth = self.queue.front()?.1;
        let mut layer = Vec::new();
        while let Some((_, d)) = self.queue.front() {
            if *d != depth {
                break;
            }
            if let Some((id, _)) = self.queue.pop_front() {
                layer.push(id);
            }
        }
        Some((depth, layer))
    }
}

/// Run the traversal. A missing start entity yields an empty view.
///
/// `limit` counts every visited node, including ones later hidden by the
/// entity-type filter.
pub async fn traverse(
    ctx: &QueryContext,
    entities: &dyn EntityStore,
    relations: &dyn RelationStore,
    scope: &ScopeId,
    start: &EntityId,
    params: &TraverseParams<'_>,
) -> Result<GraphView> {
    ctx.check()?;

    let mut resolver = Resolver::new(ctx, entities, scope);
    let Some(start_entity) = resolver.resolve(start).await? else {
        tracing::debug!(scope = %scope, start = %start, "Start entity not found");
        return Ok(GraphView::empty());
    };

    let mut visited: HashSet<EntityId> = HashSet::new();
    visited.insert(start.clone());
    let mut edge_seen: HashSet<RelationId> = HashSet::new();

    let mut view = GraphView {
        nodes: vec![start_entity],
        edges: Vec::new(),
    };

    let mut frontier = Frontier::seeded(start.clone());

    'search: while let Some((depth, layer)) = frontier.next_layer() {
        // Everything left is at least this deep.
        if depth >= params.max_depth {
            break;
        }
        ctx.check()?;

        tracing::debug!(depth, layer = layer.len(), visited = visited.len(), "Expanding layer");
        let fetched = fetch_layer(ctx, relations, scope, layer, params.concurrency).await?;

        for (node_id, touching) in fetched {
            for relation in touching {
                if visited.len() >= params.limit {
                    break 'search;
                }
                if edge_seen.contains(&relation.id) {
                    continue;
                }
                if !type_allowed(params.relation_types, &relation.relation_type) {
                    continue;
                }
                let Some(other_id) = relation.other_endpoint(&node_id).cloned() else {
                    tracing::warn!(
                        relation = %relation.id,
                        entity = %node_id,
                        "Store returned a relation that does not touch the entity"
                    );
                    continue;
                };
                let Some(other) = resolver.resolve(&other_id).await? else {
                    tracing::debug!(relation = %relation.id, missing = %other_id, "Skipping dangling relation");
                    continue;
                };

                edge_seen.insert(relation.id.clone());
                view.edges.push(relation);

                if visited.insert(other_id.clone()) {
                    view.nodes.push(other);
                    frontier.push(other_id, depth + 1);
                }
            }
        }
    }

    tracing::debug!(
        visited = visited.len(),
        edges = view.edges.len(),
        lookups = resolver.lookups(),
        "Traversal finished expanding"
    );
    Ok(hide_filtered_types(view, params.entity_types))
}

/// Drop nodes whose type is not allowed, and any edge touching one.
/// The start node (first in discovery order) is always kept.
fn hide_filtered_types(mut view: GraphView, entity_types: Option<&[String]>) -> GraphView {
    let hidden: HashSet<EntityId> = view
        .nodes
        .iter()
        .skip(1)
        .filter(|n| !type_allowed(entity_types, &n.entity_type))
        .map(|n| n.id.clone())
        .collect();

    if hidden.is_empty() {
        return view;
    }

    view.nodes.retain(|n| !hidden.contains(&n.id));
    view.edges
        .retain(|e| !hidden.contains(&e.source_id) && !hidden.contains(&e.target_id));
    view
}
