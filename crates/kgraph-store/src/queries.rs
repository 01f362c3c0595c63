//! Read-only Cypher queries backing `EntityStore` and `RelationStore`.
//!
//! Schema: entities are `(:Entity {scope_id, id, entity_type, name,
//! properties, created_at, updated_at})`, relations are
//! `[:RELATES {scope_id, id, relation_type, properties, confidence,
//! created_at, updated_at}]`. `properties` holds a JSON object string and
//! timestamps are RFC 3339 strings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neo4rs::query;

use kgraph_core::{Entity, EntityId, Properties, Relation, RelationId, ScopeId};

use crate::client::GraphClient;
use crate::error::{Result, StoreError};
use crate::store::{EntityStore, FindOptions, RelationStore};

const ENTITY_RETURN: &str = "RETURN n.id AS id, n.entity_type AS entity_type, n.name AS name,
            n.properties AS properties, n.created_at AS created_at,
            n.updated_at AS updated_at";

const RELATION_RETURN: &str = "RETURN r.id AS id, a.id AS source_id, b.id AS target_id,
            r.relation_type AS relation_type, r.properties AS properties,
            r.confidence AS confidence, r.created_at AS created_at,
            r.updated_at AS updated_at";

#[async_trait]
impl EntityStore for GraphClient {
    async fn find_by_id(&self, scope: &ScopeId, id: &EntityId) -> Result<Option<Entity>> {
        let cypher = format!(
            "MATCH (n:Entity {{scope_id: $scope_id, id: $id}})
             {ENTITY_RETURN}
             LIMIT 1"
        );

        let q = query(&cypher)
            .param("scope_id", scope.to_string())
            .param("id", id.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(Some(row_to_entity(&row, scope)?)),
            None => Ok(None),
        }
    }

    async fn find_many(&self, scope: &ScopeId, options: FindOptions) -> Result<Vec<Entity>> {
        let cypher = format!(
            "MATCH (n:Entity {{scope_id: $scope_id}})
             {ENTITY_RETURN}
             ORDER BY n.created_at, n.id{}",
            limit_clause(options)
        );

        let q = with_limit(query(&cypher).param("scope_id", scope.to_string()), options);

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(row_to_entity(&row, scope)?);
        }
        Ok(results)
    }
}

#[async_trait]
impl RelationStore for GraphClient {
    async fn find_by_scope(&self, scope: &ScopeId, options: FindOptions) -> Result<Vec<Relation>> {
        let cypher = format!(
            "MATCH (a:Entity)-[r:RELATES {{scope_id: $scope_id}}]->(b:Entity)
             {RELATION_RETURN}
             ORDER BY r.created_at, r.id{}",
            limit_clause(options)
        );

        let q = with_limit(query(&cypher).param("scope_id", scope.to_string()), options);

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(row_to_relation(&row, scope)?);
        }
        Ok(results)
    }

    async fn find_by_entity(
        &self,
        scope: &ScopeId,
        entity_id: &EntityId,
        options: FindOptions,
    ) -> Result<Vec<Relation>> {
        let cypher = format!(
            "MATCH (a:Entity)-[r:RELATES {{scope_id: $scope_id}}]->(b:Entity)
             WHERE a.id = $id OR b.id = $id
             {RELATION_RETURN}
             ORDER BY r.created_at, r.id{}",
            limit_clause(options)
        );

        let q = with_limit(
            query(&cypher)
                .param("scope_id", scope.to_string())
                .param("id", entity_id.to_string()),
            options,
        );

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(row_to_relation(&row, scope)?);
        }
        Ok(results)
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn limit_clause(options: FindOptions) -> &'static str {
    if options.limit.is_some() {
        "\n             LIMIT $limit"
    } else {
        ""
    }
}

fn with_limit(q: neo4rs::Query, options: FindOptions) -> neo4rs::Query {
    match options.limit {
        Some(limit) => q.param("limit", i64::try_from(limit).unwrap_or(i64::MAX)),
        None => q,
    }
}

fn row_to_entity(row: &neo4rs::Row, scope: &ScopeId) -> Result<Entity> {
    let id: String = row.get("id").map_err(|e| StoreError::Malformed {
        kind: "entity",
        id: "<unknown>".to_string(),
        reason: format!("missing id: {e}"),
    })?;

    let properties = parse_properties(row, "entity", &id)?;

    Ok(Entity {
        owner_scope: scope.clone(),
        entity_type: row.get::<String>("entity_type").unwrap_or_default(),
        name: row.get::<String>("name").unwrap_or_default(),
        properties,
        created_at: parse_timestamp(row, "created_at"),
        updated_at: parse_timestamp(row, "updated_at"),
        id: EntityId(id),
    })
}

fn row_to_relation(row: &neo4rs::Row, scope: &ScopeId) -> Result<Relation> {
    let id: String = row.get("id").map_err(|e| StoreError::Malformed {
        kind: "relation",
        id: "<unknown>".to_string(),
        reason: format!("missing id: {e}"),
    })?;

    let endpoint = |key: &str| -> Result<EntityId> {
        row.get::<String>(key)
            .map(EntityId)
            .map_err(|e| StoreError::Malformed {
                kind: "relation",
                id: id.clone(),
                reason: format!("missing {key}: {e}"),
            })
    };
    let source_id = endpoint("source_id")?;
    let target_id = endpoint("target_id")?;

    let properties = parse_properties(row, "relation", &id)?;

    Ok(Relation {
        owner_scope: scope.clone(),
        source_id,
        target_id,
        relation_type: row.get::<String>("relation_type").unwrap_or_default(),
        properties,
        confidence: row.get::<f64>("confidence").unwrap_or(1.0),
        created_at: parse_timestamp(row, "created_at"),
        updated_at: parse_timestamp(row, "updated_at"),
        id: RelationId(id),
    })
}

/// Absent or null properties read as an empty map; a non-object is an error.
fn parse_properties(row: &neo4rs::Row, kind: &'static str, id: &str) -> Result<Properties> {
    match row.get::<String>("properties") {
        Ok(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(&raw).map_err(|e| StoreError::Malformed {
                kind,
                id: id.to_string(),
                reason: format!("properties are not a JSON object: {e}"),
            })
        }
        _ => Ok(Properties::new()),
    }
}

fn parse_timestamp(row: &neo4rs::Row, key: &str) -> DateTime<Utc> {
    row.get::<String>(key)
        .ok()
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}
