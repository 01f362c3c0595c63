//! Core domain types for the tenant knowledge graph.
//!
//! Entities and relations are owned by a scope (tenant or user boundary).
//! The query engine only ever reads them; the views at the bottom of this
//! module are what it hands back to callers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Scope ─────────────────────────────────────────────────────────

/// Every entity and relation belongs to exactly one scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ScopeId(pub Uuid);

impl ScopeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ScopeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ── Identifiers ───────────────────────────────────────────────────

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Opaque entity identifier, unique within a scope.
    EntityId
);

string_id!(
    /// Opaque relation identifier, unique within a scope.
    RelationId
);

// ── Properties ────────────────────────────────────────────────────

/// A JSON-shaped property value.
///
/// Serialized untagged, so a property map round-trips as the plain JSON
/// object it came from. Integers are widened to `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

/// Open key/value map attached to entities and relations.
pub type Properties = BTreeMap<String, PropertyValue>;

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropertyValue::Null,
            serde_json::Value::Bool(b) => PropertyValue::Bool(b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(PropertyValue::Number)
                .unwrap_or(PropertyValue::Null),
            serde_json::Value::String(s) => PropertyValue::String(s),
            serde_json::Value::Array(items) => {
                PropertyValue::List(items.into_iter().map(PropertyValue::from).collect())
            }
            serde_json::Value::Object(map) => PropertyValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, PropertyValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<PropertyValue> for serde_json::Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Bool(b) => serde_json::Value::Bool(b),
            // NaN and infinities have no JSON form.
            PropertyValue::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::String(s) => serde_json::Value::String(s),
            PropertyValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            PropertyValue::Map(map) => {
                serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

// ── Entities & Relations ──────────────────────────────────────────

/// A typed, named node in a scope's graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub owner_scope: ScopeId,
    /// Free-form type tag, e.g. "Person".
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn new(
        owner_scope: ScopeId,
        id: impl Into<EntityId>,
        entity_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner_scope,
            entity_type: entity_type.into(),
            name: name.into(),
            properties: Properties::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A typed, directed, confidence-weighted edge: `source_id -> target_id`.
///
/// Either endpoint may no longer exist; readers must tolerate that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub owner_scope: ScopeId,
    pub source_id: EntityId,
    pub target_id: EntityId,
    #[serde(rename = "type")]
    pub relation_type: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_confidence() -> f64 {
    1.0
}

impl Relation {
    pub fn new(
        owner_scope: ScopeId,
        id: impl Into<RelationId>,
        source_id: impl Into<EntityId>,
        target_id: impl Into<EntityId>,
        relation_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner_scope,
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type: relation_type.into(),
            properties: Properties::new(),
            confidence: default_confidence(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The endpoint opposite `id`, or `None` if the relation does not touch it.
    /// A self-loop returns `id` itself.
    pub fn other_endpoint(&self, id: &EntityId) -> Option<&EntityId> {
        if &self.source_id == id {
            Some(&self.target_id)
        } else if &self.target_id == id {
            Some(&self.source_id)
        } else {
            None
        }
    }

    pub fn touches(&self, id: &EntityId) -> bool {
        &self.source_id == id || &self.target_id == id
    }
}

// ── Direction ─────────────────────────────────────────────────────

/// Which side of a relation the queried entity must sit on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The entity is the relation's source.
    Out,
    /// The entity is the relation's target.
    In,
    #[default]
    Both,
}

impl Direction {
    pub fn matches(&self, relation: &Relation, id: &EntityId) -> bool {
        match self {
            Direction::Out => &relation.source_id == id,
            Direction::In => &relation.target_id == id,
            Direction::Both => relation.touches(id),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Out => "out",
            Direction::In => "in",
            Direction::Both => "both",
        };
        f.write_str(s)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "out" | "outgoing" => Ok(Direction::Out),
            "in" | "incoming" => Ok(Direction::In),
            "both" | "any" => Ok(Direction::Both),
            _ => Err(format!("invalid direction: {s} (expected out, in, both)")),
        }
    }
}

// ── Views ─────────────────────────────────────────────────────────

/// A subgraph returned by the engine. Neither list contains a duplicate id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<Entity>,
    pub edges: Vec<Relation>,
}

impl GraphView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node_ids(&self) -> Vec<&EntityId> {
        self.nodes.iter().map(|n| &n.id).collect()
    }

    pub fn edge_ids(&self) -> Vec<&RelationId> {
        self.edges.iter().map(|e| &e.id).collect()
    }
}

/// A path from source to target. `edges[i]` connects `nodes[i]` and `nodes[i + 1]`.
///
/// "No path" is expressed as `Option::None` by the engine, never as an empty path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathView {
    pub nodes: Vec<Entity>,
    pub edges: Vec<Relation>,
}

impl PathView {
    /// Number of relations traversed.
    pub fn hops(&self) -> usize {
        self.edges.len()
    }
}

/// One relation touching an entity, paired with the entity at its other end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub relation: Relation,
    pub entity: Entity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_serializes_type_field() {
        let scope = ScopeId::new();
        let entity = Entity::new(scope, "e1", "Person", "Ada").with_property("age", 36.0);

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "Person");
        assert_eq!(json["properties"]["age"], 36.0);

        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn property_value_from_nested_json() {
        let raw = serde_json::json!({
            "tags": ["a", "b"],
            "meta": {"verified": true, "score": 3},
            "missing": null
        });

        let value = PropertyValue::from(raw.clone());
        let PropertyValue::Map(map) = &value else {
            panic!("expected map, got {value:?}");
        };
        assert_eq!(
            map["tags"],
            PropertyValue::List(vec!["a".into(), "b".into()])
        );
        assert!(map["missing"].is_null());

        let PropertyValue::Map(meta) = &map["meta"] else {
            panic!("expected nested map");
        };
        assert_eq!(meta["verified"].as_bool(), Some(true));
        assert_eq!(meta["score"].as_f64(), Some(3.0));

        // Integers widen, so compare through f64.
        let back: serde_json::Value = value.into();
        assert_eq!(back["meta"]["score"].as_f64(), Some(3.0));
        assert_eq!(back["tags"], raw["tags"]);
    }

    #[test]
    fn property_value_deserializes_untagged() {
        let props: Properties =
            serde_json::from_str(r#"{"name":"x","n":1.5,"ok":false,"none":null}"#).unwrap();
        assert_eq!(props["name"].as_str(), Some("x"));
        assert_eq!(props["n"].as_f64(), Some(1.5));
        assert_eq!(props["ok"].as_bool(), Some(false));
        assert!(props["none"].is_null());
    }

    #[test]
    fn relation_other_endpoint() {
        let scope = ScopeId::new();
        let rel = Relation::new(scope.clone(), "r1", "a", "b", "KNOWS");
        assert_eq!(rel.other_endpoint(&"a".into()), Some(&EntityId::from("b")));
        assert_eq!(rel.other_endpoint(&"b".into()), Some(&EntityId::from("a")));
        assert_eq!(rel.other_endpoint(&"c".into()), None);

        let self_loop = Relation::new(scope, "r2", "a", "a", "SELF");
        assert_eq!(self_loop.other_endpoint(&"a".into()), Some(&EntityId::from("a")));
    }

    #[test]
    fn direction_matching() {
        let rel = Relation::new(ScopeId::new(), "r1", "a", "b", "KNOWS");
        let a = EntityId::from("a");
        let b = EntityId::from("b");

        assert!(Direction::Out.matches(&rel, &a));
        assert!(!Direction::Out.matches(&rel, &b));
        assert!(Direction::In.matches(&rel, &b));
        assert!(!Direction::In.matches(&rel, &a));
        assert!(Direction::Both.matches(&rel, &a));
        assert!(Direction::Both.matches(&rel, &b));
    }

    #[test]
    fn direction_parses() {
        assert_eq!("out".parse::<Direction>().unwrap(), Direction::Out);
        assert_eq!("IN".parse::<Direction>().unwrap(), Direction::In);
        assert_eq!("both".parse::<Direction>().unwrap(), Direction::Both);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn relation_defaults_on_deserialize() {
        let scope = ScopeId::new();
        let json = serde_json::json!({
            "id": "r1",
            "owner_scope": scope,
            "source_id": "a",
            "target_id": "b",
            "type": "WORKS_AT"
        });
        let rel: Relation = serde_json::from_value(json).unwrap();
        assert_eq!(rel.confidence, 1.0);
        assert!(rel.properties.is_empty());
    }
}
