//! JSON graph snapshots.
//!
//! A snapshot is a flat dump of entities and relations, possibly spanning
//! several scopes: `{ "entities": [...], "relations": [...] }`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Entity, Relation, ScopeId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl GraphSnapshot {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let snapshot = Self::from_json_str(&raw)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            entities = snapshot.entities.len(),
            relations = snapshot.relations.len(),
            "Loaded graph snapshot"
        );
        Ok(snapshot)
    }

    /// Distinct scopes present in the snapshot, in first-seen order.
    pub fn scopes(&self) -> Vec<ScopeId> {
        let mut scopes: Vec<ScopeId> = Vec::new();
        let owners = self
            .entities
            .iter()
            .map(|e| &e.owner_scope)
            .chain(self.relations.iter().map(|r| &r.owner_scope));
        for owner in owners {
            if !scopes.contains(owner) {
                scopes.push(owner.clone());
            }
        }
        scopes
    }
}
