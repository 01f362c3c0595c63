//! Request options for the query engine's entry points.
//!
//! Every field is optional; unset fields fall back to `QueryConfig`.

use serde::{Deserialize, Serialize};

use kgraph_core::Direction;

use crate::error::{QueryError, Result};

/// Options for a full-graph listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FullGraphOptions {
    /// Bound applied separately to entities and to relations.
    pub limit: Option<usize>,
}

/// Options for a breadth-first traversal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverseOptions {
    /// Nodes at this depth are returned but not expanded.
    pub max_depth: Option<u32>,
    /// Output filter on entity type. Traversal still passes through other types.
    pub entity_types: Option<Vec<String>>,
    /// Only relations of these types are followed.
    pub relation_types: Option<Vec<String>>,
    /// Cap on visited nodes, start node included.
    pub limit: Option<usize>,
}

impl TraverseOptions {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_entity_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_relation_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relation_types = Some(types.into_iter().map(Into::into).collect());
        self
    }
}

/// Options for a shortest-path search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// Longest path, in relations, the search will consider.
    pub max_depth: Option<u32>,
}

impl PathOptions {
    pub fn with_max_depth(max_depth: u32) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }
}

/// Options for neighbor enumeration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborOptions {
    pub direction: Direction,
    pub relation_types: Option<Vec<String>>,
}

impl NeighborOptions {
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_relation_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relation_types = Some(types.into_iter().map(Into::into).collect());
        self
    }
}

pub(crate) fn check_limit(field: &'static str, limit: usize) -> Result<usize> {
    if limit == 0 {
        return Err(QueryError::InvalidInput {
            field,
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(limit)
}

pub(crate) fn check_depth(field: &'static str, depth: u32, cap: u32) -> Result<u32> {
    if depth > cap {
        return Err(QueryError::InvalidInput {
            field,
            reason: format!("must not exceed {cap} (got {depth})"),
        });
    }
    Ok(depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_limit() {
        assert_eq!(check_limit("limit", 5).unwrap(), 5);
        assert!(matches!(
            check_limit("limit", 0),
            Err(QueryError::InvalidInput { field: "limit", .. })
        ));
    }

    #[test]
    fn test_check_depth() {
        assert_eq!(check_depth("max_depth", 0, 32).unwrap(), 0);
        assert_eq!(check_depth("max_depth", 32, 32).unwrap(), 32);
        assert!(check_depth("max_depth", 33, 32).is_err());
    }

    #[test]
    fn test_traverse_options_deserialize_partial() {
        let opts: TraverseOptions =
            serde_json::from_str(r#"{"max_depth": 2, "relation_types": ["KNOWS"]}"#).unwrap();
        assert_eq!(opts.max_depth, Some(2));
        assert_eq!(opts.relation_types, Some(vec!["KNOWS".to_string()]));
        assert!(opts.limit.is_none());
    }

    #[test]
    fn test_neighbor_options_default_both() {
        let opts: NeighborOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.direction, Direction::Both);
    }
}
