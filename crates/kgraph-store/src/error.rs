//! Errors raised by store collaborators.

/// A store failed to answer. Never used for "record does not exist".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed {kind} record {id}: {reason}")]
    Malformed {
        kind: &'static str,
        id: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
