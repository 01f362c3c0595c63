//! Error types for the kgraph-query crate.

use kgraph_store::StoreError;
use thiserror::Error;

/// Why a query did not produce a result.
///
/// Missing entities and unreachable targets are not errors; they come back
/// as empty views or `None`.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A store collaborator failed. Passed through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid input: {field} {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Query cancelled")]
    Cancelled,

    #[error("Query exceeded its {timeout_ms}ms deadline")]
    DeadlineExceeded { timeout_ms: u64 },
}

pub type Result<T> = std::result::Result<T, QueryError>;
