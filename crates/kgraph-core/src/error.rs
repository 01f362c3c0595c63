use thiserror::Error;

/// Top-level error type shared by kgraph crates.
#[derive(Error, Debug)]
pub enum KgraphError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for KgraphError {
    fn from(err: config::ConfigError) -> Self {
        KgraphError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KgraphError>;
