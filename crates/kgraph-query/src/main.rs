//! CLI entry point for the kgraph query engine.
//!
//! Runs one query against either a live Neo4j instance or a JSON snapshot
//! file and writes the JSON result to stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use kgraph_core::{Direction, EntityId, GraphSnapshot, QueryConfig, ScopeId};
use kgraph_query::{
    FullGraphOptions, GraphQueryEngine, NeighborOptions, PathOptions, QueryContext,
    TraverseOptions,
};
use kgraph_store::{GraphClient, GraphConfig, MemoryStore};

#[derive(Parser)]
#[command(name = "kgraph-query")]
#[command(about = "Read-only traversal queries over a tenant's knowledge graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Scope (tenant) to query.
    #[arg(long, global = true)]
    scope: Option<ScopeId>,

    /// Config file prefix (default: kgraph).
    #[arg(short, long, default_value = "kgraph", global = true)]
    config: String,

    /// Query a JSON snapshot instead of Neo4j.
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Per-query deadline, overriding `query.timeout_ms`.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// List up to LIMIT entities and up to LIMIT relations.
    FullGraph {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Breadth-first traversal from an entity.
    Traverse {
        #[arg(long)]
        start: String,
        #[arg(long)]
        max_depth: Option<u32>,
        /// Only return entities of this type (repeatable).
        #[arg(long = "entity-type")]
        entity_types: Vec<String>,
        /// Only follow relations of this type (repeatable).
        #[arg(long = "relation-type")]
        relation_types: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fewest-hop path between two entities. Prints `null` if none.
    Path {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        max_depth: Option<u32>,
    },
    /// Entities one relation away.
    Neighbors {
        #[arg(long)]
        entity: String,
        /// out, in, or both.
        #[arg(long, default_value = "both")]
        direction: Direction,
        #[arg(long = "relation-type")]
        relation_types: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let scope = cli
        .scope
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--scope is required"))?;

    let mut query_config = QueryConfig::load(&cli.config)?;
    if let Some(ms) = cli.timeout_ms {
        query_config.timeout_ms = Some(ms);
    }

    let engine = match &cli.snapshot {
        Some(path) => {
            let snapshot = GraphSnapshot::load(path)?;
            tracing::info!(
                path = %path.display(),
                entities = snapshot.entities.len(),
                relations = snapshot.relations.len(),
                "Loaded snapshot"
            );
            GraphQueryEngine::from_store(Arc::new(MemoryStore::from_snapshot(snapshot)?))
        }
        None => {
            let graph_config = load_graph_config(&cli.config);
            GraphQueryEngine::from_store(Arc::new(GraphClient::connect(&graph_config).await?))
        }
    }
    .with_config(query_config);

    let token = CancellationToken::new();
    let ctx = QueryContext::with_token(token.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling query");
            token.cancel();
        }
    });

    match cli.command {
        Command::FullGraph { limit } => {
            let view = engine
                .full_graph(&ctx, &scope, &FullGraphOptions { limit })
                .await?;
            println!("{}", serde_json::to_string(&view)?);
        }
        Command::Traverse {
            start,
            max_depth,
            entity_types,
            relation_types,
            limit,
        } => {
            let options = TraverseOptions {
                max_depth,
                entity_types: non_empty(entity_types),
                relation_types: non_empty(relation_types),
                limit,
            };
            let view = engine
                .traverse(&ctx, &scope, &EntityId::from(start), &options)
                .await?;
            println!("{}", serde_json::to_string(&view)?);
        }
        Command::Path {
            source,
            target,
            max_depth,
        } => {
            let path = engine
                .find_path(
                    &ctx,
                    &scope,
                    &EntityId::from(source),
                    &EntityId::from(target),
                    &PathOptions { max_depth },
                )
                .await?;
            println!("{}", serde_json::to_string(&path)?);
        }
        Command::Neighbors {
            entity,
            direction,
            relation_types,
        } => {
            let options = NeighborOptions {
                direction,
                relation_types: non_empty(relation_types),
            };
            let found = engine
                .neighbors(&ctx, &scope, &EntityId::from(entity), &options)
                .await?;
            println!("{}", serde_json::to_string(&found)?);
        }
    }

    Ok(())
}

fn non_empty(types: Vec<String>) -> Option<Vec<String>> {
    if types.is_empty() {
        None
    } else {
        Some(types)
    }
}

fn load_graph_config(file_prefix: &str) -> GraphConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("KGRAPH")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    match cfg {
        Ok(c) => GraphConfig {
            uri: c
                .get_string("neo4j.uri")
                .unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            user: c
                .get_string("neo4j.user")
                .unwrap_or_else(|_| "neo4j".to_string()),
            password: c
                .get_string("neo4j.password")
                .unwrap_or_else(|_| "kgraph-dev".to_string()),
            database: c.get_string("neo4j.database").ok(),
            ..Default::default()
        },
        Err(_) => GraphConfig::default(),
    }
}
