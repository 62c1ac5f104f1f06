use neo4rs::query;
use tracing::{info, warn};

use crate::GraphClient;

/// Run idempotent schema migrations: constraints, indexes.
/// "Already exists" errors are ignored so re-running is always safe.
pub async fn migrate(client: &GraphClient) -> Result<(), neo4rs::Error> {
    let g = &client.graph;

    info!("Running schema migrations...");

    // --- Uniqueness constraints ---
    let constraints = [
        "CREATE CONSTRAINT ON (n:Account) ASSERT n.id IS UNIQUE",
        "CREATE CONSTRAINT ON (n:Status) ASSERT n.id IS UNIQUE",
        "CREATE CONSTRAINT ON (n:Tag) ASSERT n.name IS UNIQUE",
    ];

    for c in &constraints {
        run_ignoring_exists(g, c).await?;
    }
    info!("Uniqueness constraints created");

    // --- Property indexes ---
    // screen_name lookups resolve the root account on every resumed run.
    let indexes = [
        "CREATE INDEX ON :Account(screen_name)",
        "CREATE INDEX ON :Tag(name)",
    ];

    for i in &indexes {
        run_ignoring_exists(g, i).await?;
    }
    info!("Property indexes created");

    Ok(())
}

async fn run_ignoring_exists(g: &neo4rs::Graph, cypher: &str) -> Result<(), neo4rs::Error> {
    match g.run(query(cypher)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let msg = e.to_string().to_lowercase();
            if msg.contains("already exists") || msg.contains("equivalent") {
                warn!(
                    "Already exists (skipped): {}",
                    cypher.chars().take(80).collect::<String>()
                );
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}
