use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use transnet_common::{Config, ScrapeConfig};
use transnet_graph::{migrate, GraphClient};
use transnet_scrape::pipeline::runner::PhaseRunner;
use transnet_scrape::source::TwitterSource;
use transnet_scrape::store::Neo4jStore;
use twitter_client::TwitterClient;

/// Transnet: phased social-graph scraping tool.
#[derive(Parser, Debug)]
#[command(about = "Crawl and filter a social-graph neighborhood")]
struct Args {
    /// Which phase of extraction to resume operation at (0-based).
    #[arg(long, default_value_t = 0)]
    phase: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("transnet_scrape=info".parse()?)
                .add_directive("transnet_graph=info".parse()?),
        )
        .init();

    let args = Args::parse();

    info!("Transnet scrape starting...");

    // Load config
    let config = Config::from_env();
    config.log_redacted();
    let scrape_config = ScrapeConfig::from_env();

    // Connect to Neo4j
    let client =
        GraphClient::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
            .await?;

    // Run migrations
    migrate(&client).await?;

    let store = Neo4jStore::new(client);
    let source = TwitterSource::new(TwitterClient::new(config.twitter_bearer_token.clone()));

    let runner = PhaseRunner::new(&store, &source, scrape_config);
    let result = runner.run(args.phase).await?;

    info!("Scrape run complete. {result}");

    Ok(())
}
