use std::env;

use tracing::info;

/// Process configuration loaded from environment variables: credentials
/// and connection details only. Scrape parameters live in
/// [`ScrapeConfig`].
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // Twitter REST API
    pub twitter_bearer_token: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            neo4j_uri: required_env("NEO4J_URI"),
            neo4j_user: required_env("NEO4J_USER"),
            neo4j_password: required_env("NEO4J_PASSWORD"),
            twitter_bearer_token: required_env("TWITTER_BEARER_TOKEN"),
        }
    }

    /// Log the non-secret parts of the config.
    pub fn log_redacted(&self) {
        info!(
            neo4j_uri = self.neo4j_uri.as_str(),
            neo4j_user = self.neo4j_user.as_str(),
            "Config loaded (credentials redacted)"
        );
    }
}

/// Immutable parameters for one scrape run. Passed by value into the
/// pipeline — there is no process-wide scrape state.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Screen name of the account the crawl starts from.
    pub root_user_screen_name: String,
    /// Max followers pulled for the root in the follower-pull phase.
    pub root_user_follower_limit: u32,
    /// Max friends sampled per FILTER_0 account in the sample-pull phase.
    pub filter_graph_sample_limit: u32,
    /// Max friends and followers pulled per FILTER_1 account in the
    /// extended-pull phase.
    pub extended_graph_limit: u32,
    /// Free-text location the degree-0 filter matches against.
    pub target_location: String,
    /// Minimum fraction of a candidate's followers whose location must
    /// match `target_location`.
    pub min_match_ratio: f64,
}

impl ScrapeConfig {
    /// Load scrape parameters from environment variables. Limits default
    /// to 200, the match ratio to 0.50.
    pub fn from_env() -> Self {
        Self {
            root_user_screen_name: required_env("ROOT_USER"),
            root_user_follower_limit: numeric_env("ROOT_USER_FOLLOWER_LIMIT", 200),
            filter_graph_sample_limit: numeric_env("FILTER_GRAPH_SAMPLE_LIMIT", 200),
            extended_graph_limit: numeric_env("EXTENDED_GRAPH_LIMIT", 200),
            target_location: required_env("TARGET_LOCATION"),
            min_match_ratio: env::var("MIN_MATCH_RATIO")
                .ok()
                .map(|v| v.parse().expect("MIN_MATCH_RATIO must be a number"))
                .unwrap_or(0.50),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn numeric_env(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .map(|v| v.parse().unwrap_or_else(|_| panic!("{key} must be a number")))
        .unwrap_or(default)
}
