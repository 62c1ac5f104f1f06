// Trait abstractions for the pipeline's two external collaborators.
//
// RemoteGraphSource — the rate-limited profile/edge/status API.
// GraphStore — durable node/edge/status/tag storage with tag queries.
//
// These enable deterministic pipeline testing with MockRemoteSource and
// MemoryGraphStore: no network, no database.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use transnet_common::{Account, Edge, Status, Tag};

/// Per-item failure from the remote API. Rate limiting has already been
/// retried at the client boundary; whatever surfaces here is final for
/// the current item. The phase logs it and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limit exceeded")]
    RateLimited,

    /// Missing, deleted, or protected account.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("transient network failure: {0}")]
    Transient(String),
}

/// The remote social-graph API.
#[async_trait]
pub trait RemoteGraphSource: Send + Sync {
    /// Fetch a single profile by screen name.
    async fn get_profile(&self, screen_name: &str) -> Result<Account, FetchError>;

    /// Fetch up to `limit` followers of an account.
    async fn get_follow_edges(
        &self,
        account: &Account,
        limit: u32,
    ) -> Result<Vec<Account>, FetchError>;

    /// Fetch up to `limit` friends (accounts this account follows).
    async fn get_friend_edges(
        &self,
        account: &Account,
        limit: u32,
    ) -> Result<Vec<Account>, FetchError>;

    /// Fetch an account's recent messages.
    async fn get_recent_messages(&self, account: &Account) -> Result<Vec<Status>, FetchError>;
}

/// Durable graph storage. Every write is insert-if-absent or additive
/// set-union, so concurrent or repeated writes are safe.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn put_node(&self, account: &Account) -> Result<()>;

    /// Persist an edge between two already-persisted accounts. An edge
    /// whose endpoints are missing is dropped, not created dangling.
    async fn put_edge(&self, edge: &Edge) -> Result<()>;

    async fn put_status(&self, status: &Status) -> Result<()>;

    /// Add an account to a tag's member set (idempotent union).
    async fn tag_add(&self, tag: Tag, node_id: i64) -> Result<()>;

    /// Current member set of a tag, ordered by account id.
    async fn tag_members(&self, tag: Tag) -> Result<Vec<Account>>;

    async fn node_by_screen_name(&self, screen_name: &str) -> Result<Option<Account>>;

    /// Accounts with a FOLLOWS edge into the given account.
    async fn followers_of(&self, id: i64) -> Result<Vec<Account>>;

    /// Accounts the given account has a FRIEND edge to.
    async fn friends_of(&self, id: i64) -> Result<Vec<Account>>;
}
