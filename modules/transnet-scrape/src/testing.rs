// Test mocks for the pipeline's two trait boundaries:
// - MockRemoteSource (RemoteGraphSource) — HashMap fixtures keyed by
//   screen name, builder pattern, call recording, injectable failures
// - MemoryGraphStore (GraphStore) — stateful in-memory graph with
//   insert-if-absent semantics matching the Neo4j writer
//
// Plus helpers for constructing Accounts and ScrapeConfigs.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use transnet_common::{Account, Edge, EdgeKind, ScrapeConfig, Status, Tag, UNKNOWN_COUNT};

use crate::traits::{FetchError, GraphStore, RemoteGraphSource};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Build a minimal account for testing.
pub fn account(id: i64, screen_name: &str, location: Option<&str>) -> Account {
    Account {
        id,
        screen_name: screen_name.to_string(),
        name: screen_name.to_string(),
        created_at: None,
        location: location.map(str::to_string),
        description: None,
        followers_count: UNKNOWN_COUNT,
        friends_count: UNKNOWN_COUNT,
        statuses_count: UNKNOWN_COUNT,
        listed_count: UNKNOWN_COUNT,
        favourites_count: UNKNOWN_COUNT,
        verified: false,
        lang: None,
        time_zone: None,
        utc_offset: None,
    }
}

/// Build a status for testing.
pub fn status(id: i64, sender_id: i64, text: &str) -> Status {
    Status {
        id,
        sender_id,
        text: text.to_string(),
        created_at: None,
    }
}

/// Scrape config pointed at the given root, matching against "Berlin"
/// with the default 0.5 ratio.
pub fn test_config(root: &str) -> ScrapeConfig {
    ScrapeConfig {
        root_user_screen_name: root.to_string(),
        root_user_follower_limit: 200,
        filter_graph_sample_limit: 200,
        extended_graph_limit: 200,
        target_location: "Berlin".to_string(),
        min_match_ratio: 0.5,
    }
}

// ---------------------------------------------------------------------------
// MockRemoteSource
// ---------------------------------------------------------------------------

/// HashMap-based remote source. Returns `NotFound` for unregistered
/// screen names and `Transient` for names marked failing. Every call is
/// recorded as `"op:screen_name"` for boundary assertions.
#[derive(Default)]
pub struct MockRemoteSource {
    profiles: HashMap<String, Account>,
    followers: HashMap<String, Vec<Account>>,
    friends: HashMap<String, Vec<Account>>,
    statuses: HashMap<String, Vec<Status>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockRemoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_profile(mut self, account: Account) -> Self {
        self.profiles.insert(account.screen_name.clone(), account);
        self
    }

    pub fn on_followers(mut self, screen_name: &str, followers: Vec<Account>) -> Self {
        self.followers.insert(screen_name.to_string(), followers);
        self
    }

    pub fn on_friends(mut self, screen_name: &str, friends: Vec<Account>) -> Self {
        self.friends.insert(screen_name.to_string(), friends);
        self
    }

    pub fn on_statuses(mut self, screen_name: &str, statuses: Vec<Status>) -> Self {
        self.statuses.insert(screen_name.to_string(), statuses);
        self
    }

    /// Every fetch touching this screen name fails with a transient error.
    pub fn failing(mut self, screen_name: &str) -> Self {
        self.failing.insert(screen_name.to_string());
        self
    }

    /// All calls made so far, as `"op:screen_name"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str, screen_name: &str) -> Result<(), FetchError> {
        self.calls.lock().unwrap().push(format!("{op}:{screen_name}"));
        if self.failing.contains(screen_name) {
            return Err(FetchError::Transient(format!("injected failure for {screen_name}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteGraphSource for MockRemoteSource {
    async fn get_profile(&self, screen_name: &str) -> Result<Account, FetchError> {
        self.record("get_profile", screen_name)?;
        self.profiles
            .get(screen_name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(screen_name.to_string()))
    }

    async fn get_follow_edges(
        &self,
        account: &Account,
        limit: u32,
    ) -> Result<Vec<Account>, FetchError> {
        self.record("get_follow_edges", &account.screen_name)?;
        let mut followers = self
            .followers
            .get(&account.screen_name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(account.screen_name.clone()))?;
        followers.truncate(limit as usize);
        Ok(followers)
    }

    async fn get_friend_edges(
        &self,
        account: &Account,
        limit: u32,
    ) -> Result<Vec<Account>, FetchError> {
        self.record("get_friend_edges", &account.screen_name)?;
        let mut friends = self
            .friends
            .get(&account.screen_name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(account.screen_name.clone()))?;
        friends.truncate(limit as usize);
        Ok(friends)
    }

    async fn get_recent_messages(&self, account: &Account) -> Result<Vec<Status>, FetchError> {
        self.record("get_recent_messages", &account.screen_name)?;
        self.statuses
            .get(&account.screen_name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(account.screen_name.clone()))
    }
}

// ---------------------------------------------------------------------------
// MemoryGraphStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryGraphInner {
    nodes: HashMap<i64, Account>,
    edges: HashSet<Edge>,
    statuses: HashMap<i64, Status>,
    tags: BTreeMap<String, BTreeSet<i64>>,
}

/// Stateful in-memory graph mirroring the Neo4j store's semantics:
/// insert-if-absent nodes and statuses, set-union edges and tags, and
/// edge/tag writes that silently drop when an endpoint is missing.
#[derive(Default)]
pub struct MemoryGraphStore {
    inner: Mutex<MemoryGraphInner>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_ids(&self) -> BTreeSet<i64> {
        self.inner.lock().unwrap().nodes.keys().copied().collect()
    }

    pub fn edges(&self) -> Vec<Edge> {
        let inner = self.inner.lock().unwrap();
        let mut edges: Vec<Edge> = inner.edges.iter().copied().collect();
        edges.sort_by_key(|e| (e.source_id, e.target_id, e.kind.rel_type()));
        edges
    }

    pub fn status_ids(&self) -> BTreeSet<i64> {
        self.inner.lock().unwrap().statuses.keys().copied().collect()
    }

    pub fn tag_ids(&self, tag: Tag) -> BTreeSet<i64> {
        self.inner
            .lock()
            .unwrap()
            .tags
            .get(tag.name())
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn put_node(&self, account: &Account) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.nodes.entry(account.id).or_insert_with(|| account.clone());
        Ok(())
    }

    async fn put_edge(&self, edge: &Edge) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.nodes.contains_key(&edge.source_id) && inner.nodes.contains_key(&edge.target_id) {
            inner.edges.insert(*edge);
        }
        Ok(())
    }

    async fn put_status(&self, status: &Status) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .statuses
            .entry(status.id)
            .or_insert_with(|| status.clone());
        Ok(())
    }

    async fn tag_add(&self, tag: Tag, node_id: i64) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.nodes.contains_key(&node_id) {
            inner.tags.entry(tag.name().to_string()).or_default().insert(node_id);
        }
        Ok(())
    }

    async fn tag_members(&self, tag: Tag) -> anyhow::Result<Vec<Account>> {
        let inner = self.inner.lock().unwrap();
        let ids = inner.tags.get(tag.name()).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| inner.nodes.get(&id).cloned())
            .collect())
    }

    async fn node_by_screen_name(&self, screen_name: &str) -> anyhow::Result<Option<Account>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .nodes
            .values()
            .find(|a| a.screen_name == screen_name)
            .cloned())
    }

    async fn followers_of(&self, id: i64) -> anyhow::Result<Vec<Account>> {
        let inner = self.inner.lock().unwrap();
        let mut ids: Vec<i64> = inner
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Follows && e.target_id == id)
            .map(|e| e.source_id)
            .collect();
        ids.sort_unstable();
        Ok(ids
            .into_iter()
            .filter_map(|id| inner.nodes.get(&id).cloned())
            .collect())
    }

    async fn friends_of(&self, id: i64) -> anyhow::Result<Vec<Account>> {
        let inner = self.inner.lock().unwrap();
        let mut ids: Vec<i64> = inner
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Friend && e.source_id == id)
            .map(|e| e.target_id)
            .collect();
        ids.sort_unstable();
        Ok(ids
            .into_iter()
            .filter_map(|id| inner.nodes.get(&id).cloned())
            .collect())
    }
}
