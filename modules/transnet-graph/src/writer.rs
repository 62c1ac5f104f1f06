use chrono::{DateTime, Utc};
use neo4rs::query;

use transnet_common::{Account, Edge, Status, Tag, UNKNOWN_COUNT};

use crate::GraphClient;

/// Write-side wrapper for the graph. All writes are MERGE-based
/// insert-if-absent or additive set-union, so every operation is
/// idempotent and a re-run of any phase cannot create duplicates.
pub struct GraphWriter {
    client: GraphClient,
}

impl GraphWriter {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Persist an account if absent. An existing node with the same id is
    /// left untouched — profiles are never updated in place.
    pub async fn put_account(&self, a: &Account) -> Result<(), neo4rs::Error> {
        let q = query(
            "MERGE (a:Account {id: $id})
             ON CREATE SET
                a.screen_name = $screen_name,
                a.name = $name,
                a.created_at = $created_at,
                a.location = $location,
                a.description = $description,
                a.followers_count = $followers_count,
                a.friends_count = $friends_count,
                a.statuses_count = $statuses_count,
                a.listed_count = $listed_count,
                a.favourites_count = $favourites_count,
                a.verified = $verified,
                a.lang = $lang,
                a.time_zone = $time_zone,
                a.utc_offset = $utc_offset",
        )
        .param("id", a.id)
        .param("screen_name", a.screen_name.as_str())
        .param("name", a.name.as_str())
        .param("created_at", format_datetime(a.created_at.as_ref()))
        .param("location", a.location.as_deref().unwrap_or(""))
        .param("description", a.description.as_deref().unwrap_or(""))
        .param("followers_count", a.followers_count)
        .param("friends_count", a.friends_count)
        .param("statuses_count", a.statuses_count)
        .param("listed_count", a.listed_count)
        .param("favourites_count", a.favourites_count)
        .param("verified", a.verified)
        .param("lang", a.lang.as_deref().unwrap_or(""))
        .param("time_zone", a.time_zone.as_deref().unwrap_or(""))
        .param(
            "utc_offset",
            a.utc_offset.map(i64::from).unwrap_or(UNKNOWN_COUNT),
        );

        self.client.graph.run(q).await
    }

    /// Persist a directed edge between two already-persisted accounts.
    /// Missing endpoints make the MATCH empty, so the write is a no-op
    /// rather than an orphan edge.
    pub async fn put_edge(&self, edge: &Edge) -> Result<(), neo4rs::Error> {
        let cypher = format!(
            "MATCH (s:Account {{id: $source_id}})
             MATCH (t:Account {{id: $target_id}})
             MERGE (s)-[:{}]->(t)",
            edge.kind.rel_type(),
        );
        let q = query(&cypher)
            .param("source_id", edge.source_id)
            .param("target_id", edge.target_id);

        self.client.graph.run(q).await
    }

    /// Persist a status and its POSTED relation to the sender.
    pub async fn put_status(&self, status: &Status) -> Result<(), neo4rs::Error> {
        let q = query(
            "MATCH (a:Account {id: $sender_id})
             MERGE (s:Status {id: $id})
             ON CREATE SET
                s.text = $text,
                s.created_at = $created_at
             MERGE (a)-[:POSTED]->(s)",
        )
        .param("id", status.id)
        .param("sender_id", status.sender_id)
        .param("text", status.text.as_str())
        .param("created_at", format_datetime(status.created_at.as_ref()));

        self.client.graph.run(q).await
    }

    /// Add an account to a tag's member set. Re-adding is a no-op.
    pub async fn tag_add(&self, tag: Tag, node_id: i64) -> Result<(), neo4rs::Error> {
        let q = query(
            "MATCH (a:Account {id: $node_id})
             MERGE (t:Tag {name: $name})
             MERGE (t)-[:TAGGED]->(a)",
        )
        .param("node_id", node_id)
        .param("name", tag.name());

        self.client.graph.run(q).await
    }
}

/// Timestamps are stored as RFC 3339 strings; absent ones as "".
fn format_datetime(dt: Option<&DateTime<Utc>>) -> String {
    dt.map(|d| d.to_rfc3339()).unwrap_or_default()
}
