use chrono::{DateTime, Utc};
use neo4rs::query;

use transnet_common::{Account, Tag, UNKNOWN_COUNT};

use crate::GraphClient;

/// Read-side wrapper for the graph: the lookups the pipeline needs to
/// rebuild its iteration sets on a resumed run. Result ordering is by
/// account id so progress output is stable across runs.
pub struct GraphReader {
    client: GraphClient,
}

impl GraphReader {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Look up an account by screen name.
    pub async fn account_by_screen_name(
        &self,
        screen_name: &str,
    ) -> Result<Option<Account>, neo4rs::Error> {
        let q = query("MATCH (a:Account {screen_name: $screen_name}) RETURN a LIMIT 1")
            .param("screen_name", screen_name);

        let mut stream = self.client.graph.execute(q).await?;
        if let Some(row) = stream.next().await? {
            return Ok(row_to_account(&row));
        }
        Ok(None)
    }

    /// Accounts with a FOLLOWS edge into the given account.
    pub async fn followers_of(&self, id: i64) -> Result<Vec<Account>, neo4rs::Error> {
        let q = query(
            "MATCH (f:Account)-[:FOLLOWS]->(a:Account {id: $id})
             RETURN f AS a ORDER BY a.id",
        )
        .param("id", id);

        self.collect_accounts(q).await
    }

    /// Accounts the given account has a FRIEND edge to.
    pub async fn friends_of(&self, id: i64) -> Result<Vec<Account>, neo4rs::Error> {
        let q = query(
            "MATCH (a:Account {id: $id})-[:FRIEND]->(f:Account)
             RETURN f AS a ORDER BY a.id",
        )
        .param("id", id);

        self.collect_accounts(q).await
    }

    /// Current member set of a tag.
    pub async fn tag_members(&self, tag: Tag) -> Result<Vec<Account>, neo4rs::Error> {
        let q = query(
            "MATCH (t:Tag {name: $name})-[:TAGGED]->(a:Account)
             RETURN a ORDER BY a.id",
        )
        .param("name", tag.name());

        self.collect_accounts(q).await
    }

    async fn collect_accounts(&self, q: neo4rs::Query) -> Result<Vec<Account>, neo4rs::Error> {
        let mut stream = self.client.graph.execute(q).await?;
        let mut accounts = Vec::new();
        while let Some(row) = stream.next().await? {
            if let Some(account) = row_to_account(&row) {
                accounts.push(account);
            }
        }
        Ok(accounts)
    }
}

/// Decode the `a` column of a row into an Account. Rows missing the id
/// are dropped; every other field falls back to its documented default.
fn row_to_account(row: &neo4rs::Row) -> Option<Account> {
    let n: neo4rs::Node = row.get("a").ok()?;

    let id: i64 = n.get("id").ok()?;
    let screen_name: String = n.get("screen_name").unwrap_or_default();
    let name: String = n.get("name").unwrap_or_default();
    let created_at = parse_datetime_prop(&n, "created_at");
    let location = non_empty(n.get("location").unwrap_or_default());
    let description = non_empty(n.get("description").unwrap_or_default());
    let followers_count: i64 = n.get("followers_count").unwrap_or(UNKNOWN_COUNT);
    let friends_count: i64 = n.get("friends_count").unwrap_or(UNKNOWN_COUNT);
    let statuses_count: i64 = n.get("statuses_count").unwrap_or(UNKNOWN_COUNT);
    let listed_count: i64 = n.get("listed_count").unwrap_or(UNKNOWN_COUNT);
    let favourites_count: i64 = n.get("favourites_count").unwrap_or(UNKNOWN_COUNT);
    let verified: bool = n.get("verified").unwrap_or(false);
    let lang = non_empty(n.get("lang").unwrap_or_default());
    let time_zone = non_empty(n.get("time_zone").unwrap_or_default());
    let utc_offset = match n.get::<i64>("utc_offset").unwrap_or(UNKNOWN_COUNT) {
        v if v == UNKNOWN_COUNT => None,
        v => Some(v as i32),
    };

    Some(Account {
        id,
        screen_name,
        name,
        created_at,
        location,
        description,
        followers_count,
        friends_count,
        statuses_count,
        listed_count,
        favourites_count,
        verified,
        lang,
        time_zone,
        utc_offset,
    })
}

/// Writer stores timestamps as RFC 3339 strings, "" when absent.
fn parse_datetime_prop(n: &neo4rs::Node, prop: &str) -> Option<DateTime<Utc>> {
    let s: String = n.get(prop).ok()?;
    DateTime::parse_from_rfc3339(&s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
