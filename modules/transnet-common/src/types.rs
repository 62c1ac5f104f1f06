use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel for numeric profile counters the API did not supply.
/// Real counters are always >= 0.
pub const UNKNOWN_COUNT: i64 = -1;

/// A social-graph account. Created on first profile fetch or first
/// edge-traversal discovery; never updated in place and never deleted.
///
/// Field defaults when the API omits a value: counters fall back to
/// [`UNKNOWN_COUNT`], `verified` to false, and the optional strings to
/// `None`. An empty-string `location` from the API is normalized to
/// `None` at conversion time so filter code only sees real values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub screen_name: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub followers_count: i64,
    pub friends_count: i64,
    pub statuses_count: i64,
    pub listed_count: i64,
    pub favourites_count: i64,
    pub verified: bool,
    pub lang: Option<String>,
    pub time_zone: Option<String>,
    pub utc_offset: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Follows,
    Friend,
}

impl EdgeKind {
    /// Relationship type stored in the graph.
    pub fn rel_type(self) -> &'static str {
        match self {
            EdgeKind::Follows => "FOLLOWS",
            EdgeKind::Friend => "FRIEND",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rel_type())
    }
}

/// A directed relation between two persisted accounts.
/// `(source, target, kind)` triples are unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: i64,
    pub target_id: i64,
    pub kind: EdgeKind,
}

/// A message posted by exactly one account. Created only during the
/// status-pull phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    pub sender_id: i64,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Named node-set labels produced by the filter passes. Membership only
/// ever grows within a run, so re-running a filter phase is safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Filter0,
    Filter1,
}

impl Tag {
    /// Storage name of the tag.
    pub fn name(self) -> &'static str {
        match self {
            Tag::Filter0 => "FILTER_0",
            Tag::Filter1 => "FILTER_1",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_storage_names() {
        assert_eq!(Tag::Filter0.name(), "FILTER_0");
        assert_eq!(Tag::Filter1.name(), "FILTER_1");
    }

    #[test]
    fn edge_rel_types() {
        assert_eq!(EdgeKind::Follows.rel_type(), "FOLLOWS");
        assert_eq!(EdgeKind::Friend.rel_type(), "FRIEND");
    }

    #[test]
    fn edges_are_hashable_triples() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let e = Edge { source_id: 1, target_id: 2, kind: EdgeKind::Follows };
        set.insert(e);
        set.insert(e);
        set.insert(Edge { source_id: 1, target_id: 2, kind: EdgeKind::Friend });
        assert_eq!(set.len(), 2);
    }
}
