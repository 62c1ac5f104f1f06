use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A user object as returned by `users/show` and the follower/friend
/// listing endpoints. Everything beyond the id and screen name is
/// optional — suspended and partial profiles omit fields freely.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub followers_count: Option<i64>,
    #[serde(default)]
    pub friends_count: Option<i64>,
    #[serde(default)]
    pub statuses_count: Option<i64>,
    #[serde(default)]
    pub listed_count: Option<i64>,
    #[serde(default)]
    pub favourites_count: Option<i64>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub utc_offset: Option<i32>,
}

/// One page of a cursored follower/friend listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CursorPage {
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub next_cursor: i64,
}

/// A tweet from `statuses/user_timeline`.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user: Option<TweetUser>,
}

/// Minimal author reference embedded in a tweet.
#[derive(Debug, Clone, Deserialize)]
pub struct TweetUser {
    pub id: i64,
}

/// Parse the REST API's `created_at` format
/// (`Mon Nov 29 21:18:15 +0000 2010`) into UTC. Returns `None` on any
/// malformed input rather than failing the surrounding call.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_rest_timestamp() {
        let dt = parse_created_at("Mon Nov 29 21:18:15 +0000 2010").unwrap();
        assert_eq!(dt.year(), 2010);
        assert_eq!(dt.month(), 11);
        assert_eq!(dt.day(), 29);
    }

    #[test]
    fn malformed_timestamp_is_none() {
        assert!(parse_created_at("not a date").is_none());
        assert!(parse_created_at("").is_none());
    }
}
