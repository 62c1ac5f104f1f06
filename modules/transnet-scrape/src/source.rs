//! RemoteGraphSource adapter over the REST client.
//!
//! Converts wire types into domain types, applying the documented field
//! defaults so that missing or malformed attributes never propagate past
//! this boundary.

use async_trait::async_trait;

use transnet_common::{Account, Status, UNKNOWN_COUNT};
use twitter_client::{parse_created_at, Tweet, TwitterClient, TwitterError, UserProfile};

use crate::traits::{FetchError, RemoteGraphSource};

pub struct TwitterSource {
    client: TwitterClient,
}

impl TwitterSource {
    pub fn new(client: TwitterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteGraphSource for TwitterSource {
    async fn get_profile(&self, screen_name: &str) -> Result<Account, FetchError> {
        let profile = self
            .client
            .get_user(screen_name)
            .await
            .map_err(fetch_error)?;
        Ok(account_from_profile(profile))
    }

    async fn get_follow_edges(
        &self,
        account: &Account,
        limit: u32,
    ) -> Result<Vec<Account>, FetchError> {
        let profiles = self
            .client
            .get_followers(account.id, limit)
            .await
            .map_err(fetch_error)?;
        Ok(profiles.into_iter().map(account_from_profile).collect())
    }

    async fn get_friend_edges(
        &self,
        account: &Account,
        limit: u32,
    ) -> Result<Vec<Account>, FetchError> {
        let profiles = self
            .client
            .get_friends(account.id, limit)
            .await
            .map_err(fetch_error)?;
        Ok(profiles.into_iter().map(account_from_profile).collect())
    }

    async fn get_recent_messages(&self, account: &Account) -> Result<Vec<Status>, FetchError> {
        let tweets = self
            .client
            .get_user_timeline(account.id)
            .await
            .map_err(fetch_error)?;
        Ok(tweets
            .into_iter()
            .map(|t| status_from_tweet(t, account.id))
            .collect())
    }
}

fn fetch_error(e: TwitterError) -> FetchError {
    match e {
        TwitterError::RateLimited => FetchError::RateLimited,
        TwitterError::NotFound(what) => FetchError::NotFound(what),
        // 401/403: suspended or protected account — gone for our purposes.
        TwitterError::Api { status, message } if status == 401 || status == 403 => {
            FetchError::NotFound(format!("status {status}: {message}"))
        }
        other => FetchError::Transient(other.to_string()),
    }
}

/// Apply the documented defaults: `UNKNOWN_COUNT` for omitted counters,
/// `None` for empty strings, false for an omitted verified flag.
fn account_from_profile(p: UserProfile) -> Account {
    Account {
        id: p.id,
        screen_name: p.screen_name,
        name: p.name.unwrap_or_default(),
        created_at: p.created_at.as_deref().and_then(parse_created_at),
        location: p.location.filter(|v| !v.is_empty()),
        description: p.description.filter(|v| !v.is_empty()),
        followers_count: p.followers_count.unwrap_or(UNKNOWN_COUNT),
        friends_count: p.friends_count.unwrap_or(UNKNOWN_COUNT),
        statuses_count: p.statuses_count.unwrap_or(UNKNOWN_COUNT),
        listed_count: p.listed_count.unwrap_or(UNKNOWN_COUNT),
        favourites_count: p.favourites_count.unwrap_or(UNKNOWN_COUNT),
        verified: p.verified.unwrap_or(false),
        lang: p.lang.filter(|v| !v.is_empty()),
        time_zone: p.time_zone.filter(|v| !v.is_empty()),
        utc_offset: p.utc_offset,
    }
}

fn status_from_tweet(t: Tweet, fallback_sender: i64) -> Status {
    Status {
        id: t.id,
        sender_id: t.user.map(|u| u.id).unwrap_or(fallback_sender),
        text: t.text.unwrap_or_default(),
        created_at: t.created_at.as_deref().and_then(parse_created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_profile() -> UserProfile {
        UserProfile {
            id: 42,
            screen_name: "someone".to_string(),
            name: None,
            created_at: None,
            location: Some(String::new()),
            description: None,
            followers_count: None,
            friends_count: None,
            statuses_count: None,
            listed_count: None,
            favourites_count: None,
            verified: None,
            lang: None,
            time_zone: None,
            utc_offset: None,
        }
    }

    #[test]
    fn missing_fields_get_documented_defaults() {
        let account = account_from_profile(minimal_profile());
        assert_eq!(account.id, 42);
        assert_eq!(account.followers_count, UNKNOWN_COUNT);
        assert_eq!(account.friends_count, UNKNOWN_COUNT);
        assert!(!account.verified);
        // Empty-string location normalizes to None.
        assert_eq!(account.location, None);
    }

    #[test]
    fn tweet_without_author_falls_back_to_fetched_account() {
        let tweet = Tweet {
            id: 7,
            text: Some("hello".to_string()),
            created_at: None,
            user: None,
        };
        let status = status_from_tweet(tweet, 42);
        assert_eq!(status.sender_id, 42);
        assert_eq!(status.text, "hello");
    }
}
