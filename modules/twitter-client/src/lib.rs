pub mod error;
pub mod types;

pub use error::{Result, TwitterError};
pub use types::{parse_created_at, CursorPage, Tweet, TweetUser, UserProfile};

use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;

const BASE_URL: &str = "https://api.twitter.com/1.1";

/// Max users the listing endpoints return per page.
const PAGE_SIZE: u32 = 200;

/// Max statuses a single timeline call returns.
const TIMELINE_COUNT: u32 = 200;

/// Max attempts per request when the API answers 429. The pipeline treats
/// a request that is still rate-limited after this as a failed item.
const RATE_LIMIT_MAX_ATTEMPTS: u32 = 3;
/// Base backoff for 429 retries. Actual delay is base * 3^attempt + jitter.
const RATE_LIMIT_RETRY_BASE: Duration = Duration::from_secs(15);

pub struct TwitterClient {
    client: reqwest::Client,
    bearer_token: String,
}

impl TwitterClient {
    pub fn new(bearer_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bearer_token,
        }
    }

    /// Fetch a single user profile by screen name.
    pub async fn get_user(&self, screen_name: &str) -> Result<UserProfile> {
        let url = format!(
            "{}/users/show.json?screen_name={}",
            BASE_URL,
            urlencode(screen_name)
        );
        self.get_json(&url).await
    }

    /// Fetch up to `limit` followers of a user, walking the cursor.
    pub async fn get_followers(&self, user_id: i64, limit: u32) -> Result<Vec<UserProfile>> {
        self.get_connection_list("followers", user_id, limit).await
    }

    /// Fetch up to `limit` friends (accounts the user follows), walking
    /// the cursor.
    pub async fn get_friends(&self, user_id: i64, limit: u32) -> Result<Vec<UserProfile>> {
        self.get_connection_list("friends", user_id, limit).await
    }

    /// Fetch the most recent statuses on a user's timeline.
    pub async fn get_user_timeline(&self, user_id: i64) -> Result<Vec<Tweet>> {
        let url = format!(
            "{}/statuses/user_timeline.json?user_id={}&count={}&trim_user=false",
            BASE_URL, user_id, TIMELINE_COUNT
        );
        self.get_json(&url).await
    }

    async fn get_connection_list(
        &self,
        endpoint: &str,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<UserProfile>> {
        let mut users: Vec<UserProfile> = Vec::new();
        let mut cursor: i64 = -1;

        while (users.len() as u32) < limit {
            let count = PAGE_SIZE.min(limit - users.len() as u32);
            let url = format!(
                "{}/{}/list.json?user_id={}&count={}&cursor={}&skip_status=true",
                BASE_URL, endpoint, user_id, count, cursor
            );
            let page: CursorPage = self.get_json(&url).await?;
            let page_len = page.users.len();
            users.extend(page.users);

            if page.next_cursor == 0 || page_len == 0 {
                break;
            }
            cursor = page.next_cursor;
        }

        users.truncate(limit as usize);
        Ok(users)
    }

    /// GET a JSON endpoint with bearer auth. Retries 429 responses up to
    /// RATE_LIMIT_MAX_ATTEMPTS with exponential backoff (15s, 45s) plus
    /// random jitter (0-1s), then surfaces `RateLimited`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            let resp = self
                .client
                .get(url)
                .bearer_auth(&self.bearer_token)
                .send()
                .await?;

            let status = resp.status();
            if status.as_u16() == 429 {
                attempt += 1;
                if attempt >= RATE_LIMIT_MAX_ATTEMPTS {
                    return Err(TwitterError::RateLimited);
                }
                let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
                let delay = RATE_LIMIT_RETRY_BASE * 3u32.pow(attempt - 1) + jitter;
                tracing::warn!(
                    url,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                continue;
            }
            if status.as_u16() == 404 {
                return Err(TwitterError::NotFound(url.to_string()));
            }
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(TwitterError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            return Ok(resp.json().await?);
        }
    }
}

/// Percent-encode the handful of characters that can appear in a screen
/// name query value. Screen names are alphanumeric plus underscore, so
/// this only guards against garbage input reaching the URL.
fn urlencode(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
