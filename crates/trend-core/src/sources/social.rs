use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::error::Error;
use crate::models::Story;

const DEFAULT_BASE_URL: &str = "https://api.x.com/2";
const MAX_RESULTS: u32 = 10;

/// Recent-post search against a social API. Returns the raw response body.
#[async_trait]
pub trait PostSearch: Send + Sync {
    async fn search_recent(&self, query: &str, start_time: &str) -> Result<Value>;
}

/// X (Twitter) API v2 client authenticated with an app bearer token.
pub struct XClient {
    http: Client,
    bearer_token: String,
    base_url: String,
}

impl XClient {
    pub fn new(http: Client, bearer_token: String) -> Self {
        Self {
            http,
            bearer_token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the client at another API root (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PostSearch for XClient {
    async fn search_recent(&self, query: &str, start_time: &str) -> Result<Value> {
        let url = format!(
            "{}/tweets/search/recent?query={}&max_results={}&start_time={}",
            self.base_url,
            urlencoding::encode(query),
            MAX_RESULTS,
            urlencoding::encode(start_time)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .context("Failed to send request to X API")?;

        if !response.status().is_success() {
            return Err(Error::from_response("x", response).await.into());
        }

        response
            .json::<Value>()
            .await
            .context("Failed to parse X API response")
    }
}

/// Posts from `handle` in the trailing 24 hours with media, no retweets or replies.
pub fn recent_media_query(handle: &str) -> String {
    format!("from:{} has:media -is:retweet -is:reply", handle)
}

pub async fn scrape_social(search: &dyn PostSearch, handle: &str) -> Result<Vec<Story>> {
    let start_time = (Utc::now() - Duration::hours(24)).to_rfc3339_opts(SecondsFormat::Millis, true);
    let body = search
        .search_recent(&recent_media_query(handle), &start_time)
        .await?;
    Ok(posts_to_stories(handle, &body, &start_time))
}

/// Maps a search response to stories, stamping each with `date_posted`.
pub fn posts_to_stories(handle: &str, body: &Value, date_posted: &str) -> Vec<Story> {
    if body.pointer("/meta/result_count").and_then(Value::as_u64) == Some(0) {
        tracing::info!(handle, "No posts found");
        return Vec::new();
    }

    let Some(posts) = body.get("data").and_then(Value::as_array) else {
        let data = body.get("data").cloned().unwrap_or(Value::Null);
        tracing::error!(handle, %data, "Expected post data to be an array");
        return Vec::new();
    };

    let stories: Vec<Story> = posts
        .iter()
        .filter_map(|post| {
            let id = post.get("id").and_then(Value::as_str)?;
            let text = post.get("text").and_then(Value::as_str).unwrap_or_default();
            Some(Story::new(
                text,
                format!("https://x.com/i/status/{}", id),
                date_posted,
            ))
        })
        .collect();

    tracing::info!(handle, count = stories.len(), "Posts found");
    stories
}
