use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::Error;
use crate::models::Story;

const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev/v1";
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: usize = 60;

/// A page-extraction service that answers a natural-language instruction with JSON
/// matching a schema.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(&self, url: &str, prompt: &str, schema: &Value) -> Result<Value>;
}

pub struct FirecrawlClient {
    http: Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    success: bool,
    id: Option<String>,
    status: Option<String>,
    data: Option<Value>,
    error: Option<String>,
}

impl FirecrawlClient {
    pub fn new(http: Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Points the client at another API root (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn extract_url(&self) -> String {
        format!("{}/extract", self.base_url)
    }

    async fn read(response: reqwest::Response) -> Result<ExtractResponse> {
        if !response.status().is_success() {
            return Err(Error::from_response("firecrawl", response).await.into());
        }
        response
            .json::<ExtractResponse>()
            .await
            .context("Failed to parse Firecrawl response")
    }

    async fn poll(&self, id: &str) -> Result<Value> {
        let url = format!("{}/{}", self.extract_url(), id);

        for _ in 0..MAX_POLLS {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .send()
                .await
                .context("Failed to poll Firecrawl extract job")?;
            let job = Self::read(response).await?;

            match job.status.as_deref() {
                Some("completed") => return Ok(job.data.unwrap_or(Value::Null)),
                Some("failed") | Some("cancelled") => {
                    return Err(Error::Service {
                        service: "firecrawl",
                        message: job.error.unwrap_or_else(|| "extract job failed".to_string()),
                    }
                    .into())
                }
                _ => continue,
            }
        }

        anyhow::bail!("Firecrawl extract job {} did not finish in time", id)
    }
}

#[async_trait]
impl PageExtractor for FirecrawlClient {
    async fn extract(&self, url: &str, prompt: &str, schema: &Value) -> Result<Value> {
        let body = json!({
            "urls": [url],
            "prompt": prompt,
            "schema": schema,
        });

        let response = self
            .http
            .post(self.extract_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Firecrawl")?;
        let started = Self::read(response).await?;

        if !started.success {
            return Err(Error::Service {
                service: "firecrawl",
                message: started.error.unwrap_or_else(|| "unknown error".to_string()),
            }
            .into());
        }

        match (started.data, started.id) {
            (Some(data), _) if !data.is_null() => Ok(data),
            (_, Some(id)) => self.poll(&id).await,
            _ => Ok(Value::Null),
        }
    }
}

/// JSON schema for `{stories: [{headline, link, date_posted}]}`.
pub fn stories_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "stories": {
                "type": "array",
                "description": "A list of today's AI or LLM-related stories",
                "items": {
                    "type": "object",
                    "properties": {
                        "headline": { "type": "string", "description": "Story or post headline" },
                        "link": { "type": "string", "description": "A link to the post or story" },
                        "date_posted": { "type": "string", "description": "The date the story or post was published" }
                    },
                    "required": ["headline", "link", "date_posted"]
                }
            }
        },
        "required": ["stories"]
    })
}

pub fn extraction_prompt(source: &str, today: &str) -> String {
    format!(
        r#"Return only today's AI or LLM related story or post headlines and links in JSON format from the page content.
They must be posted today, {today}. The format should be:
{{
  "stories": [
    {{
      "headline": "headline1",
      "link": "link1",
      "date_posted": "YYYY-MM-DD"
    }},
    ...
  ]
}}
If there are no AI or LLM stories from today, return {{"stories": []}}.

The source link is {source}.
If a story link is not absolute, prepend {source} to make it absolute.
Return only pure JSON in the specified format (no extra text, no markdown, no ```)."#
    )
}

pub async fn scrape_page(extractor: &dyn PageExtractor, source: &str) -> Result<Vec<Story>> {
    let prompt = extraction_prompt(source, &super::today());
    let data = extractor.extract(source, &prompt, &stories_schema()).await?;
    let stories = stories_from_extract(source, &data);
    tracing::info!(source = %source, count = stories.len(), "Extracted stories");
    Ok(stories)
}

/// Reads the `stories` array. A missing or malformed key yields no stories.
pub fn stories_from_extract(source: &str, data: &Value) -> Vec<Story> {
    let Some(raw) = data.get("stories") else {
        tracing::error!(source = %source, "Extracted data does not have a \"stories\" key");
        return Vec::new();
    };

    let mut stories: Vec<Story> = match serde_json::from_value(raw.clone()) {
        Ok(stories) => stories,
        Err(e) => {
            tracing::error!(source = %source, error = %e, "Extracted stories are malformed");
            return Vec::new();
        }
    };

    for story in &mut stories {
        story.link = absolutize(source, &story.link);
    }
    stories
}

/// Resolves a relative link against the source page; absolute or unparsable links
/// are returned unchanged.
pub fn absolutize(source: &str, link: &str) -> String {
    if url::Url::parse(link).is_ok() {
        return link.to_string();
    }
    url::Url::parse(source)
        .and_then(|base| base.join(link))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| link.to_string())
}
