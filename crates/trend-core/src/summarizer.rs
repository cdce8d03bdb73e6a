use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::fallback::attempt_or;
use crate::models::Story;

pub const NO_STORIES_NOTICE: &str = "No trending stories or tweets found at this time.";
pub const MISSING_KEY_NOTICE: &str = "Error: OpenAI API key not configured.";
pub const DRAFT_ERROR: &str = "Error generating draft post.";

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that creates a concise, bullet-pointed draft post based on input stories and tweets. \
Return strictly valid JSON that has a key 'interestingTweetsOrStories' containing an array of items. \
Each item should have a 'description' and a 'story_or_tweet_link' key.";

/// A generative-text service: one system instruction plus one user message in,
/// the model's reply (if any) out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<Option<String>>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    reasoning_effort: &'a str,
    n: u32,
    response_format: ResponseFormat,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            model: "o3-mini".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the client at another API root (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<Option<String>> {
        let request = ChatRequest {
            model: &self.model,
            reasoning_effort: "medium",
            n: 1,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        if !response.status().is_success() {
            return Err(Error::from_response("openai", response).await.into());
        }

        let chat = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse OpenAI API response")?;

        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content))
    }
}

/// One bullet of the reply. Older replies used `headline`/`link`.
#[derive(Debug, Deserialize)]
struct DraftItem {
    description: Option<String>,
    headline: Option<String>,
    story_or_tweet_link: Option<String>,
    link: Option<String>,
}

impl DraftItem {
    fn render(self) -> String {
        let pick = |a: Option<String>, b: Option<String>| {
            a.filter(|s| !s.is_empty())
                .or(b)
                .unwrap_or_default()
        };
        format!(
            "• {}\n  {}",
            pick(self.description, self.headline),
            pick(self.story_or_tweet_link, self.link)
        )
    }
}

#[derive(Debug, Deserialize)]
struct DraftReply {
    #[serde(rename = "interestingTweetsOrStories")]
    items: Option<Vec<DraftItem>>,
    stories: Option<Vec<DraftItem>>,
}

#[derive(Serialize)]
struct StoriesPayload<'a> {
    stories: &'a [Story],
}

pub fn draft_header() -> String {
    format!(
        "🚀 AI and LLM Trends on X for {}\n\n",
        chrono::Local::now().format("%-m/%-d/%Y")
    )
}

/// Turns a batch of stories into a bullet-pointed draft. Never fails: every problem
/// becomes a notice in the returned text.
pub struct DraftSummarizer<'a> {
    generator: Option<&'a dyn TextGenerator>,
}

impl<'a> DraftSummarizer<'a> {
    pub fn new(generator: Option<&'a dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn summarize(&self, stories: &[Story]) -> String {
        tracing::info!(count = stories.len(), "Generating a post draft");
        let header = draft_header();

        if stories.is_empty() {
            return header + NO_STORIES_NOTICE;
        }

        let Some(generator) = self.generator else {
            tracing::error!("OpenAI API key is not provided");
            return header + MISSING_KEY_NOTICE;
        };

        attempt_or(
            "draft",
            DRAFT_ERROR.to_string(),
            self.generate(generator, stories, header),
        )
        .await
    }

    async fn generate(
        &self,
        generator: &dyn TextGenerator,
        stories: &[Story],
        header: String,
    ) -> Result<String> {
        let payload = serde_json::to_string(&StoriesPayload { stories })?;
        let reply = generator.complete(SYSTEM_PROMPT, &payload).await?;

        let Some(raw) = reply.filter(|r| !r.trim().is_empty()) else {
            tracing::warn!("No JSON output returned from the model");
            return Ok(header + NO_STORIES_NOTICE);
        };
        tracing::debug!(reply = %raw, "Model reply");

        let bullets = match parse_reply(&raw) {
            Ok(bullets) => bullets,
            Err(e) => {
                tracing::warn!(error = %e, "Model reply is not valid JSON");
                return Ok(header + NO_STORIES_NOTICE);
            }
        };

        if bullets.is_empty() {
            return Ok(header + NO_STORIES_NOTICE);
        }

        Ok(header + &bullets.join("\n\n"))
    }
}

/// Parses the model reply into rendered bullets (`• description\n  link`).
pub fn parse_reply(raw: &str) -> serde_json::Result<Vec<String>> {
    let reply: DraftReply = serde_json::from_str(raw.trim())?;
    let items = reply.items.or(reply.stories).unwrap_or_default();

    Ok(items.into_iter().map(DraftItem::render).collect())
}
