use anyhow::Context;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::aggregator::aggregate_all;
use crate::config::Config;
use crate::error::Result;
use crate::models::{RunResult, SourceDescriptor};
use crate::notify::Driver;
use crate::sources::{FirecrawlClient, Scrape, SourceScraper, XClient};
use crate::summarizer::{DraftSummarizer, OpenAiClient, TextGenerator};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; TrendCompass/1.0)";

/// One fetch → summarize → notify pass. Clients are built once per pipeline and
/// shared by every step of a run.
pub struct Pipeline {
    http: Client,
    scraper: Box<dyn Scrape>,
    generator: Option<Box<dyn TextGenerator>>,
}

impl Pipeline {
    pub fn new(
        http: Client,
        scraper: Box<dyn Scrape>,
        generator: Option<Box<dyn TextGenerator>>,
    ) -> Self {
        Self {
            http,
            scraper,
            generator,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(USER_AGENT)
            .build()?;

        let mut scraper = SourceScraper::new(http.clone());
        if let Some(key) = &config.firecrawl_api_key {
            scraper = scraper.with_extractor(Arc::new(FirecrawlClient::new(http.clone(), key.clone())));
        }
        if let Some(token) = &config.x_bearer_token {
            scraper = scraper.with_social(Arc::new(XClient::new(http.clone(), token.clone())));
        }

        let generator = config
            .openai_api_key
            .as_ref()
            .map(|key| Box::new(OpenAiClient::new(http.clone(), key.clone())) as Box<dyn TextGenerator>);

        Ok(Self::new(http, Box::new(scraper), generator))
    }

    pub async fn run(&self, sources: &[SourceDescriptor], driver: Option<&Driver>) -> RunResult {
        match self.execute(sources, driver).await {
            Ok(draft) => RunResult::completed(draft),
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "Error running TrendCompass");
                RunResult::failed(&e)
            }
        }
    }

    async fn execute(
        &self,
        sources: &[SourceDescriptor],
        driver: Option<&Driver>,
    ) -> anyhow::Result<String> {
        let stories = aggregate_all(self.scraper.as_ref(), sources).await;

        let draft = DraftSummarizer::new(self.generator.as_deref())
            .summarize(&stories)
            .await;

        if let Some(driver) = driver {
            driver
                .send(&self.http, &draft)
                .await
                .with_context(|| format!("Error sending notification via {}", driver.kind()))?;
        }

        Ok(draft)
    }
}

/// Builds a [`Pipeline`] from `config` and runs it over the configured sources.
pub async fn run(config: &Config, driver: Option<&Driver>) -> RunResult {
    match Pipeline::from_config(config) {
        Ok(pipeline) => pipeline.run(&config.sources, driver).await,
        Err(e) => RunResult::failed(&e.into()),
    }
}
