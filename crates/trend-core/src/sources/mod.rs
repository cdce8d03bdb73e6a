//! Source scrapers. Each configured identifier is classified once and routed to the
//! matching variant; every variant returns an empty list instead of an error.

pub mod firecrawl;
pub mod social;
pub mod trending;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;

use crate::fallback::attempt_or;
use crate::models::{SourceDescriptor, Story};

pub use firecrawl::{FirecrawlClient, PageExtractor};
pub use social::{PostSearch, XClient};

static SOCIAL_HANDLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[/.])(?:x|twitter)\.com/@?([^/?#]+)").expect("valid social handle regex")
});

const TRENDING_MARKER: &str = "github.com/trending";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Trending,
    Social { handle: String },
    Generic,
}

/// First match wins: trending page, then social profile, then any other page.
pub fn classify(identifier: &str) -> SourceKind {
    if identifier.contains(TRENDING_MARKER) {
        return SourceKind::Trending;
    }

    if let Some(caps) = SOCIAL_HANDLE.captures(identifier) {
        return SourceKind::Social {
            handle: caps[1].to_string(),
        };
    }

    SourceKind::Generic
}

/// Anything that can turn a source into stories. Implementations must not fail;
/// a broken source yields an empty list.
#[async_trait]
pub trait Scrape: Send + Sync {
    async fn scrape(&self, source: &SourceDescriptor) -> Vec<Story>;
}

/// The production scraper. Remote clients are optional: a variant whose client is
/// missing skips its sources.
pub struct SourceScraper {
    http: Client,
    extractor: Option<Arc<dyn PageExtractor>>,
    social: Option<Arc<dyn PostSearch>>,
}

impl SourceScraper {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            extractor: None,
            social: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_social(mut self, social: Arc<dyn PostSearch>) -> Self {
        self.social = Some(social);
        self
    }
}

#[async_trait]
impl Scrape for SourceScraper {
    async fn scrape(&self, source: &SourceDescriptor) -> Vec<Story> {
        let id = source.identifier.as_str();

        match classify(id) {
            SourceKind::Trending => {
                attempt_or(id, Vec::new(), trending::scrape_trending(&self.http, id)).await
            }
            SourceKind::Social { handle } => match &self.social {
                Some(search) => {
                    attempt_or(id, Vec::new(), social::scrape_social(search.as_ref(), &handle))
                        .await
                }
                None => {
                    tracing::warn!(source = %id, "X API bearer token is not configured, skipping");
                    Vec::new()
                }
            },
            SourceKind::Generic => match &self.extractor {
                Some(extractor) => {
                    attempt_or(id, Vec::new(), firecrawl::scrape_page(extractor.as_ref(), id))
                        .await
                }
                None => {
                    tracing::debug!(source = %id, "Firecrawl API key is not configured, skipping");
                    Vec::new()
                }
            },
        }
    }
}

pub(crate) fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
