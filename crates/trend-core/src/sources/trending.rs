use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use super::today;
use crate::error::Error;
use crate::models::Story;

pub const PLACEHOLDER_HEADLINE: &str = "GitHub trending repositories";

static ROW: Lazy<Selector> = Lazy::new(|| selector("article.Box-row"));
static REPO_LINK: Lazy<Selector> = Lazy::new(|| selector("h2 a"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector("p"));
static LANGUAGE: Lazy<Selector> = Lazy::new(|| selector("[itemprop=\"programmingLanguage\"]"));
static STARS: Lazy<Selector> = Lazy::new(|| selector("a[href$=\"/stargazers\"]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid trending selector")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingRepo {
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: Option<String>,
}

impl TrendingRepo {
    pub fn headline(&self) -> String {
        let mut headline = self.full_name.clone();
        if let Some(description) = &self.description {
            headline.push_str(": ");
            headline.push_str(description);
        }
        if let Some(language) = &self.language {
            headline.push_str(&format!(" [{}]", language));
        }
        if let Some(stars) = &self.stars {
            headline.push_str(&format!(" ★ {}", stars));
        }
        headline
    }

    pub fn link(&self) -> String {
        format!("https://github.com/{}", self.full_name)
    }
}

pub async fn scrape_trending(http: &Client, page_url: &str) -> Result<Vec<Story>> {
    let response = http
        .get(page_url)
        .send()
        .await
        .context("Failed to fetch trending page")?;

    if !response.status().is_success() {
        return Err(Error::from_response("github", response).await.into());
    }

    let html = response
        .text()
        .await
        .context("Failed to read trending page body")?;

    let stories = stories_from_page(&html, page_url);
    tracing::info!(source = %page_url, count = stories.len(), "Parsed trending page");
    Ok(stories)
}

/// Parses the page into stories, or a single placeholder pointing at the page when
/// nothing could be parsed.
pub fn stories_from_page(html: &str, page_url: &str) -> Vec<Story> {
    let date = today();
    let repos = parse_trending(html);

    if repos.is_empty() {
        tracing::warn!(source = %page_url, "No repositories parsed from trending page");
        return vec![Story::new(PLACEHOLDER_HEADLINE, page_url, date)];
    }

    repos
        .iter()
        .map(|repo| Story::new(repo.headline(), repo.link(), date.clone()))
        .collect()
}

pub fn parse_trending(html: &str) -> Vec<TrendingRepo> {
    let document = Html::parse_document(html);

    document
        .select(&ROW)
        .filter_map(|row| {
            let href = row.select(&REPO_LINK).next()?.value().attr("href")?;
            let full_name: String = href
                .trim_matches('/')
                .split('/')
                .take(2)
                .collect::<Vec<_>>()
                .join("/");
            if !full_name.contains('/') {
                return None;
            }

            Some(TrendingRepo {
                full_name,
                description: first_text(row, &DESCRIPTION),
                language: first_text(row, &LANGUAGE),
                stars: first_text(row, &STARS),
            })
        })
        .collect()
}

fn first_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let el = row.select(selector).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}
