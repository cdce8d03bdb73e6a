use crate::models::{SourceDescriptor, Story};
use crate::sources::Scrape;

/// Scrapes every source one at a time, in configured order, and concatenates the
/// results. A failing source contributes nothing; it never empties the batch.
pub async fn aggregate_all<S>(scraper: &S, sources: &[SourceDescriptor]) -> Vec<Story>
where
    S: Scrape + ?Sized,
{
    let mut all_stories = Vec::new();

    for source in sources {
        let stories = scraper.scrape(source).await;
        tracing::info!(
            source = %source.identifier,
            category = source.category.as_deref().unwrap_or("-"),
            count = stories.len(),
            "Scraped source"
        );
        all_stories.extend(stories);
    }

    tracing::info!(
        sources = sources.len(),
        stories = all_stories.len(),
        "Combined stories"
    );
    all_stories
}
