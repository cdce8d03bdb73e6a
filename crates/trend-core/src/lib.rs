//! Trend aggregation: scrape configured sources, summarize what was found into a
//! draft post, and deliver the draft to a notification channel.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod fallback;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod sources;
pub mod summarizer;

// Re-export commonly used types
pub use aggregator::aggregate_all;
pub use config::Config;
pub use error::{Error, Result};
pub use models::{RunResult, SourceDescriptor, Story};
pub use notify::{create_driver, Driver, DriverKind, NotificationConfig};
pub use pipeline::{run, Pipeline};
pub use scheduler::{parse_schedule, schedule, ScheduleHandle};
pub use sources::{classify, Scrape, SourceKind, SourceScraper};
pub use summarizer::{DraftSummarizer, OpenAiClient, TextGenerator};
