use serde::{Deserialize, Serialize};

/// A configured origin: a page URL or a social profile URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SourceDescriptor {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// One trending item pulled from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub headline: String,
    pub link: String,
    pub date_posted: String,
}

impl Story {
    pub fn new(
        headline: impl Into<String>,
        link: impl Into<String>,
        date_posted: impl Into<String>,
    ) -> Self {
        Self {
            headline: headline.into(),
            link: link.into(),
            date_posted: date_posted.into(),
        }
    }
}

/// Outcome of a single pipeline pass.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    pub fn completed(draft: String) -> Self {
        Self {
            success: true,
            message: format!(
                "Completed TrendCompass process at {}",
                chrono::Utc::now().to_rfc3339()
            ),
            draft: Some(draft),
            error: None,
        }
    }

    pub fn failed(error: &anyhow::Error) -> Self {
        Self {
            success: false,
            message: format!("Error running TrendCompass: {:#}", error),
            draft: None,
            error: Some(error.to_string()),
        }
    }
}
