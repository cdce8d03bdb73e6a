use reqwest::{Client, Request};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackDriver {
    webhook_url: String,
}

impl SlackDriver {
    pub fn new(webhook_url: String) -> Result<Self> {
        if webhook_url.trim().is_empty() {
            return Err(Error::MissingField {
                driver: "slack",
                field: "webhook URL",
            });
        }
        Ok(Self { webhook_url })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub(crate) fn build_request(&self, client: &Client, content: &str) -> Result<Request> {
        let body = serde_json::json!({ "text": content });
        Ok(client.post(&self.webhook_url).json(&body).build()?)
    }
}
