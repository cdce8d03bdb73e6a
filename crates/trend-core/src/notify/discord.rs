use reqwest::{Client, Request};
use serde::Serialize;

use crate::error::{Error, Result};

/// Discord message flag that suppresses link-preview embeds.
const SUPPRESS_EMBEDS: u32 = 1 << 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordDriver {
    webhook_url: String,
}

#[derive(Serialize)]
struct DiscordWebhookPayload<'a> {
    content: &'a str,
    flags: u32,
}

impl DiscordDriver {
    pub fn new(webhook_url: String) -> Result<Self> {
        if webhook_url.trim().is_empty() {
            return Err(Error::MissingField {
                driver: "discord",
                field: "webhook URL",
            });
        }
        Ok(Self { webhook_url })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub(crate) fn build_request(&self, client: &Client, content: &str) -> Result<Request> {
        let payload = DiscordWebhookPayload {
            content,
            flags: SUPPRESS_EMBEDS,
        };
        Ok(client.post(&self.webhook_url).json(&payload).build()?)
    }
}
