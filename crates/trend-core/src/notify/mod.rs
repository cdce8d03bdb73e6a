//! Delivery drivers: where a finished draft goes.
//!
//! A [`NotificationConfig`] is turned into a [`Driver`] by [`create_driver`]. Construction
//! is pure and validates required fields; every outbound call happens in [`Driver::send`].

pub mod discord;
pub mod github;
pub mod slack;
pub mod webhook;

use reqwest::{Client, Request};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub use discord::DiscordDriver;
pub use github::{GitHubDriver, DEFAULT_GITHUB_EVENT_TYPE};
pub use slack::SlackDriver;
pub use webhook::{PayloadBuilder, WebhookDriver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    None,
    Slack,
    Discord,
    Webhook,
    GitHub,
}

impl DriverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::None => "none",
            DriverKind::Slack => "slack",
            DriverKind::Discord => "discord",
            DriverKind::Webhook => "webhook",
            DriverKind::GitHub => "github",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(DriverKind::None),
            "slack" => Ok(DriverKind::Slack),
            "discord" => Ok(DriverKind::Discord),
            "webhook" => Ok(DriverKind::Webhook),
            "github" => Ok(DriverKind::GitHub),
            _ => Err(Error::UnsupportedDriver(s.to_string())),
        }
    }
}

/// Notification settings, one variant per driver kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationConfig {
    None,
    Slack {
        webhook_url: String,
    },
    Discord {
        webhook_url: String,
    },
    Webhook {
        url: String,
        custom_headers: BTreeMap<String, String>,
    },
    GitHub {
        owner: String,
        repo: String,
        token: String,
        event_type: Option<String>,
    },
}

impl NotificationConfig {
    pub fn kind(&self) -> DriverKind {
        match self {
            NotificationConfig::None => DriverKind::None,
            NotificationConfig::Slack { .. } => DriverKind::Slack,
            NotificationConfig::Discord { .. } => DriverKind::Discord,
            NotificationConfig::Webhook { .. } => DriverKind::Webhook,
            NotificationConfig::GitHub { .. } => DriverKind::GitHub,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Driver {
    Slack(SlackDriver),
    Discord(DiscordDriver),
    Webhook(WebhookDriver),
    GitHub(GitHubDriver),
}

/// Builds the driver selected by `config`. `Ok(None)` means delivery is disabled.
///
/// No network activity happens here; a missing required field fails immediately.
pub fn create_driver(config: &NotificationConfig) -> Result<Option<Driver>> {
    let driver = match config {
        NotificationConfig::None => return Ok(None),
        NotificationConfig::Slack { webhook_url } => {
            Driver::Slack(SlackDriver::new(webhook_url.clone())?)
        }
        NotificationConfig::Discord { webhook_url } => {
            Driver::Discord(DiscordDriver::new(webhook_url.clone())?)
        }
        NotificationConfig::Webhook {
            url,
            custom_headers,
        } => Driver::Webhook(WebhookDriver::new(url.clone(), custom_headers)?),
        NotificationConfig::GitHub {
            owner,
            repo,
            token,
            event_type,
        } => Driver::GitHub(GitHubDriver::new(
            owner.clone(),
            repo.clone(),
            token.clone(),
            event_type.clone(),
        )?),
    };
    Ok(Some(driver))
}

impl Driver {
    pub fn kind(&self) -> DriverKind {
        match self {
            Driver::Slack(_) => DriverKind::Slack,
            Driver::Discord(_) => DriverKind::Discord,
            Driver::Webhook(_) => DriverKind::Webhook,
            Driver::GitHub(_) => DriverKind::GitHub,
        }
    }

    /// The exact request `send` would execute.
    pub fn build_request(&self, client: &Client, content: &str) -> Result<Request> {
        match self {
            Driver::Slack(d) => d.build_request(client, content),
            Driver::Discord(d) => d.build_request(client, content),
            Driver::Webhook(d) => d.build_request(client, content),
            Driver::GitHub(d) => d.build_request(client, content),
        }
    }

    /// Performs one POST. Transport errors and non-2xx statuses are returned, never retried.
    pub async fn send(&self, client: &Client, content: &str) -> Result<()> {
        let request = self.build_request(client, content)?;
        let response = client.execute(request).await.map_err(|e| {
            tracing::error!(driver = %self.kind(), error = %e, "Error sending notification");
            Error::Http(e)
        })?;

        if !response.status().is_success() {
            let err = Error::from_response(self.kind().as_str(), response).await;
            tracing::error!(driver = %self.kind(), error = %err, "Notification rejected");
            return Err(err);
        }

        tracing::info!(driver = %self.kind(), "Notification sent");
        Ok(())
    }
}

/// `new Date().toISOString()`-shaped UTC timestamp.
pub(crate) fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
