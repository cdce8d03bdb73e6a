use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Request};
use serde::Serialize;

use super::iso_timestamp;
use crate::error::{Error, Result};

pub const DEFAULT_GITHUB_EVENT_TYPE: &str = "trend-compass-update";

/// Fires a `repository_dispatch` event carrying the draft.
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubDriver {
    owner: String,
    repo: String,
    token: String,
    event_type: String,
}

#[derive(Serialize)]
struct DispatchPayload<'a> {
    event_type: &'a str,
    client_payload: ClientPayload<'a>,
}

#[derive(Serialize)]
struct ClientPayload<'a> {
    content: &'a str,
    timestamp: String,
}

impl GitHubDriver {
    pub fn new(
        owner: String,
        repo: String,
        token: String,
        event_type: Option<String>,
    ) -> Result<Self> {
        for (value, field) in [(&owner, "owner"), (&repo, "repository name"), (&token, "token")] {
            if value.trim().is_empty() {
                return Err(Error::MissingField {
                    driver: "github",
                    field,
                });
            }
        }

        let event_type = event_type
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GITHUB_EVENT_TYPE.to_string());

        Ok(Self {
            owner,
            repo,
            token,
            event_type,
        })
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn dispatch_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/dispatches",
            self.owner, self.repo
        )
    }

    pub(crate) fn build_request(&self, client: &Client, content: &str) -> Result<Request> {
        let payload = DispatchPayload {
            event_type: &self.event_type,
            client_payload: ClientPayload {
                content,
                timestamp: iso_timestamp(),
            },
        };

        Ok(client
            .post(self.dispatch_url())
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(USER_AGENT, "trend-compass")
            .json(&payload)
            .build()?)
    }
}

impl std::fmt::Debug for GitHubDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubDriver")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .field("event_type", &self.event_type)
            .finish()
    }
}
