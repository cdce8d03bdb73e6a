use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Request};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::iso_timestamp;
use crate::error::{Error, Result};

/// Turns the draft into the JSON body to post, replacing the default `{content, timestamp}`.
pub type PayloadBuilder = Arc<dyn Fn(&str) -> serde_json::Value + Send + Sync>;

#[derive(Clone)]
pub struct WebhookDriver {
    url: String,
    headers: HeaderMap,
    payload_builder: Option<PayloadBuilder>,
}

impl WebhookDriver {
    /// Custom header names and values are validated here so a bad header fails at
    /// construction, not at send time.
    pub fn new(url: String, custom_headers: &BTreeMap<String, String>) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(Error::MissingField {
                driver: "webhook",
                field: "URL",
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in custom_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Config(format!("invalid webhook header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Config(format!("invalid value for webhook header '{name}': {e}")))?;
            // insert, not append: custom headers replace the defaults.
            headers.insert(name, value);
        }

        Ok(Self {
            url,
            headers,
            payload_builder: None,
        })
    }

    pub fn with_payload_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&str) -> serde_json::Value + Send + Sync + 'static,
    {
        self.payload_builder = Some(Arc::new(builder));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn payload(&self, content: &str) -> serde_json::Value {
        match &self.payload_builder {
            Some(build) => build(content),
            None => serde_json::json!({
                "content": content,
                "timestamp": iso_timestamp(),
            }),
        }
    }

    pub(crate) fn build_request(&self, client: &Client, content: &str) -> Result<Request> {
        let body = serde_json::to_vec(&self.payload(content))?;
        Ok(client
            .post(&self.url)
            .headers(self.headers.clone())
            .body(body)
            .build()?)
    }
}

impl fmt::Debug for WebhookDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookDriver")
            .field("url", &self.url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("custom_payload", &self.payload_builder.is_some())
            .finish()
    }
}
