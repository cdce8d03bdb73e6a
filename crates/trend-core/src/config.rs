use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::SourceDescriptor;
use crate::notify::{DriverKind, NotificationConfig, DEFAULT_GITHUB_EVENT_TYPE};

pub const DEFAULT_CONFIG_FILE: &str = "trend-compass.config.json";
pub const DEFAULT_SCHEDULE: &str = "0 9 * * *";

#[derive(Debug, Clone)]
pub struct Config {
    pub firecrawl_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub x_bearer_token: Option<String>,
    pub notification: NotificationConfig,
    pub sources: Vec<SourceDescriptor>,
    pub schedule: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firecrawl_api_key: None,
            openai_api_key: None,
            x_bearer_token: None,
            notification: NotificationConfig::None,
            sources: Vec::new(),
            schedule: DEFAULT_SCHEDULE.to_string(),
        }
    }
}

/// Shape of `trend-compass.config.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    firecrawl_api_key: Option<String>,
    #[serde(rename = "openAIApiKey")]
    openai_api_key: Option<String>,
    x_api_bearer_token: Option<String>,
    notification_config: Option<FileNotificationConfig>,
    custom_sources: Option<Vec<SourceDescriptor>>,
    sources: Option<FileSources>,
    schedule: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileNotificationConfig {
    driver: Option<String>,
    webhook_url: Option<String>,
    custom_headers: Option<BTreeMap<String, String>>,
    github_owner: Option<String>,
    github_repo: Option<String>,
    github_token: Option<String>,
    github_event_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSources {
    #[serde(default)]
    websites: Vec<SourceDescriptor>,
}

impl Config {
    /// Loads `.env`, the JSON config file and the process environment.
    /// Environment variables win over the file.
    pub fn load() -> Result<Self> {
        Self::try_load_dotenv();

        let path = env::var("TREND_COMPASS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Like [`Config::load`] but with an explicit config file path and no `.env` lookup.
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = read_file_config(path);
        resolve(file, |key| env::var(key).ok())
    }

    /// Parses a JSON document as if it were the config file, with `lookup` standing in
    /// for the environment.
    pub fn from_json<F>(json: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: FileConfig = serde_json::from_str(json)?;
        resolve(file, lookup)
    }

    /// Logs what was loaded without exposing any secret.
    pub fn log_summary(&self) {
        tracing::info!(
            driver = %self.notification.kind(),
            sources = self.sources.len(),
            firecrawl = self.firecrawl_api_key.is_some(),
            openai = self.openai_api_key.is_some(),
            x_api = self.x_bearer_token.is_some(),
            schedule = %self.schedule,
            "Loaded configuration"
        );
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/trend-compass/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("trend-compass").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

fn read_file_config(path: &Path) -> FileConfig {
    if !path.exists() {
        return FileConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::error!(path = %path.display(), error = %e, "Error parsing config file");
            FileConfig::default()
        }),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error reading config file");
            FileConfig::default()
        }
    }
}

fn resolve<F>(file: FileConfig, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // Empty environment values fall through to the file.
    let env_var = |key: &str| lookup(key).filter(|v| !v.is_empty());

    let file_notify = file.notification_config.unwrap_or_default();

    let driver = env_var("NOTIFICATION_DRIVER")
        .or_else(|| file_notify.driver.clone())
        .unwrap_or_else(|| "none".to_string());
    let kind: DriverKind = driver.parse()?;

    let webhook_url = |var: &str| {
        env_var(var)
            .or_else(|| file_notify.webhook_url.clone())
            .unwrap_or_default()
    };

    let notification = match kind {
        DriverKind::None => NotificationConfig::None,
        DriverKind::Slack => NotificationConfig::Slack {
            webhook_url: webhook_url("SLACK_WEBHOOK_URL"),
        },
        DriverKind::Discord => NotificationConfig::Discord {
            webhook_url: webhook_url("DISCORD_WEBHOOK_URL"),
        },
        DriverKind::Webhook => {
            let custom_headers = match env_var("WEBHOOK_CUSTOM_HEADERS") {
                Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                    tracing::error!(error = %e, "Error parsing WEBHOOK_CUSTOM_HEADERS");
                    BTreeMap::new()
                }),
                None => file_notify.custom_headers.clone().unwrap_or_default(),
            };
            NotificationConfig::Webhook {
                url: webhook_url("GENERIC_WEBHOOK_URL"),
                custom_headers,
            }
        }
        DriverKind::GitHub => NotificationConfig::GitHub {
            owner: env_var("GITHUB_OWNER")
                .or_else(|| file_notify.github_owner.clone())
                .unwrap_or_default(),
            repo: env_var("GITHUB_REPO")
                .or_else(|| file_notify.github_repo.clone())
                .unwrap_or_default(),
            token: env_var("GITHUB_TOKEN")
                .or_else(|| file_notify.github_token.clone())
                .unwrap_or_default(),
            event_type: Some(
                env_var("GITHUB_EVENT_TYPE")
                    .or_else(|| file_notify.github_event_type.clone())
                    .unwrap_or_else(|| DEFAULT_GITHUB_EVENT_TYPE.to_string()),
            ),
        },
    };

    let sources = file
        .custom_sources
        .or_else(|| file.sources.map(|s| s.websites))
        .unwrap_or_default();

    let schedule = env_var("TREND_COMPASS_SCHEDULE")
        .or(file.schedule)
        .unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());

    if schedule.trim().is_empty() {
        return Err(Error::Config("schedule must not be empty".to_string()));
    }

    Ok(Config {
        firecrawl_api_key: env_var("FIRECRAWL_API_KEY").or(file.firecrawl_api_key),
        openai_api_key: env_var("OPENAI_API_KEY").or(file.openai_api_key),
        x_bearer_token: env_var("X_API_BEARER_TOKEN").or(file.x_api_bearer_token),
        notification,
        sources,
        schedule,
    })
}
