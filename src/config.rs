use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOGGL_URL: &str = "https://api.track.toggl.com/api/v9/";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid task pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid days: {0}")]
    InvalidLookback(i64),
    #[error("Entry {0:?} uses Redmine but the [redmine] section has no url")]
    MissingRedmineUrl(String),
    #[error("Expected \"url\" param in \"mattermost\" section")]
    MissingMattermostUrl,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub toggl: TogglConfig,
    pub redmine: Option<RedmineConfig>,
    mattermost: Option<MattermostSection>,
    pub entries: Vec<EntryConfig>,
}

#[derive(Debug, Deserialize)]
pub struct TogglConfig {
    #[serde(default = "default_toggl_url")]
    pub url: String,
}

impl Default for TogglConfig {
    fn default() -> Self {
        Self {
            url: default_toggl_url(),
        }
    }
}

fn default_toggl_url() -> String {
    DEFAULT_TOGGL_URL.to_string()
}

#[derive(Debug, Deserialize)]
pub struct RedmineConfig {
    pub url: Option<String>,
}

/// Older configs carried the webhook url as a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MattermostSection {
    Url(String),
    Full(MattermostConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MattermostConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub channel: Option<Channels>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Channels {
    One(String),
    Many(Vec<String>),
}

impl Channels {
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            Channels::One(ch) => vec![ch.as_str()],
            Channels::Many(chs) => chs.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryConfig {
    pub label: String,
    pub toggl_api_key: String,
    pub redmine_api_key: Option<String>,
    pub jira_url: Option<String>,
    pub jira_username: Option<String>,
    pub jira_password: Option<String>,
    #[serde(default)]
    pub task_patterns: Vec<String>,
}

impl AppConfig {
    pub fn mattermost(&self) -> Option<MattermostConfig> {
        match self.mattermost.as_ref()? {
            MattermostSection::Url(url) => Some(MattermostConfig {
                url: url.clone(),
                channel: None,
                username: None,
            }),
            MattermostSection::Full(cfg) => Some(cfg.clone()),
        }
    }

    pub fn redmine_url(&self) -> Option<&str> {
        self.redmine.as_ref()?.url.as_deref()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(MattermostSection::Full(cfg)) = &self.mattermost {
            if cfg.url.is_empty() {
                return Err(ConfigError::MissingMattermostUrl);
            }
        }
        for entry in &self.entries {
            if entry.redmine_api_key.is_some() && self.redmine_url().is_none() {
                return Err(ConfigError::MissingRedmineUrl(entry.label.clone()));
            }
        }
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tracksync")
        .join("config.toml")
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).context("Failed to parse config.toml")?;
    if matches!(config.mattermost, Some(MattermostSection::Url(_))) {
        tracing::warn!("Old config format: [mattermost] should be a table with a url key");
    }
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if !path.exists() {
        anyhow::bail!(
            "File {} does not exist. Create it or pass another path with --config",
            path.display()
        );
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents)
}
