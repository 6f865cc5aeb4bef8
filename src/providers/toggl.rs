use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Deserialize;

use super::SourceClient;
use crate::model::lookback::LookbackWindow;
use crate::model::source_entry::SourceEntry;
use crate::util::task_id::TaskPatterns;

pub struct TogglClient {
    base_url: String,
    api_token: String,
    patterns: TaskPatterns,
    client: reqwest::Client,
}

impl TogglClient {
    pub fn new(base_url: &str, api_token: &str, patterns: TaskPatterns) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            patterns,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct TimeEntry {
    id: u64,
    duration: i64,
    start: DateTime<FixedOffset>,
    description: Option<String>,
}

impl TimeEntry {
    fn into_source(self, patterns: &TaskPatterns) -> SourceEntry {
        SourceEntry::new(
            self.id,
            self.duration,
            self.start,
            self.description.unwrap_or_default(),
            patterns,
        )
    }
}

fn parse_entries(body: &str, patterns: &TaskPatterns) -> Result<Vec<SourceEntry>> {
    let entries: Vec<TimeEntry> =
        serde_json::from_str(body).context("Failed to parse Toggl response")?;
    Ok(entries.into_iter().map(|e| e.into_source(patterns)).collect())
}

#[async_trait]
impl SourceClient for TogglClient {
    async fn fetch(&self, window: LookbackWindow) -> Result<Vec<SourceEntry>> {
        let (start, end) = window.range();
        tracing::info!(
            days = window.days(),
            start = %start,
            end = %end,
            "Downloading time entries"
        );

        let resp = self
            .client
            .get(format!("{}/me/time_entries", self.base_url))
            .basic_auth(&self.api_token, Some("api_token"))
            .query(&[
                ("start_date", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("end_date", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ])
            .send()
            .await
            .context("Toggl API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Not expected status code from Toggl: {status}");
        }

        let body = resp.text().await.context("Failed to read Toggl response")?;
        parse_entries(&body, &self.patterns)
    }
}
