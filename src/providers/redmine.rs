use std::future::Future;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{DestinationClient, StartPrecision};
use crate::model::destination_entry::DestinationEntry;
use crate::model::worklog::Worklog;
use crate::util::duration::{hours_to_seconds, seconds_to_hours};

/// Largest page Redmine serves for `time_entries.json`.
const PAGE_SIZE: usize = 100;

pub struct RedmineClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RedmineClient {
    pub fn new(url: &str, api_key: &str) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn check(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Redmine {what} failed with {status}: {body}")
    }

    async fn fetch_page(&self, issue_id: &str, offset: usize) -> Result<Page> {
        let resp = self
            .client
            .get(format!("{}/time_entries.json", self.base_url))
            .header("X-Redmine-API-Key", &self.api_key)
            .query(&[("issue_id", issue_id)])
            .query(&[("offset", offset), ("limit", PAGE_SIZE)])
            .send()
            .await
            .with_context(|| format!("Error downloading time entries for {issue_id}"))?;
        let body = Self::check(resp, "time entry download").await?.text().await?;
        parse_page(&body, issue_id)
    }
}

#[derive(Deserialize)]
struct TimeEntriesResponse {
    time_entries: Vec<TimeEntry>,
    total_count: Option<usize>,
}

struct Page {
    entries: Vec<DestinationEntry>,
    total_count: Option<usize>,
}

#[derive(Deserialize)]
struct TimeEntry {
    id: u64,
    issue: Option<IdRef>,
    user: Option<NamedRef>,
    hours: f64,
    spent_on: NaiveDate,
    comments: Option<String>,
}

#[derive(Deserialize)]
struct IdRef {
    id: u64,
}

#[derive(Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Serialize)]
struct TimeEntryBody<'a> {
    time_entry: TimeEntryFields<'a>,
}

#[derive(Serialize)]
struct TimeEntryFields<'a> {
    issue_id: &'a str,
    spent_on: String,
    hours: f64,
    comments: &'a str,
}

impl<'a> From<&'a Worklog> for TimeEntryBody<'a> {
    fn from(worklog: &'a Worklog) -> Self {
        Self {
            time_entry: TimeEntryFields {
                issue_id: &worklog.task_id,
                spent_on: worklog.started_at.format("%Y-%m-%d").to_string(),
                hours: seconds_to_hours(worklog.seconds),
                comments: &worklog.comment,
            },
        }
    }
}

#[derive(Deserialize)]
struct Created {
    time_entry: CreatedEntry,
}

#[derive(Deserialize)]
struct CreatedEntry {
    id: u64,
}

fn parse_page(body: &str, issue_id: &str) -> Result<Page> {
    let resp: TimeEntriesResponse =
        serde_json::from_str(body).context("Failed to parse Redmine time entries")?;
    let entries = resp
        .time_entries
        .into_iter()
        .map(|t| {
            let issue = t.issue.map(|i| i.id.to_string()).unwrap_or_else(|| issue_id.to_string());
            let started = t.spent_on.and_time(NaiveTime::MIN).and_utc();
            DestinationEntry::new(t.id.to_string(), issue, started, hours_to_seconds(t.hours), t.comments)
                .with_author(t.user.map(|u| u.name))
        })
        .collect();
    Ok(Page {
        entries,
        total_count: resp.total_count,
    })
}

/// Requests pages by offset until `total_count` entries were read. Without a
/// `total_count` the first page is all there is.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<DestinationEntry>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Page>>,
{
    let mut entries: Vec<DestinationEntry> = Vec::new();
    loop {
        let page = fetch_page(entries.len()).await?;
        let received = page.entries.len();
        entries.extend(page.entries);
        if received == 0 || page.total_count.map_or(true, |total| entries.len() >= total) {
            return Ok(entries);
        }
    }
}

#[async_trait]
impl DestinationClient for RedmineClient {
    fn name(&self) -> &str {
        "Redmine"
    }

    async fn fetch(&self, task_id: &str) -> Result<Vec<DestinationEntry>> {
        let entries = collect_pages(move |offset| self.fetch_page(task_id, offset)).await?;
        tracing::debug!(task_id, count = entries.len(), "Downloaded Redmine time entries");
        Ok(entries)
    }

    async fn create(&self, worklog: &Worklog) -> Result<Option<String>> {
        let resp = self
            .client
            .post(format!("{}/time_entries.json", self.base_url))
            .header("X-Redmine-API-Key", &self.api_key)
            .json(&TimeEntryBody::from(worklog))
            .send()
            .await
            .context("Redmine create time entry request failed")?;
        let created: Created = Self::check(resp, "create time entry")
            .await?
            .json()
            .await
            .context("Failed to parse created time entry")?;
        Ok(Some(created.time_entry.id.to_string()))
    }

    async fn update(&self, destination_id: &str, worklog: &Worklog) -> Result<()> {
        let resp = self
            .client
            .put(format!("{}/time_entries/{destination_id}.json", self.base_url))
            .header("X-Redmine-API-Key", &self.api_key)
            .json(&TimeEntryBody::from(worklog))
            .send()
            .await
            .context("Redmine update time entry request failed")?;
        Self::check(resp, "update time entry").await?;
        Ok(())
    }

    async fn delete(&self, _task_id: &str, destination_id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(format!("{}/time_entries/{destination_id}.json", self.base_url))
            .header("X-Redmine-API-Key", &self.api_key)
            .send()
            .await
            .context("Redmine delete time entry request failed")?;
        Self::check(resp, "delete time entry").await?;
        Ok(())
    }

    fn start_precision(&self) -> StartPrecision {
        StartPrecision::Day
    }
}
