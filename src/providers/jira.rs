use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DestinationClient;
use crate::model::destination_entry::DestinationEntry;
use crate::model::worklog::Worklog;
use crate::util::duration::round_to_minutes;

/// Jira rejects other `started` layouts with a 500.
const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

pub struct JiraClient {
    base_url: String,
    username: String,
    auth_header: String,
    client: reqwest::Client,
}

impl JiraClient {
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        let creds = format!("{username}:{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
        }
    }

    fn worklogs_url(&self, issue_key: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}/worklog",
            self.base_url,
            urlencoding::encode(issue_key)
        )
    }

    async fn check(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Jira {what} failed with {status}: {body}")
    }
}

#[derive(Deserialize)]
struct WorklogPage {
    #[serde(default)]
    worklogs: Vec<JiraWorklog>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraWorklog {
    id: String,
    author: Option<Author>,
    started: String,
    time_spent_seconds: i64,
    comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Author {
    name: Option<String>,
    email_address: Option<String>,
}

impl Author {
    fn is(&self, username: &str) -> bool {
        self.name.as_deref() == Some(username) || self.email_address.as_deref() == Some(username)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorklogBody<'a> {
    started: String,
    time_spent_seconds: i64,
    comment: &'a str,
}

impl<'a> From<&'a Worklog> for WorklogBody<'a> {
    fn from(worklog: &'a Worklog) -> Self {
        Self {
            started: worklog.started_at.format(STARTED_FORMAT).to_string(),
            time_spent_seconds: worklog.seconds,
            comment: &worklog.comment,
        }
    }
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

fn parse_started(started: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(started, STARTED_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(started))
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid worklog start {started:?}"))
}

fn parse_worklogs(body: &str, issue_key: &str, username: &str) -> Result<Vec<DestinationEntry>> {
    let page: WorklogPage = serde_json::from_str(body).context("Failed to parse Jira worklogs")?;
    page.worklogs
        .into_iter()
        .filter(|w| w.author.as_ref().is_some_and(|a| a.is(username)))
        .map(|w| {
            let author = w.author.as_ref().and_then(|a| a.name.clone().or(a.email_address.clone()));
            let started = parse_started(&w.started)?;
            Ok(DestinationEntry::new(w.id, issue_key, started, w.time_spent_seconds, w.comment)
                .with_author(author))
        })
        .collect()
}

#[async_trait]
impl DestinationClient for JiraClient {
    fn name(&self) -> &str {
        "Jira"
    }

    async fn fetch(&self, task_id: &str) -> Result<Vec<DestinationEntry>> {
        let resp = self
            .client
            .get(self.worklogs_url(task_id))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Error downloading time entries for {task_id}"))?;
        let body = Self::check(resp, "worklog download").await?.text().await?;
        parse_worklogs(&body, task_id, &self.username)
    }

    async fn create(&self, worklog: &Worklog) -> Result<Option<String>> {
        let resp = self
            .client
            .post(self.worklogs_url(&worklog.task_id))
            .header("Authorization", &self.auth_header)
            .json(&WorklogBody::from(worklog))
            .send()
            .await
            .context("Jira add worklog request failed")?;
        let created: Created = Self::check(resp, "add worklog")
            .await?
            .json()
            .await
            .context("Failed to parse created worklog")?;
        Ok(Some(created.id))
    }

    async fn update(&self, destination_id: &str, worklog: &Worklog) -> Result<()> {
        let url = format!("{}/{}", self.worklogs_url(&worklog.task_id), destination_id);
        let resp = self
            .client
            .put(url)
            .header("Authorization", &self.auth_header)
            .json(&WorklogBody::from(worklog))
            .send()
            .await
            .context("Jira update worklog request failed")?;
        Self::check(resp, "update worklog").await?;
        Ok(())
    }

    async fn delete(&self, task_id: &str, destination_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.worklogs_url(task_id), destination_id);
        let resp = self
            .client
            .delete(url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .context("Jira delete worklog request failed")?;
        Self::check(resp, "delete worklog").await?;
        Ok(())
    }

    fn min_seconds(&self) -> Option<i64> {
        Some(60)
    }

    /// Jira truncates stored time to whole minutes, which drifts over many entries,
    /// so time is rounded before it is sent.
    fn normalize_seconds(&self, seconds: i64) -> i64 {
        round_to_minutes(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = r#"{
        "startAt": 0,
        "worklogs": [
            {"id": "1234", "author": {"name": "john"}, "started": "2016-03-01T10:38:00.000+0000",
             "timeSpentSeconds": 120, "comment": "no comment [src#987654321]", "issueId": "234123"},
            {"id": "1235", "author": {"name": "jane"}, "started": "2016-03-01T10:38:00.000+0000",
             "timeSpentSeconds": 60, "comment": "not mine"},
            {"id": "1236", "author": {"emailAddress": "john"}, "started": "2016-03-01T12:38:00.000+0200",
             "timeSpentSeconds": 60}
        ]
    }"#;

    #[test]
    fn parses_own_worklogs() {
        let entries = parse_worklogs(PAGE, "PROJ-1234", "john").unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "1234");
        assert_eq!(entries[0].issue, "PROJ-1234");
        assert_eq!(entries[0].seconds, 120);
        assert_eq!(entries[0].author.as_deref(), Some("john"));
        assert_eq!(entries[0].correlation_id(), Some(987654321));
        assert_eq!(entries[1].started_at, Utc.with_ymd_and_hms(2016, 3, 1, 10, 38, 0).unwrap());
        assert_eq!(entries[1].correlation_id(), None);
    }

    #[test]
    fn body_uses_jira_started_format() {
        let worklog = Worklog {
            task_id: "SLUG-1".into(),
            started_at: Utc.with_ymd_and_hms(2016, 1, 1, 1, 1, 1).unwrap(),
            seconds: 3600,
            comment: "x [src#1]".into(),
        };
        let json = serde_json::to_value(WorklogBody::from(&worklog)).unwrap();
        assert_eq!(json["started"], "2016-01-01T01:01:01.000+0000");
        assert_eq!(json["timeSpentSeconds"], 3600);
        assert_eq!(json["comment"], "x [src#1]");
    }

    #[test]
    fn rounds_and_floors_to_minutes() {
        let jira = JiraClient::new("https://jira.example/", "john", "secret");
        assert_eq!(jira.normalize_seconds(90), 120);
        assert_eq!(jira.normalize_seconds(30), 0);
        assert_eq!(jira.min_seconds(), Some(60));
        assert_eq!(jira.worklogs_url("SLUG 1"), "https://jira.example/rest/api/2/issue/SLUG%201/worklog");
    }
}
