use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::config::{self, EntryConfig};
use crate::credentials::Credentials;
use crate::model::lookback::LookbackWindow;
use crate::notify::mattermost::MattermostWebhook;
use crate::notify::Notifier;
use crate::providers::{self, toggl::TogglClient};
use crate::sync::job::SyncJob;
use crate::util::task_id::TaskPatterns;

/// Syncs Toggl time entries to Jira or Redmine worklogs.
#[derive(Debug, Parser)]
#[command(name = "tracksync", version)]
pub struct Cli {
    /// No entries will be saved, only simulation
    #[arg(short, long)]
    pub simulation: bool,

    /// Days to sync, counted back from today's midnight
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub days: i64,

    /// Break execution on the first failing task
    #[arg(long = "errors")]
    pub strict: bool,

    /// Config file (defaults to ~/.tracksync/config.toml)
    #[arg(short, long, env = "TRACKSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only run the config entry with this label
    #[arg(short, long)]
    pub entry: Option<String>,
}

fn select_entries<'a>(entries: &'a [EntryConfig], label: Option<&str>) -> Result<Vec<&'a EntryConfig>> {
    let Some(label) = label else {
        return Ok(entries.iter().collect());
    };
    let selected: Vec<_> = entries.iter().filter(|e| e.label == label).collect();
    if selected.is_empty() {
        bail!("No config entry labelled {label:?}");
    }
    Ok(selected)
}

/// Runs every selected config entry in order, then sends the chat summary.
pub async fn handle_sync(cli: &Cli) -> Result<()> {
    let window = LookbackWindow::new(cli.days)?;
    let config = config::load_config(cli.config.as_deref())?;
    let entries = select_entries(&config.entries, cli.entry.as_deref())?;

    let mut credentials = Credentials::from_env();
    let mut notifier = config.mattermost().map(|cfg| {
        Notifier::new(Box::new(MattermostWebhook::from_config(&cfg)), cli.simulation)
    });

    for entry in entries {
        tracing::info!(label = %entry.label, "Synchronization for entry");

        let patterns = TaskPatterns::new(&entry.task_patterns)?;
        if patterns.is_empty() {
            tracing::warn!(label = %entry.label, "No task_patterns configured, no entry will match");
        }

        let Some(destination) =
            providers::create_destination(&config, entry, &mut credentials, cli.simulation)?
        else {
            tracing::warn!(label = %entry.label, "Can't interpret config to destination API");
            continue;
        };
        let source = TogglClient::new(&config.toggl.url, &entry.toggl_api_key, patterns);

        let job = SyncJob {
            label: &entry.label,
            source: &source,
            destination: destination.as_ref(),
            strict: cli.strict,
        };
        job.run(window, notifier.as_mut()).await?;
    }

    if let Some(mut notifier) = notifier {
        if let Err(err) = notifier.send().await {
            tracing::error!(error = %format!("{err:#}"), "Failed to deliver notification");
        }
    }

    Ok(())
}
