pub mod mattermost;
pub mod summary;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<()>;
}

/// Collects summary lines over a run and sends them as one message.
pub struct Notifier {
    lines: Vec<String>,
    channel: Box<dyn NotificationChannel>,
    simulation: bool,
}

impl Notifier {
    pub fn new(channel: Box<dyn NotificationChannel>, simulation: bool) -> Self {
        Self {
            lines: Vec::new(),
            channel,
            simulation,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        self.lines.extend(lines);
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Sends the buffered text. In simulation it is only logged. The buffer is
    /// cleared either way.
    pub async fn send(&mut self) -> Result<()> {
        let text = self.text();
        self.lines.clear();

        if self.simulation {
            tracing::info!(message = %text, "Message to notification channel (simulation)");
            return Ok(());
        }
        self.channel.deliver(&text).await?;
        tracing::info!(message = %text, "Sent notification");
        Ok(())
    }
}
