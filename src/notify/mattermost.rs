use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::NotificationChannel;
use crate::config::MattermostConfig;

pub const DEFAULT_USERNAME: &str = "tracksync";

/// Incoming webhook; the message is posted once per configured channel.
pub struct MattermostWebhook {
    url: String,
    channels: Vec<String>,
    username: Option<String>,
    client: reqwest::Client,
}

impl MattermostWebhook {
    pub fn from_config(config: &MattermostConfig) -> Self {
        let channels = config
            .channel
            .as_ref()
            .map(|c| {
                c.as_list()
                    .into_iter()
                    .filter(|ch| !ch.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            url: config.url.clone(),
            channels,
            username: Some(
                config
                    .username
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            ),
            client: reqwest::Client::new(),
        }
    }

    fn payloads<'a>(&'a self, text: &'a str) -> Vec<Payload<'a>> {
        let base = Payload {
            text,
            username: self.username.as_deref(),
            channel: None,
        };
        if self.channels.is_empty() {
            return vec![base];
        }
        self.channels
            .iter()
            .map(|ch| Payload {
                channel: Some(ch.as_str()),
                ..base
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Payload<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detailed_error: Option<String>,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|e| e.detailed_error.filter(|d| !d.is_empty()).or(e.message))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl NotificationChannel for MattermostWebhook {
    async fn deliver(&self, text: &str) -> Result<()> {
        for payload in self.payloads(text) {
            let resp = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .context("Mattermost request failed")?;
            if !resp.status().is_success() {
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("Error sending to mattermost:\n{}", error_message(&body));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Channels;

    fn webhook(channel: Option<Channels>) -> MattermostWebhook {
        MattermostWebhook::from_config(&MattermostConfig {
            url: "http://mattermost.url/".into(),
            channel,
            username: None,
        })
    }

    #[test]
    fn one_payload_without_channel() {
        let hook = webhook(None);
        let payloads = hook.payloads("hi");
        assert_eq!(payloads.len(), 1);
        let json = serde_json::to_value(payloads[0]).unwrap();
        assert_eq!(json, serde_json::json!({"text": "hi", "username": "tracksync"}));
    }

    #[test]
    fn one_payload_per_channel() {
        let hook = webhook(Some(Channels::Many(vec!["#a".into(), "".into(), "#b".into()])));
        let channels: Vec<_> = hook.payloads("hi").iter().map(|p| p.channel).collect();
        assert_eq!(channels, vec![Some("#a"), Some("#b")]);
    }

    #[test]
    fn error_message_prefers_details() {
        assert_eq!(
            error_message(r#"{"message": "bad", "detailed_error": "channel missing"}"#),
            "channel missing"
        );
        assert_eq!(error_message(r#"{"message": "bad"}"#), "bad");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }
}
