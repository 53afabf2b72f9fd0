// src/notify/slack.rs

//! Slack incoming-webhook notifier.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use crate::errors::{Error, Result, RolloutError};

use super::{DeployEvent, Notifier, NotifyFuture};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    channel: Option<String>,
}

impl SlackNotifier {
    pub fn new(webhook_url: String, channel: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            client,
            webhook_url,
            channel,
        })
    }

    async fn post(&self, text: &str) -> Result<()> {
        let payload = WebhookPayload {
            text,
            channel: self.channel.as_deref(),
        };
        debug!(channel = ?payload.channel, "posting slack notification");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(Error::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("slack webhook failed: {} - {}", status, body);
            return Err(RolloutError::Other(anyhow::anyhow!(
                "slack webhook returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

impl Notifier for SlackNotifier {
    fn notify<'a>(&'a self, event: &'a DeployEvent) -> NotifyFuture<'a> {
        Box::pin(async move { self.post(&event.message()).await })
    }
}
