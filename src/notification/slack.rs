//! A sender for Slack incoming webhooks.

use super::{webhook, DeliveryError};
use crate::core::{Channel, ChannelSender, NotificationRecord};
use crate::formatting::slack_payload;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};

/// Posts the error message and full backtrace as a plain Slack message.
pub struct SlackSender {
    client: Client,
    webhook_url: String,
}

impl SlackSender {
    /// Creates a new `SlackSender`.
    pub fn new(client: Client, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl ChannelSender for SlackSender {
    fn channel(&self) -> Channel {
        Channel::Slack
    }

    #[instrument(skip_all, fields(channel = "slack"))]
    async fn send(&self, record: &NotificationRecord) -> Result<(), DeliveryError> {
        let payload = slack_payload(record);
        webhook::post_json(&self.client, Channel::Slack, &self.webhook_url, &payload).await?;
        info!("Sent error notification to Slack.");
        Ok(())
    }
}
