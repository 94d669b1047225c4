//! A sender for Discord webhooks.

use super::{webhook, DeliveryError};
use crate::core::{Channel, ChannelSender, NotificationRecord};
use crate::formatting::discord_payload;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};

/// Posts a single red embed with the backtrace and context as fields.
pub struct DiscordSender {
    client: Client,
    webhook_url: String,
    username: String,
}

impl DiscordSender {
    pub fn new(client: Client, webhook_url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
            username: username.into(),
        }
    }
}

#[async_trait]
impl ChannelSender for DiscordSender {
    fn channel(&self) -> Channel {
        Channel::Discord
    }

    #[instrument(skip_all, fields(channel = "discord"))]
    async fn send(&self, record: &NotificationRecord) -> Result<(), DeliveryError> {
        let payload = discord_payload(record, &self.username)?;
        webhook::post_json(&self.client, Channel::Discord, &self.webhook_url, &payload).await?;
        info!("Sent error notification to Discord.");
        Ok(())
    }
}
