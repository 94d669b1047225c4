//! A sender for the Twilio Messages API (SMS or WhatsApp).

use super::{webhook, DeliveryError};
use crate::config::TwilioConfig;
use crate::core::{Channel, ChannelSender, NotificationRecord};
use crate::formatting::twilio_message;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument, warn};

/// Creates one message per notification through the account's
/// `Messages.json` endpoint, authenticating with the account SID and token.
pub struct TwilioSender {
    client: Client,
    endpoint: String,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
    address_scheme: Option<String>,
}

impl TwilioSender {
    /// Builds a sender from the config, or `None` when a credential is missing.
    pub fn from_config(client: Client, config: &TwilioConfig) -> Option<Self> {
        let credentials = config.credentials()?;
        Some(Self {
            client,
            endpoint: config.messages_url(credentials.account_sid),
            account_sid: credentials.account_sid.to_string(),
            auth_token: credentials.auth_token.to_string(),
            from: credentials.from.to_string(),
            to: credentials.to.to_string(),
            address_scheme: config.address_scheme.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChannelSender for TwilioSender {
    fn channel(&self) -> Channel {
        Channel::Twilio
    }

    #[instrument(skip_all, fields(channel = "twilio"))]
    async fn send(&self, record: &NotificationRecord) -> Result<(), DeliveryError> {
        let message = twilio_message(
            record,
            self.address_scheme.as_deref(),
            &self.from,
            &self.to,
        )?;

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&message)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "HTTP request to Twilio failed");
                DeliveryError::from(e)
            })?;
        webhook::check_response(Channel::Twilio, response).await?;

        info!(to = %message.to, "Sent error notification through Twilio.");
        Ok(())
    }
}
