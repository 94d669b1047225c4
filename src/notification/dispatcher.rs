//! The dispatcher fans one error out to every active channel.
//!
//! Each attempt runs under its own timeout and panic guard, so no channel can
//! fail, stall or abort another. `notify` waits for every attempt before it
//! returns and never reports failure to the caller; failures only show up in
//! the logs.

use super::{DeliveryError, DiscordSender, EmailSender, SlackSender, SmtpMailer, TwilioSender};
use crate::config::Config;
use crate::core::{Channel, ChannelSender, Context, Mailer, NotificationRecord};
use anyhow::Result;
use futures::future::join_all;
use futures::FutureExt;
use reqwest::Client;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// The result of one channel attempt.
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub channel: Channel,
    pub result: Result<(), DeliveryError>,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Sends error notifications to the configured channels.
pub struct Dispatcher {
    config: Arc<Config>,
    senders: Vec<Arc<dyn ChannelSender>>,
    timeout: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher with the default senders for `config`.
    pub fn new(config: Config) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Creates a new `DispatcherBuilder`.
    pub fn builder(config: Config) -> DispatcherBuilder {
        DispatcherBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The channels that have a registered sender.
    pub fn channels(&self) -> Vec<Channel> {
        self.senders.iter().map(|s| s.channel()).collect()
    }

    /// Reports `error` to every active channel.
    pub async fn notify(&self, error: &anyhow::Error, context: Context) {
        if !self.config.enabled {
            debug!("Notifications are disabled, skipping.");
            return;
        }
        self.notify_record(NotificationRecord::from_error(error, context))
            .await;
    }

    /// Reports an already built record to every active channel.
    pub async fn notify_record(&self, record: NotificationRecord) {
        let outcomes = self.dispatch(&record).await;
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        if !outcomes.is_empty() {
            info!(
                attempted = outcomes.len(),
                failed, "Error notification dispatched"
            );
        }
    }

    /// Delivers `record` to every active channel concurrently and returns one
    /// outcome per attempted channel.
    #[instrument(skip_all, fields(error = %record.error_message))]
    pub async fn dispatch(&self, record: &NotificationRecord) -> Vec<DeliveryOutcome> {
        if !self.config.enabled {
            debug!("Notifications are disabled, skipping.");
            return Vec::new();
        }

        let attempts = self
            .senders
            .iter()
            .filter(|sender| {
                let active = self.config.channel_active(sender.channel());
                if !active {
                    debug!(channel = %sender.channel(), "Channel not configured, skipping");
                }
                active
            })
            .map(|sender| self.attempt(sender.as_ref(), record));

        join_all(attempts).await
    }

    async fn attempt(&self, sender: &dyn ChannelSender, record: &NotificationRecord) -> DeliveryOutcome {
        let channel = sender.channel();
        let guarded = AssertUnwindSafe(sender.send(record)).catch_unwind();

        let result = match tokio::time::timeout(self.timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(DeliveryError::Panicked(panic_message(panic.as_ref()))),
            Err(_) => Err(DeliveryError::Timeout(self.timeout)),
        };

        if let Err(e) = &result {
            error!(%channel, error = %e, "Failed to deliver error notification");
        }
        DeliveryOutcome { channel, result }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Builder for [`Dispatcher`].
///
/// Without overrides it wires one sender per channel whose credentials are
/// present, sharing a single HTTP client and using [`SmtpMailer`] for email.
pub struct DispatcherBuilder {
    config: Config,
    http_client: Option<Client>,
    mailer: Option<Arc<dyn Mailer>>,
    senders_override: Option<Vec<Arc<dyn ChannelSender>>>,
}

impl DispatcherBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http_client: None,
            mailer: None,
            senders_override: None,
        }
    }

    /// Uses `client` for the webhook and Twilio channels.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Uses `mailer` instead of the SMTP mailer.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Replaces the senders entirely. Activation is still decided by the config.
    pub fn with_senders(mut self, senders: Vec<Arc<dyn ChannelSender>>) -> Self {
        self.senders_override = Some(senders);
        self
    }

    pub fn build(self) -> Result<Dispatcher> {
        let timeout = self.config.timeout();
        let senders = match self.senders_override {
            Some(senders) => senders,
            None => {
                let client = match self.http_client {
                    Some(client) => client,
                    None => Client::builder()
                        .timeout(timeout)
                        .user_agent(concat!("errnotify/", env!("CARGO_PKG_VERSION")))
                        .build()?,
                };
                default_senders(&self.config, client, self.mailer, timeout)?
            }
        };

        Ok(Dispatcher {
            config: Arc::new(self.config),
            senders,
            timeout,
        })
    }
}

fn default_senders(
    config: &Config,
    client: Client,
    mailer: Option<Arc<dyn Mailer>>,
    timeout: Duration,
) -> Result<Vec<Arc<dyn ChannelSender>>> {
    let mut senders: Vec<Arc<dyn ChannelSender>> = Vec::new();

    if let Some(url) = config.slack.webhook() {
        senders.push(Arc::new(SlackSender::new(client.clone(), url)));
    }
    if let Some(url) = config.discord.webhook() {
        senders.push(Arc::new(DiscordSender::new(
            client.clone(),
            url,
            config.discord.username.clone(),
        )));
    }
    if let Some((from, to)) = config.email.addresses() {
        let mailer = match mailer {
            Some(mailer) => mailer,
            None => Arc::new(SmtpMailer::new(&config.email.smtp, timeout)?),
        };
        senders.push(Arc::new(EmailSender::new(mailer, from, to)));
    }
    if let Some(sender) = TwilioSender::from_config(client, &config.twilio) {
        senders.push(Arc::new(sender));
    }

    Ok(senders)
}
