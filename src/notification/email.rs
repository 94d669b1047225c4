//! Email notification channel.
//!
//! The channel itself only addresses the mail; rendering and transport belong
//! to a [`Mailer`]. [`SmtpMailer`] is the bundled implementation, sending a
//! plain-text message through an SMTP relay with `lettre`.

use super::DeliveryError;
use crate::config::SmtpConfig;
use crate::core::{Channel, ChannelSender, ErrorMail, Mailer, NotificationRecord};
use crate::formatting::error_mail;
use anyhow::{anyhow, Context as _, Result};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Hands error notifications to a [`Mailer`].
pub struct EmailSender {
    mailer: Arc<dyn Mailer>,
    from: String,
    to: String,
}

impl EmailSender {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
            to: to.into(),
        }
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    #[instrument(skip_all, fields(channel = "email"))]
    async fn send(&self, record: &NotificationRecord) -> Result<(), DeliveryError> {
        let mail = error_mail(record, &self.from, &self.to);
        self.mailer.error_notification(&mail).await.map_err(|e| {
            warn!(error = %e, subject = %mail.subject, "Mailer failed to send error notification");
            DeliveryError::Mailer(e)
        })?;
        info!(to = %self.to, "Sent error notification email.");
        Ok(())
    }
}

/// A [`Mailer`] that delivers plain-text mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Builds the SMTP transport. No connection is made until the first send.
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .with_context(|| format!("invalid SMTP relay '{}'", config.host))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port).timeout(Some(timeout));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        debug!(host = %config.host, port = config.port, "SMTP mailer configured");
        Ok(Self {
            transport: builder.build(),
        })
    }
}

/// Parses a comma-separated list of addresses.
fn parse_mailboxes(addresses: &str) -> Result<Vec<Mailbox>> {
    let mailboxes = addresses
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Mailbox>()
                .map_err(|e| anyhow!("Invalid email address '{}': {}", s, e))
        })
        .collect::<Result<Vec<_>>>()?;
    if mailboxes.is_empty() {
        anyhow::bail!("no recipient address given");
    }
    Ok(mailboxes)
}

/// Plain-text rendering of an error notification.
fn render_text(mail: &ErrorMail) -> String {
    let context = serde_json::to_string_pretty(&mail.context).unwrap_or_else(|_| "{}".to_string());
    format!(
        "🚨 ERROR NOTIFICATION\n\nError:\n{}\n\nBacktrace:\n--------\n{}\n\nContext:\n--------\n{}\n\n-- errnotify\n",
        mail.error,
        mail.backtrace.join("\n"),
        context
    )
}

fn build_message(mail: &ErrorMail) -> Result<Message> {
    let from: Mailbox = mail
        .from
        .parse()
        .map_err(|e| anyhow!("Invalid sender address '{}': {}", mail.from, e))?;

    let mut builder = Message::builder().from(from).subject(mail.subject.clone());
    for to in parse_mailboxes(&mail.to)? {
        builder = builder.to(to);
    }

    Ok(builder
        .header(ContentType::TEXT_PLAIN)
        .body(render_text(mail))?)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn error_notification(&self, mail: &ErrorMail) -> Result<()> {
        let message = build_message(mail)?;
        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;
        Ok(())
    }
}
