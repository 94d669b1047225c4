//! Delivery of error notifications to the configured channels.
//!
//! Each channel has its own sender implementing [`ChannelSender`]. The
//! [`Dispatcher`] decides which senders are active and runs them side by
//! side, keeping one channel's failure away from the others.

pub mod discord;
pub mod dispatcher;
pub mod email;
pub mod slack;
pub mod twilio;
mod webhook;

pub use crate::core::ChannelSender;
pub use discord::DiscordSender;
pub use dispatcher::{DeliveryOutcome, Dispatcher, DispatcherBuilder};
pub use email::{EmailSender, SmtpMailer};
pub use slack::SlackSender;
pub use twilio::TwilioSender;

use std::time::Duration;
use thiserror::Error;

/// Why a single channel delivery failed.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("mailer failed: {0}")]
    Mailer(#[source] anyhow::Error),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("sender panicked: {0}")]
    Panicked(String),
}

impl DeliveryError {
    /// True when the failure came from the per-call time bound, either ours
    /// or the HTTP client's.
    pub fn is_timeout(&self) -> bool {
        match self {
            DeliveryError::Timeout(_) => true,
            DeliveryError::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}
