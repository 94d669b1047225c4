//! Core domain types and service traits for errnotify
//!
//! This module defines the notification record that flows through the
//! dispatcher and the trait contracts every delivery channel implements.

use crate::notification::DeliveryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

/// Placeholder frame used when an error carries no backtrace at all.
pub const NO_BACKTRACE: &str = "No backtrace";

/// Caller-supplied context attached to a notification (request path, user, ...).
pub type Context = serde_json::Map<String, Value>;

/// Converts an arbitrary JSON value into a [`Context`].
///
/// Objects are used as-is, `null` becomes an empty context and any other
/// value is stored under the `"value"` key.
pub fn context_from(value: Value) -> Context {
    match value {
        Value::Object(map) => map,
        Value::Null => Context::new(),
        other => {
            let mut context = Context::new();
            context.insert("value".to_string(), other);
            context
        }
    }
}

/// The delivery channels errnotify knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Slack incoming webhook.
    Slack,
    /// Discord webhook with a rich embed.
    Discord,
    /// Transactional email through a [`Mailer`].
    Email,
    /// Twilio Messages API (SMS or WhatsApp relay).
    Twilio,
}

impl Channel {
    /// Every channel, in the order the dispatcher registers them.
    pub const ALL: [Channel; 4] = [
        Channel::Slack,
        Channel::Discord,
        Channel::Email,
        Channel::Twilio,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Slack => "slack",
            Channel::Discord => "discord",
            Channel::Email => "email",
            Channel::Twilio => "twilio",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a channel needs to describe one failure.
///
/// A record lives exactly as long as one `notify` call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationRecord {
    /// The error's display message. May be empty.
    pub error_message: String,
    /// One entry per stack frame, outermost call last.
    pub backtrace: Vec<String>,
    /// Caller-supplied context.
    pub context: Context,
    /// When the record was built.
    pub timestamp: DateTime<Utc>,
}

impl NotificationRecord {
    /// Builds a record, replacing an absent backtrace with [`NO_BACKTRACE`].
    pub fn new(
        error_message: impl Into<String>,
        backtrace: Option<Vec<String>>,
        context: Context,
    ) -> Self {
        Self {
            error_message: error_message.into(),
            backtrace: backtrace.unwrap_or_else(|| vec![NO_BACKTRACE.to_string()]),
            context,
            timestamp: Utc::now(),
        }
    }

    /// Builds a record from an `anyhow::Error`, using its backtrace when one was captured.
    pub fn from_error(error: &anyhow::Error, context: Context) -> Self {
        Self::new(error.to_string(), backtrace_frames(error.backtrace()), context)
    }

    /// Overrides the capture timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The innermost frame, or [`NO_BACKTRACE`] when the trace is empty.
    pub fn first_frame(&self) -> &str {
        self.backtrace
            .first()
            .map(String::as_str)
            .unwrap_or(NO_BACKTRACE)
    }
}

/// Returns the frames of a captured backtrace, or `None` when capture was
/// disabled or unsupported.
pub fn backtrace_frames(backtrace: &Backtrace) -> Option<Vec<String>> {
    if backtrace.status() != BacktraceStatus::Captured {
        return None;
    }
    Some(parse_frames(&backtrace.to_string()))
}

/// Splits a rendered backtrace into one line per frame, folding the
/// `at file:line` location lines into the frame they belong to.
pub fn parse_frames(rendered: &str) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    for line in rendered.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match frames.last_mut() {
            Some(frame) if line.starts_with("at ") => {
                frame.push(' ');
                frame.push_str(line);
            }
            _ => frames.push(line.to_string()),
        }
    }
    frames
}

// =============================================================================
// Service Traits
// =============================================================================

/// Delivers a notification record to one channel.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// The channel this sender delivers to. Used for activation checks and logging.
    fn channel(&self) -> Channel;

    /// Formats and sends the record.
    ///
    /// # Returns
    /// * `Ok(())` if the channel accepted the notification
    /// * `Err` on formatting, transport or provider failure
    async fn send(&self, record: &NotificationRecord) -> Result<(), DeliveryError>;
}

/// An error notification email, ready to be rendered and sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub error: String,
    pub backtrace: Vec<String>,
    pub context: Context,
}

/// Renders and sends error notification emails.
///
/// The rendering is up to the implementation; the email channel only hands
/// over the error, backtrace and context.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn error_notification(&self, mail: &ErrorMail) -> anyhow::Result<()>;
}
