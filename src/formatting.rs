// src/formatting.rs

use crate::core::{ErrorMail, NotificationRecord};
use crate::notification::DeliveryError;
use serde::Serialize;
use serde_json::{json, Value};

/// Discord's limit for an embed field value.
pub const MAX_FIELD_VALUE: usize = 1024;

/// Room left in a field value for the surrounding code fence.
const FIELD_MARKUP_MARGIN: usize = 10;

/// Number of frames shown in a Discord embed.
const DISCORD_BACKTRACE_FRAMES: usize = 10;

const EMBED_TITLE: &str = "🚨 Error Occurred";
const EMBED_COLOR: u32 = 0xFF0000;

const SUBJECT_TAG: &str = "[errnotify]";
const SUBJECT_LENGTH: usize = 50;

/// Cuts `text` to `MAX_FIELD_VALUE - 10` characters.
pub fn truncate_field(text: &str) -> String {
    text.chars()
        .take(MAX_FIELD_VALUE - FIELD_MARKUP_MARGIN)
        .collect()
}

/// Shortens `text` to at most `max` characters, ending it with `...` when cut.
pub fn truncate_with_omission(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Renders the context the way every channel shows it.
pub fn render_context(record: &NotificationRecord) -> Result<String, DeliveryError> {
    Ok(serde_json::to_string(&record.context)?)
}

/// Slack: the message followed by the full backtrace.
pub fn slack_payload(record: &NotificationRecord) -> Value {
    json!({
        "text": format!("{}\n{}", record.error_message, record.backtrace.join("\n")),
    })
}

/// Discord: a single embed with truncated backtrace and context fields.
pub fn discord_payload(record: &NotificationRecord, username: &str) -> Result<Value, DeliveryError> {
    let backtrace_text = truncate_field(
        &record
            .backtrace
            .iter()
            .take(DISCORD_BACKTRACE_FRAMES)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
    );
    let context_text = truncate_field(&render_context(record)?);

    Ok(json!({
        "username": username,
        "embeds": [
            {
                "title": EMBED_TITLE,
                "description": record.error_message,
                "color": EMBED_COLOR,
                "fields": [
                    {
                        "name": "Backtrace",
                        "value": format!("```\n{}\n```", backtrace_text),
                        "inline": false
                    },
                    {
                        "name": "Context",
                        "value": format!("```\n{}\n```", context_text),
                        "inline": false
                    }
                ],
                "timestamp": record.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            }
        ]
    }))
}

/// Email: the mailer receives the raw record fields plus addressing.
pub fn error_mail(record: &NotificationRecord, from: &str, to: &str) -> ErrorMail {
    ErrorMail {
        from: from.to_string(),
        to: to.to_string(),
        subject: format!(
            "{} {}",
            SUBJECT_TAG,
            truncate_with_omission(&record.error_message, SUBJECT_LENGTH)
        ),
        error: record.error_message.clone(),
        backtrace: record.backtrace.clone(),
        context: record.context.clone(),
    }
}

/// Form body of a Twilio message-creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwilioMessage {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "Body")]
    pub body: String,
}

fn with_scheme(scheme: Option<&str>, number: &str) -> String {
    match scheme.filter(|s| !s.is_empty()) {
        Some(scheme) => format!("{}:{}", scheme, number),
        None => number.to_string(),
    }
}

/// Twilio: a compact body with the message, the first frame and the context.
pub fn twilio_message(
    record: &NotificationRecord,
    scheme: Option<&str>,
    from: &str,
    to: &str,
) -> Result<TwilioMessage, DeliveryError> {
    Ok(TwilioMessage {
        from: with_scheme(scheme, from),
        to: with_scheme(scheme, to),
        body: format!(
            "🚨 Error: {}\nLocation: {}\nContext: {}",
            record.error_message,
            record.first_frame(),
            render_context(record)?
        ),
    })
}
