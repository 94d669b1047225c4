//! Configuration management for errnotify
//!
//! This module defines the main `Config` struct and its per-channel
//! sections. It uses the `figment` crate to layer defaults, an optional
//! `errnotify.toml` file, environment variables and command-line overrides.

use crate::cli::Cli;
use crate::core::Channel;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Twilio REST API base URL.
pub const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// The main configuration struct for errnotify.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Global kill switch. When false, `notify` does nothing.
    pub enabled: bool,
    /// The logging level used by the `errnotify` binary.
    pub log_level: String,
    /// Upper bound for a single channel delivery, in milliseconds.
    pub timeout_ms: u64,
    /// Slack incoming webhook.
    #[serde(default)]
    pub slack: SlackConfig,
    /// Discord webhook.
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Email delivery.
    #[serde(default)]
    pub email: EmailConfig,
    /// Twilio messaging relay.
    #[serde(default)]
    pub twilio: TwilioConfig,
}

/// Configuration for Slack alerts.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SlackConfig {
    /// The Slack incoming webhook URL.
    pub webhook_url: Option<String>,
}

/// Configuration for Discord alerts.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DiscordConfig {
    /// The Discord webhook URL.
    pub webhook_url: Option<String>,
    /// Display name the webhook posts under.
    pub username: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: "errnotify".to_string(),
        }
    }
}

/// Configuration for email alerts.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct EmailConfig {
    /// Recipient address.
    pub to: Option<String>,
    /// Sender address.
    pub from: Option<String>,
    /// SMTP relay used by the bundled mailer.
    pub smtp: SmtpConfig,
}

/// SMTP relay settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25,
            username: None,
            password: None,
            starttls: false,
        }
    }
}

/// Configuration for the Twilio messaging relay.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    /// Sender number, without scheme.
    pub from: Option<String>,
    /// Recipient number, without scheme.
    pub to: Option<String>,
    /// Address scheme prefixed to both numbers (`whatsapp` gives `whatsapp:+1...`).
    /// `None` sends plain SMS.
    pub address_scheme: Option<String>,
    /// REST API base, overridable for testing.
    pub api_base: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from: None,
            to: None,
            address_scheme: Some("whatsapp".to_string()),
            api_base: TWILIO_API_BASE.to_string(),
        }
    }
}

/// Resolved Twilio credentials, only available when every field is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwilioCredentials<'a> {
    pub account_sid: &'a str,
    pub auth_token: &'a str,
    pub from: &'a str,
    pub to: &'a str,
}

/// Returns the value if it is present and not blank.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl SlackConfig {
    pub fn webhook(&self) -> Option<&str> {
        present(&self.webhook_url)
    }
}

impl DiscordConfig {
    pub fn webhook(&self) -> Option<&str> {
        present(&self.webhook_url)
    }
}

impl EmailConfig {
    /// Returns `(from, to)` when both addresses are set.
    pub fn addresses(&self) -> Option<(&str, &str)> {
        Some((present(&self.from)?, present(&self.to)?))
    }
}

impl TwilioConfig {
    pub fn credentials(&self) -> Option<TwilioCredentials<'_>> {
        Some(TwilioCredentials {
            account_sid: present(&self.account_sid)?,
            auth_token: present(&self.auth_token)?,
            from: present(&self.from)?,
            to: present(&self.to)?,
        })
    }

    /// The message-creation endpoint for an account.
    pub fn messages_url(&self, account_sid: &str) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            account_sid
        )
    }
}

impl Config {
    /// Loads the configuration by layering defaults, legacy environment
    /// variables, the optional TOML file, `ERRNOTIFY_` environment variables
    /// and command-line overrides, in that order.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(
                Env::raw()
                    .only(&["SLACK_WEBHOOK_URL", "DISCORD_WEBHOOK_URL"])
                    .map(|key| {
                        if key.as_str().eq_ignore_ascii_case("slack_webhook_url") {
                            "slack.webhook_url".into()
                        } else {
                            "discord.webhook_url".into()
                        }
                    }),
            );
        if let Some(path) = &cli.config {
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            // e.g. ERRNOTIFY_TWILIO__ACCOUNT_SID=AC123
            .merge(Env::prefixed("ERRNOTIFY_").split("__"))
            .merge(cli)
            .extract()?;
        Ok(config)
    }

    /// Whether `channel` should receive notifications: the global switch is
    /// on and every field the channel requires is present and non-blank.
    pub fn channel_active(&self, channel: Channel) -> bool {
        if !self.enabled {
            return false;
        }
        match channel {
            Channel::Slack => self.slack.webhook().is_some(),
            Channel::Discord => self.discord.webhook().is_some(),
            Channel::Email => self.email.addresses().is_some(),
            Channel::Twilio => self.twilio.credentials().is_some(),
        }
    }

    /// The channels that are currently active.
    pub fn active_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.channel_active(*c))
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            timeout_ms: 5000,
            slack: SlackConfig::default(),
            discord: DiscordConfig::default(),
            email: EmailConfig::default(),
            twilio: TwilioConfig::default(),
        }
    }
}
