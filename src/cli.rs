//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the `errnotify` binary
//! using the `clap` crate. Configuration overrides are merged on top of the
//! `errnotify.toml` file and environment variables; the remaining arguments
//! describe the test notification to send.

use clap::Parser;
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Sends a test error notification through every configured channel.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Disable all notifications.
    #[arg(long)]
    pub disable: bool,

    /// Slack incoming webhook URL.
    #[arg(long, value_name = "URL")]
    pub slack_webhook: Option<String>,

    /// Discord webhook URL.
    #[arg(long, value_name = "URL")]
    pub discord_webhook: Option<String>,

    /// Error message of the test notification.
    #[arg(short, long, default_value = "errnotify test notification")]
    pub message: String,

    /// Context entries attached to the notification.
    #[arg(long = "context", value_name = "KEY=VALUE")]
    pub context: Vec<String>,
}

impl Cli {
    /// Parses the `--context KEY=VALUE` arguments.
    pub fn context_pairs(&self) -> anyhow::Result<Vec<(String, String)>> {
        self.context
            .iter()
            .map(|entry| {
                entry
                    .split_once('=')
                    .filter(|(key, _)| !key.is_empty())
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .ok_or_else(|| anyhow::anyhow!("invalid context entry '{}', expected KEY=VALUE", entry))
            })
            .collect()
    }
}

/// Inserts `key` into the `section` table of `dict`, creating the table if needed.
fn insert_nested(dict: &mut Dict, section: &str, key: &str, value: Value) {
    let entry = dict
        .entry(section.to_string())
        .or_insert_with(|| Value::Dict(Tag::Default, Dict::new()));
    if let Value::Dict(_, table) = entry {
        table.insert(key.to_string(), value);
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        // Only an explicit `--disable` overrides the configured switch.
        if self.disable {
            dict.insert("enabled".into(), Value::from(false));
        }

        if let Some(url) = &self.slack_webhook {
            insert_nested(&mut dict, "slack", "webhook_url", Value::from(url.clone()));
        }

        if let Some(url) = &self.discord_webhook {
            insert_nested(&mut dict, "discord", "webhook_url", Value::from(url.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
