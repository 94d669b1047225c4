//! errnotify - sends a test error notification
//!
//! Loads the configuration the same way a host application would and pushes
//! one notification through every active channel, which makes it easy to
//! check webhook URLs and credentials before wiring the library in.

use anyhow::Result;
use clap::Parser;
use errnotify::{cli::Cli, config::Config, core::Channel, Context, Dispatcher, NotificationRecord};
use serde_json::Value;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // Manually initialize logging for this specific error
        init_logging("error");
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    init_logging(&config.log_level);

    let context_pairs = cli.context_pairs().unwrap_or_else(|err| {
        error!("{}", err);
        std::process::exit(1);
    });

    info!("errnotify starting up...");

    // Log the loaded configuration settings for visibility
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!(
        "Notifications: {}",
        if config.enabled { "Enabled" } else { "Disabled" }
    );
    info!("Delivery Timeout: {}ms", config.timeout_ms);
    for channel in Channel::ALL {
        info!(
            "{} Channel: {}",
            channel,
            if config.channel_active(channel) {
                "Enabled"
            } else {
                "Disabled"
            }
        );
    }
    info!("-------------------------------------------------------");

    if !config.enabled {
        warn!("Notifications are disabled. Nothing to send.");
        return Ok(());
    }
    if config.active_channels().is_empty() {
        warn!("No channel is fully configured. Nothing to send.");
        return Ok(());
    }

    let dispatcher = Dispatcher::new(config)?;

    let mut context = Context::new();
    context.insert("source".to_string(), Value::from("errnotify-cli"));
    for (key, value) in context_pairs {
        context.insert(key, Value::from(value));
    }

    let record = NotificationRecord::new(
        cli.message.clone(),
        Some(vec![format!("{}:{}", file!(), line!())]),
        context,
    );

    let outcomes = dispatcher.dispatch(&record).await;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(()) => info!("{}: delivered", outcome.channel),
            Err(e) => warn!("{}: failed ({})", outcome.channel, e),
        }
    }

    let delivered = outcomes.iter().filter(|o| o.is_success()).count();
    info!(
        "Test notification sent to {} of {} channels.",
        delivered,
        outcomes.len()
    );

    Ok(())
}
