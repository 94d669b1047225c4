/// errnotify - Error notifications for Slack, Discord, email and Twilio
///
/// This library packages an application error, its backtrace and some
/// caller-supplied context into a notification and delivers it to every
/// configured channel. Delivery is best effort: a failing channel is logged
/// and never affects the others or the caller.
pub mod notification;

pub mod cli;
pub mod config;
pub mod core;
pub mod formatting;

// Re-export core types for convenience
pub use crate::config::Config;
pub use crate::core::{context_from, Channel, ChannelSender, Context, ErrorMail, Mailer, NotificationRecord};
pub use crate::notification::{DeliveryError, DeliveryOutcome, Dispatcher, DispatcherBuilder};

/// Builds a configuration by applying `mutator` to the defaults.
///
/// ```
/// let config = errnotify::configure(|cfg| {
///     cfg.slack.webhook_url = Some("https://hooks.slack.com/services/T000/B000/XXX".into());
/// });
/// assert!(config.channel_active(errnotify::Channel::Slack));
/// ```
pub fn configure<F>(mutator: F) -> Config
where
    F: FnOnce(&mut Config),
{
    let mut config = Config::default();
    mutator(&mut config);
    config
}
