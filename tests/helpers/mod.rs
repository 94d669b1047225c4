#![allow(dead_code)]
pub mod mock_mailer;

use errnotify::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SLACK_PATH: &str = "/slack";
pub const DISCORD_PATH: &str = "/discord";
pub const TWILIO_PATH: &str = "/Accounts/sid123/Messages.json";

/// A config with Slack and Discord pointed at `server`.
pub fn webhook_config(server: &MockServer) -> Config {
    errnotify::configure(|cfg| {
        cfg.slack.webhook_url = Some(format!("{}{}", server.uri(), SLACK_PATH));
        cfg.discord.webhook_url = Some(format!("{}{}", server.uri(), DISCORD_PATH));
        cfg.timeout_ms = 2000;
    })
}

/// A config with every channel configured, HTTP channels pointed at `server`.
pub fn full_config(server: &MockServer) -> Config {
    let mut config = webhook_config(server);
    config.email.to = Some("test@example.com".to_string());
    config.email.from = Some("errors@example.com".to_string());
    with_twilio(&mut config, server);
    config
}

pub fn with_twilio(config: &mut Config, server: &MockServer) {
    config.twilio.account_sid = Some("sid123".to_string());
    config.twilio.auth_token = Some("token123".to_string());
    config.twilio.from = Some("+14150000000".to_string());
    config.twilio.to = Some("+919876543210".to_string());
    config.twilio.api_base = server.uri();
}

/// Mounts a mock answering `status` on `route`, expecting `calls` requests.
pub async fn mount_endpoint(server: &MockServer, route: &str, status: u16, calls: u64) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .expect(calls)
        .mount(server)
        .await;
}

/// Decoded JSON bodies of every request received on `route`.
pub async fn json_bodies(server: &MockServer, route: &str) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == route)
        .map(|r| serde_json::from_slice(&r.body).expect("request body is not JSON"))
        .collect()
}
