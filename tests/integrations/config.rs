use errnotify::cli::Cli;
use errnotify::config::{Config, TWILIO_API_BASE};
use errnotify::Channel;
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_VARS: &[&str] = &[
    "SLACK_WEBHOOK_URL",
    "DISCORD_WEBHOOK_URL",
    "ERRNOTIFY_ENABLED",
    "ERRNOTIFY_TIMEOUT_MS",
    "ERRNOTIFY_SLACK__WEBHOOK_URL",
    "ERRNOTIFY_TWILIO__ACCOUNT_SID",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn config_file(toml_content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    file
}

fn cli_for(file: &NamedTempFile) -> Cli {
    Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_load_full_valid_config() {
    clear_env();
    let toml_content = r#"
        enabled = true
        log_level = "debug"
        timeout_ms = 2500
        [slack]
        webhook_url = "https://hooks.slack.com/services/T000/B000/XXX"
        [discord]
        webhook_url = "https://discord.com/api/webhooks/1/abc"
        username = "ops-bot"
        [email]
        to = "devs@example.com"
        from = "errors@example.com"
        [email.smtp]
        host = "smtp.example.com"
        port = 587
        username = "mailer"
        password = "secret"
        starttls = true
        [twilio]
        account_sid = "sid123"
        auth_token = "token123"
        from = "+14150000000"
        to = "+919876543210"
        address_scheme = "whatsapp"
    "#;
    let file = config_file(toml_content);

    let config = Config::load(&cli_for(&file)).unwrap();

    assert!(config.enabled);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.timeout_ms, 2500);
    assert_eq!(
        config.slack.webhook_url.as_deref(),
        Some("https://hooks.slack.com/services/T000/B000/XXX")
    );
    assert_eq!(config.discord.username, "ops-bot");
    assert_eq!(config.email.smtp.host, "smtp.example.com");
    assert_eq!(config.email.smtp.port, 587);
    assert!(config.email.smtp.starttls);
    assert_eq!(config.twilio.account_sid.as_deref(), Some("sid123"));
    // Not in the file, so it keeps the default.
    assert_eq!(config.twilio.api_base, TWILIO_API_BASE);
    assert_eq!(config.active_channels(), Channel::ALL.to_vec());
}

#[test]
#[serial]
fn test_load_default_values() {
    clear_env();
    let file = config_file("");

    let config = Config::load(&cli_for(&file)).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_load_without_file() {
    clear_env();
    let config = Config::load(&Cli::default()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_partial_section_keeps_other_defaults() {
    clear_env();
    let file = config_file(
        r#"
        [discord]
        webhook_url = "https://discord.com/api/webhooks/1/abc"
        [twilio]
        account_sid = "sid123"
    "#,
    );

    let config = Config::load(&cli_for(&file)).unwrap();

    assert_eq!(config.discord.username, "errnotify");
    assert_eq!(config.twilio.address_scheme.as_deref(), Some("whatsapp"));
    assert_eq!(config.active_channels(), vec![Channel::Discord]);
}

#[test]
#[serial]
fn test_invalid_value_type() {
    clear_env();
    let file = config_file(
        r#"
        timeout_ms = "soon"
    "#,
    );

    let config = Config::load(&cli_for(&file));
    assert!(config.is_err());
}

#[test]
#[serial]
fn test_prefixed_environment_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
        timeout_ms = 2500
        [slack]
        webhook_url = "https://hooks.slack.com/from-file"
    "#,
    );
    std::env::set_var("ERRNOTIFY_TIMEOUT_MS", "750");
    std::env::set_var("ERRNOTIFY_SLACK__WEBHOOK_URL", "https://hooks.slack.com/from-env");
    std::env::set_var("ERRNOTIFY_TWILIO__ACCOUNT_SID", "AC999");

    let config = Config::load(&cli_for(&file));
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.timeout_ms, 750);
    assert_eq!(
        config.slack.webhook_url.as_deref(),
        Some("https://hooks.slack.com/from-env")
    );
    assert_eq!(config.twilio.account_sid.as_deref(), Some("AC999"));
}

#[test]
#[serial]
fn test_legacy_webhook_variables_are_read() {
    clear_env();
    std::env::set_var("SLACK_WEBHOOK_URL", "https://hooks.slack.com/legacy");
    std::env::set_var("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/legacy");

    let config = Config::load(&Cli::default());
    clear_env();
    let config = config.unwrap();

    assert_eq!(
        config.slack.webhook_url.as_deref(),
        Some("https://hooks.slack.com/legacy")
    );
    assert_eq!(
        config.discord.webhook_url.as_deref(),
        Some("https://discord.com/api/webhooks/legacy")
    );
}

#[test]
#[serial]
fn test_file_overrides_legacy_variables() {
    clear_env();
    std::env::set_var("SLACK_WEBHOOK_URL", "https://hooks.slack.com/legacy");
    let file = config_file(
        r#"
        [slack]
        webhook_url = "https://hooks.slack.com/from-file"
    "#,
    );

    let config = Config::load(&cli_for(&file));
    clear_env();

    assert_eq!(
        config.unwrap().slack.webhook_url.as_deref(),
        Some("https://hooks.slack.com/from-file")
    );
}

#[test]
#[serial]
fn test_cli_overrides_everything() {
    clear_env();
    std::env::set_var("ERRNOTIFY_ENABLED", "true");
    let file = config_file(
        r#"
        log_level = "info"
        [slack]
        webhook_url = "https://hooks.slack.com/from-file"
    "#,
    );
    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        log_level: Some("trace".to_string()),
        disable: true,
        slack_webhook: Some("https://hooks.slack.com/from-cli".to_string()),
        ..Default::default()
    };

    let config = Config::load(&cli);
    clear_env();
    let config = config.unwrap();

    assert!(!config.enabled);
    assert_eq!(config.log_level, "trace");
    assert_eq!(
        config.slack.webhook_url.as_deref(),
        Some("https://hooks.slack.com/from-cli")
    );
    assert!(config.active_channels().is_empty());
}
