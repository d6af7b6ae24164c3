//! Tests for configuration files.

use relay::{LogFormat, RelayConfig};
use std::io::Write;

#[test]
fn test_file_overrides_bundled_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[discord]
token = "discord-token"
authorized_channels = ["42"]

[openwebui]
api_key = "sk-test"
model = "llama3"

[rate_limit]
channel_requests_per_minute = 3

[logging]
format = "text"
"#
    )
    .unwrap();

    let config = RelayConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.discord().token(), "discord-token");
    assert_eq!(config.discord().authorized_channels(), &vec!["42".to_string()]);
    assert_eq!(config.discord().command_prefix(), "!");
    assert_eq!(config.openwebui().model(), "llama3");
    assert_eq!(config.openwebui().endpoint(), "http://localhost:8080");
    assert_eq!(config.rate_limit().channel_requests_per_minute().get(), 3);
    assert_eq!(config.rate_limit().requests_per_minute().get(), 30);
    assert_eq!(*config.logging().format(), LogFormat::Text);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(RelayConfig::from_file(dir.path().join("absent.toml")).is_err());
    assert!(RelayConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
}

#[test]
fn test_zero_rate_is_rejected() {
    let result = RelayConfig::from_toml_str("[rate_limit]\nrequests_per_minute = 0\n");
    assert!(result.is_err());
}

#[test]
fn test_validation_names_missing_field() {
    let config = RelayConfig::from_toml_str("[discord]\ntoken = \"t\"\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("openwebui.api_key"));
}

#[test]
fn test_zero_max_age_is_rejected() {
    let config = RelayConfig::from_toml_str(
        "[discord]\ntoken = \"t\"\n[openwebui]\napi_key = \"k\"\n[context]\nmax_age_minutes = 0\n",
    )
    .unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_channel_rate_above_global_is_rejected() {
    let config = RelayConfig::from_toml_str(
        r#"
[openwebui]
api_key = "sk-test"

[rate_limit]
requests_per_minute = 5
channel_requests_per_minute = 6
"#,
    )
    .unwrap();
    let err = config.validate_without_discord().unwrap_err();
    assert!(err.to_string().contains("rate_limit.channel_requests_per_minute"));

    let config = RelayConfig::from_toml_str(
        "[openwebui]\napi_key = \"sk-test\"\n\n[rate_limit]\nrequests_per_minute = 5\nchannel_requests_per_minute = 5\n",
    )
    .unwrap();
    config.validate_without_discord().unwrap();
}

#[test]
fn test_validate_creates_log_directory() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("logs/nested/relay.log");
    let text = format!(
        "[discord]\ntoken = \"t\"\n[openwebui]\napi_key = \"k\"\n[logging]\nfile = {:?}\n",
        log_file.display().to_string()
    );

    let config = RelayConfig::from_toml_str(&text).unwrap();
    config.validate().unwrap();
    assert!(dir.path().join("logs/nested").is_dir());
}

#[test]
fn test_example_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf/relay.toml");

    RelayConfig::write_example(&path).unwrap();
    let loaded = RelayConfig::from_file(&path).unwrap();

    assert_eq!(loaded, RelayConfig::example());
    loaded.validate().unwrap();
}
