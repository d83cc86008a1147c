#![allow(clippy::unwrap_used)]
// Loading, saving, and translating TOML profiles.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

use aldes_config::{
    Config, ConfigError, Profile, load_config_from, profile_to_controller_config, save_config_to,
};
use aldes_core::AirMode;

const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
output = "json"
timeout = 10

[profiles.home]
username = "me@example.test"
password = "plaintext-pw"
refresh_interval = 60
default_heat_mode = "C"
default_cool_mode = "Cool Boost"

[profiles.staging]
username = "qa@example.test"
base_url = "https://staging.example.test/api"
"#;

#[test]
fn test_load_profiles_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let cfg = load_config_from(&path).unwrap();

    assert_eq!(cfg.default_profile.as_deref(), Some("home"));
    assert_eq!(cfg.defaults.output, "json");
    assert_eq!(cfg.defaults.timeout, 10);
    assert_eq!(cfg.defaults.refresh_interval, 15);
    assert_eq!(cfg.profile_names(), vec!["home", "staging"]);
    assert_eq!(
        cfg.profiles["staging"].base_url.as_deref(),
        Some("https://staging.example.test/api")
    );
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    assert_eq!(cfg.defaults.output, "table");
    assert!(cfg.profiles.is_empty());
}

#[test]
fn test_save_then_load_preserves_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    cfg.profiles.insert(
        "cabin".into(),
        Profile {
            username: Some("cabin@example.test".into()),
            password_env: Some("CABIN_PW".into()),
            ..Profile::default()
        },
    );
    save_config_to(&cfg, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let cabin = &loaded.profiles["cabin"];
    assert_eq!(cabin.username.as_deref(), Some("cabin@example.test"));
    assert_eq!(cabin.password_env.as_deref(), Some("CABIN_PW"));
}

#[test]
fn test_profile_translates_to_controller_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();
    let cfg = load_config_from(&path).unwrap();

    let config =
        profile_to_controller_config(&cfg.profiles["home"], "aldes-config-test-home", &cfg.defaults)
            .unwrap();

    assert_eq!(config.username, "me@example.test");
    assert_eq!(config.password.expose_secret(), "plaintext-pw");
    assert_eq!(config.timeout, Duration::from_secs(10));
    assert_eq!(config.refresh_interval, Duration::from_secs(60));
    assert_eq!(config.default_heat_mode, AirMode::HeatEco);
    assert_eq!(config.default_cool_mode, AirMode::CoolBoost);
    assert_eq!(
        config.base_url.as_str(),
        "https://aldesiotsuite-aldeswebapi.azurewebsites.net/"
    );
}

#[test]
fn test_invalid_mode_setting_is_rejected() {
    let profile = Profile {
        username: Some("me@example.test".into()),
        password: Some("pw".into()),
        default_heat_mode: Some("Z".into()),
        ..Profile::default()
    };

    let result =
        profile_to_controller_config(&profile, "aldes-config-test-bad-mode", &Config::default().defaults);

    match result {
        Err(ConfigError::Validation { field, .. }) => assert_eq!(field, "default_heat_mode"),
        other => panic!("expected Validation error, got: {other:?}"),
    }
}
