//! Unit tests for configuration loading and graceful degradation
//!
//! Covers:
//! - Missing or malformed TOML files never abort startup and are reported
//! - Override > TOML > compiled default priority
//! - Atomic config writes
//!
//! Tests that point XDG_CONFIG_HOME somewhere else are marked #[serial] so
//! they never observe each other's environment.

use serial_test::serial;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tg_common::config::{
    load_toml_config, load_toml_config_or_default, write_atomic, write_toml_config,
    CompiledDefaults, LoggingConfig, Settings, SettingsOverrides, TomlConfig,
};

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();

    assert_eq!(defaults.backend_url, "http://127.0.0.1:5000");
    assert_eq!(defaults.round_reset_delay_ms, 2500);
    assert_eq!(defaults.request_timeout_secs, 30);
    assert_eq!(defaults.log_level, "info");
    assert!(defaults.data_file.ends_with("scores.json"));
}

#[test]
fn test_missing_explicit_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let (config, problem) = load_toml_config_or_default(Some(&missing));
    assert_eq!(config, TomlConfig::default());
    assert!(problem.unwrap().contains("nope.toml"));
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "backend_url = [not toml").unwrap();

    assert!(load_toml_config(&path).is_err());
    let (config, problem) = load_toml_config_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
    assert!(problem.is_some());
}

#[test]
fn test_full_file_parses() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
backend_url = "https://trackguessr.example.com"
data_file = "/tmp/tg/scores.json"
round_reset_delay_ms = 1000
request_timeout_secs = 5

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.backend_url.as_deref(), Some("https://trackguessr.example.com"));
    assert_eq!(config.data_file, Some(PathBuf::from("/tmp/tg/scores.json")));
    assert_eq!(config.round_reset_delay_ms, Some(1000));
    assert_eq!(config.request_timeout_secs, Some(5));
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.file.is_none());
}

#[test]
fn test_override_beats_toml_beats_default() {
    let toml = TomlConfig {
        backend_url: Some("http://from-toml:5000".to_string()),
        data_file: Some(PathBuf::from("/toml/scores.json")),
        round_reset_delay_ms: Some(100),
        request_timeout_secs: None,
        logging: LoggingConfig {
            level: "warn".to_string(),
            file: None,
        },
    };
    let overrides = SettingsOverrides {
        backend_url: Some("http://from-cli:5000".to_string()),
        ..Default::default()
    };

    let settings = Settings::resolve(overrides, toml, CompiledDefaults::for_current_platform());

    assert_eq!(settings.backend_url, "http://from-cli:5000");
    assert_eq!(settings.data_file, PathBuf::from("/toml/scores.json"));
    assert_eq!(settings.round_reset_delay, Duration::from_millis(100));
    assert_eq!(settings.request_timeout, Duration::from_secs(30));
    assert_eq!(settings.log_level, "warn");
}

#[test]
fn test_write_then_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("config.toml");

    let config = TomlConfig {
        backend_url: Some("http://localhost:5000".to_string()),
        round_reset_delay_ms: Some(2500),
        ..Default::default()
    };
    write_toml_config(&config, &target).unwrap();

    assert!(target.exists());
    assert!(!temp_dir.path().join("nested").join("config.toml.tmp").exists());
    assert_eq!(load_toml_config(&target).unwrap(), config);
}

#[test]
fn test_write_atomic_replaces_existing_contents() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("scores.json");

    write_atomic(&target, b"first").unwrap();
    write_atomic(&target, b"second").unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_default_location_is_used_when_present() {
    let temp_dir = TempDir::new().unwrap();
    let app_dir = temp_dir.path().join("trackguessr");
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(app_dir.join("config.toml"), "round_reset_delay_ms = 42\n").unwrap();

    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    let (config, problem) = load_toml_config_or_default(None);

    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(config.round_reset_delay_ms, Some(42));
    assert!(problem.is_none());
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_no_default_file_means_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    let (config, problem) = load_toml_config_or_default(None);

    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    // An absent default file is not reported
    assert_eq!(config, TomlConfig::default());
    assert!(problem.is_none());
}
