//! Unit tests for configuration discovery and graceful degradation
//!
//! Tests:
//! - Missing TOML files do not cause termination
//! - Priority order for config file resolution (CLI > ENV > user dir)
//! - Atomic TOML write round trip
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate MARC_CONFIG are marked with #[serial].

use marc_common::config::{
    load_toml_config, resolve_config_path, write_toml_config, LoggingConfig, TomlConfig,
    CONFIG_ENV_VAR,
};
use serial_test::serial;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_path_takes_precedence_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/marc-env-config.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/marc-cli-config.toml")));
    assert_eq!(resolved, Some(PathBuf::from("/tmp/marc-cli-config.toml")));

    // Cleanup
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/marc-env-config.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/marc-env-config.toml")));

    // Cleanup
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_config_file_does_not_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let config = load_toml_config(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_no_config_path_uses_defaults() {
    let config = load_toml_config(None).unwrap();
    assert_eq!(config.pipeline.full_set_size, 90);
}

#[test]
fn test_malformed_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "[pipeline\nz_threshold = ").unwrap();

    assert!(load_toml_config(Some(&path)).is_err());
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tiny.toml");
    std::fs::write(&path, "[pipeline]\nfull_set_size = 1\n").unwrap();

    assert!(load_toml_config(Some(&path)).is_err());
}

#[test]
fn test_write_then_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("config.toml");

    let mut categories = BTreeMap::new();
    categories.insert(
        "animals".to_string(),
        vec!["蚂蚁".to_string(), "猫".to_string()],
    );

    let mut config = TomlConfig {
        logging: LoggingConfig {
            level: "debug".to_string(),
            file: Some(PathBuf::from("/tmp/marc.log")),
        },
        categories,
        ..TomlConfig::default()
    };
    config.pipeline.equal_weights = false;
    config.pipeline.z_threshold = 2.0;

    write_toml_config(&config, &target).unwrap();

    assert!(target.exists());
    assert!(!temp_dir.path().join("nested").join("config.toml.tmp").exists());

    let loaded = load_toml_config(Some(&target)).unwrap();
    assert_eq!(loaded, config);
}
