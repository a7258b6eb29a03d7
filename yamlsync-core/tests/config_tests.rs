//! Config file load / save integration tests.

use std::fs;

use yamlsync_core::{config, ConfigError, SyncConfig};

#[test]
fn partial_file_keeps_defaults_for_absent_fields() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("sync.yaml");
    fs::write(&path, "max_parallel: 5\n").expect("write");

    let config = config::load_at(&path).expect("load");
    assert_eq!(config.max_parallel, 5);
    assert_eq!(config.managed_root, "Setup/");
    assert_eq!(config.quarantine_ttl_secs, 1800);
}

#[test]
fn empty_file_yields_defaults() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("sync.yaml");
    fs::write(&path, "\n").expect("write");

    assert_eq!(config::load_at(&path).expect("load"), SyncConfig::default());
}

#[test]
fn malformed_yaml_returns_parse_error_with_path() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("sync.yaml");
    fs::write(&path, b"max_parallel: [unclosed\n").expect("write");

    let err = config::load_at(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("sync.yaml"), "must contain file path, got: {err}");
}

#[test]
fn invalid_value_is_rejected_on_load() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("sync.yaml");
    fs::write(&path, "managed_root: \"  \"\n").expect("write");

    let err = config::load_at(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "managed_root", .. }), "got: {err}");
}

#[test]
fn save_then_load_preserves_values_and_cleans_tmp() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("nested").join("sync.yaml");
    let config = SyncConfig {
        managed_root: "Config/".to_string(),
        max_parallel: 3,
        quarantine_ttl_secs: 60,
        upload_timeout_secs: 5,
    };

    config::save_at(&path, &config).expect("save");
    assert!(!path.with_extension("yaml.tmp").exists(), ".tmp must be removed after save");
    assert_eq!(config::load_at(&path).expect("load"), config);
}
