use std::io::Write;
use wings_core::config::DEFAULT_ADAPTER_NAME;
use wings_core::db::DEFAULT_BUSY_TIMEOUT_MS;
use wings_core::{default_log_level, ConfigError, WingsConfig};

#[test]
fn defaults_apply_to_missing_fields() {
    let config = WingsConfig::from_json_str(r#"{"database": {}}"#).unwrap();

    assert_eq!(config.adapter_name, DEFAULT_ADAPTER_NAME);
    assert_eq!(config.database.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    assert_eq!(config.logging.level, default_log_level());
    assert_eq!(config, WingsConfig::default());
}

#[test]
fn from_path_reads_full_document() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("wings.db");
    let log_dir = dir.path().join("logs");
    let mut file = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
    write!(
        file,
        r#"{{
            "adapter_name": "archive",
            "database": {{"path": {}, "busy_timeout_ms": 250}},
            "logging": {{"level": "warn", "dir": {}}}
        }}"#,
        serde_json::to_string(&db_path).unwrap(),
        serde_json::to_string(&log_dir).unwrap()
    )
    .unwrap();

    let config = WingsConfig::from_path(file.path()).unwrap();

    assert_eq!(config.adapter_name, "archive");
    assert_eq!(config.database.path.as_deref(), Some(db_path.as_path()));
    assert_eq!(config.database.busy_timeout_ms, 250);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.dir.as_deref(), log_dir.to_str());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = WingsConfig::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn invalid_values_are_rejected() {
    for (raw, field) in [
        (r#"{"database": {"busy_timeout_ms": 0}}"#, "database.busy_timeout_ms"),
        (r#"{"logging": {"dir": "relative/logs"}}"#, "logging.dir"),
        (r#"{"adapter_name": ""}"#, "adapter_name"),
    ] {
        match WingsConfig::from_json_str(raw).unwrap_err() {
            ConfigError::Invalid { field: actual, .. } => assert_eq!(actual, field),
            other => panic!("unexpected error for {raw}: {other}"),
        }
    }
}

#[test]
fn malformed_json_is_parse_error() {
    assert!(matches!(
        WingsConfig::from_json_str("{").unwrap_err(),
        ConfigError::Parse(_)
    ));
}
