use pmoconfig::{Config, LoggerSettings};
use serde_yaml::Value;
use std::fs;

#[test]
fn test_load_embedded_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

    assert_eq!(config.get_http_port(), 8880);
    assert_eq!(config.get_u64(&["jukebox", "tick_interval_ms"]), Some(1000));
    assert_eq!(config.logger_settings(), LoggerSettings::default());
    assert_eq!(config.get_base_url(), "localhost");

    // La config fusionnée est réécrite sur disque
    assert!(dir.path().join("config.yaml").exists());
}

#[test]
fn test_user_file_is_merged_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.yaml"),
        "host:\n  http_port: 9100\njukebox:\n  mailbox_capacity: 8\n",
    )
    .unwrap();

    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

    assert_eq!(config.get_http_port(), 9100);
    assert_eq!(config.get_u64(&["jukebox", "mailbox_capacity"]), Some(8));
    // Clé absente du fichier utilisateur : valeur par défaut conservée
    assert_eq!(config.get_u64(&["jukebox", "tick_interval_ms"]), Some(1000));
}

#[test]
fn test_env_override() {
    std::env::set_var("PMOJUKEBOX_CONFIG__TESTING__ENV_PROBE", "42");
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
    std::env::remove_var("PMOJUKEBOX_CONFIG__TESTING__ENV_PROBE");

    assert_eq!(config.get_u64(&["testing", "env_probe"]), Some(42));
}

#[test]
fn test_set_value_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap();

    let config = Config::load_config(path).unwrap();
    config
        .set_value(&["host", "http_port"], Value::Number(9200.into()))
        .unwrap();
    config
        .set_value(&["jukebox", "tick_interval_ms"], Value::String("250".into()))
        .unwrap();

    let reloaded = Config::load_config(path).unwrap();
    assert_eq!(reloaded.get_http_port(), 9200);
    assert_eq!(reloaded.get_u64(&["jukebox", "tick_interval_ms"]), Some(250));
}

#[test]
fn test_managed_dir_is_created_relative_to_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

    let managed = config.get_managed_dir(&["jukebox", "directory"], "jukebox").unwrap();

    assert_eq!(managed, dir.path().join("jukebox"));
    assert!(dir.path().join("jukebox").is_dir());
}

#[test]
fn test_logger_settings_from_user_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.yaml"),
        "Host:\n  Logger:\n    min_level: DEBUG\n    enable_console: false\n",
    )
    .unwrap();

    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
    let settings = config.logger_settings();

    assert_eq!(settings.min_level, "DEBUG");
    assert!(!settings.enable_console);
    // Clé non fournie : valeur embarquée
    assert_eq!(settings.buffer_capacity, 1000);
}

#[test]
fn test_invalid_port_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.yaml"), "host:\n  http_port: 70000\n").unwrap();

    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

    assert_eq!(config.get_http_port(), 8880);
}

#[test]
fn test_missing_managed_dir_key_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

    let managed = config.get_managed_dir(&["covers", "directory"], "covers").unwrap();

    assert_eq!(managed, dir.path().join("covers"));
    assert_eq!(
        config.get_value(&["covers", "directory"]),
        Some(Value::String("covers".into()))
    );
}
