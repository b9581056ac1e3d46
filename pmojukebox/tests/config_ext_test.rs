#![cfg(feature = "pmoconfig")]

use pmoconfig::Config;
use pmojukebox::{JukeboxConfigExt, DEFAULT_MAILBOX_CAPACITY, DEFAULT_TICK_INTERVAL};
use std::fs;
use std::time::Duration;

fn load(yaml: Option<&str>) -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    if let Some(yaml) = yaml {
        fs::write(dir.path().join("config.yaml"), yaml).unwrap();
    }
    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
    (dir, config)
}

#[test]
fn test_default_jukebox_options() {
    let (dir, config) = load(None);

    let options = config.jukebox_options();
    assert_eq!(options.tick_interval, DEFAULT_TICK_INTERVAL);
    assert_eq!(options.mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);

    let db = config.jukebox_db_path().unwrap();
    assert_eq!(db, dir.path().join("jukebox").join("jukebox.db"));
    assert!(dir.path().join("jukebox").is_dir());
}

#[test]
fn test_configured_jukebox_options() {
    let (_dir, config) = load(Some("jukebox:\n  tick_interval_ms: 250\n  mailbox_capacity: 4\n"));

    assert_eq!(config.jukebox_tick_interval(), Duration::from_millis(250));
    assert_eq!(config.jukebox_mailbox_capacity(), 4);
}

#[test]
fn test_zero_values_fall_back_to_defaults() {
    let (_dir, config) = load(Some("jukebox:\n  tick_interval_ms: 0\n  mailbox_capacity: 0\n"));

    assert_eq!(config.jukebox_tick_interval(), DEFAULT_TICK_INTERVAL);
    assert_eq!(config.jukebox_mailbox_capacity(), DEFAULT_MAILBOX_CAPACITY);
}
