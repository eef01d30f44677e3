//! Loading engine configuration files from disk

use std::fs;
use studio_sequencer::{ConfigError, EngineConfig, Transport};
use tempfile::tempdir;

#[test]
fn test_load_ron_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.ron");
    fs::write(
        &path,
        "(tempo_bpm: 90.0, bars: 2, schedule_ahead_secs: 0.2, tick_interval_ms: 50)",
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.tempo_bpm, 90.0);
    assert_eq!(config.grid().total_steps(), 32);
    assert_eq!(config.command_capacity, 256);

    let transport = Transport::from_config(&config);
    assert_eq!(transport.tempo().bpm(), 90.0);
    assert_eq!(transport.schedule_ahead(), 0.2);
    assert!((transport.step_duration() - 60.0 / (90.0 * 4.0)).abs() < 1e-12);
}

#[test]
fn test_load_json_file_with_clamped_tempo() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.JSON");
    fs::write(&path, r#"{ "tempo_bpm": 900.0, "steps_per_bar": 12 }"#).unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.steps_per_bar, 12);
    assert_eq!(Transport::from_config(&config).tempo().bpm(), 300.0);
}

#[test]
fn test_saved_config_loads_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("saved.ron");
    let config = EngineConfig {
        bars: 3,
        tempo_bpm: 128.0,
        ..Default::default()
    };
    fs::write(&path, config.to_ron().unwrap()).unwrap();
    assert_eq!(EngineConfig::load(&path).unwrap(), config);
}

#[test]
fn test_load_errors() {
    let dir = tempdir().unwrap();

    let missing = dir.path().join("missing.ron");
    assert!(matches!(EngineConfig::load(&missing), Err(ConfigError::Io(_))));

    let yaml = dir.path().join("engine.yaml");
    fs::write(&yaml, "tempo_bpm: 120").unwrap();
    assert!(matches!(
        EngineConfig::load(&yaml),
        Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"
    ));

    let broken = dir.path().join("broken.ron");
    fs::write(&broken, "(tempo_bpm: )").unwrap();
    assert!(matches!(EngineConfig::load(&broken), Err(ConfigError::Ron(_))));

    let broken_json = dir.path().join("broken.json");
    fs::write(&broken_json, "{").unwrap();
    assert!(matches!(
        EngineConfig::load(&broken_json),
        Err(ConfigError::Json(_))
    ));

    let invalid = dir.path().join("invalid.ron");
    fs::write(&invalid, "(bars: 0)").unwrap();
    let err = EngineConfig::load(&invalid).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("bars"));
}
