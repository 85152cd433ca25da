//! Integration tests for confluence-config.
//!
//! File round trips through a temporary directory and applying a loaded
//! configuration to a live graph.

use confluence_config::{ConfigError, EngineConfig, ValidationWarning, validate};
use confluence_core::AudioGraph;
use tempfile::TempDir;

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    let config = EngineConfig {
        log_filter: Some("confluence_core=debug".into()),
        ..EngineConfig::default().with_block_size(128).with_sample_rate(44_100)
    };

    config.save(&path).unwrap();
    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("config.toml");
    EngineConfig::default().save(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_load_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "settings = [1, 2").unwrap();
    assert!(matches!(
        EngineConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn test_loaded_settings_drive_a_graph() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "[settings]\nblock_size = 32\nsample_rate = 96000\n").unwrap();

    let settings = EngineConfig::load(&path).unwrap().to_settings().unwrap();
    let graph = AudioGraph::new(settings);
    let src = graph.create_system_source(None).unwrap();
    assert_eq!(src.port().len(), 32);
    assert_eq!(graph.settings().sample_rate(), 96_000);
}

#[test]
fn test_validation_of_loaded_file() {
    let config = EngineConfig::from_toml("[settings]\nblock_size = 300\nsample_rate = 47000\n")
        .unwrap();
    let report = validate(&config);
    assert_eq!(
        report.warnings(),
        &[
            ValidationWarning::BlockSizeNotPowerOfTwo(300),
            ValidationWarning::UnusualSampleRate(47_000),
        ]
    );
    // Still usable.
    assert!(config.to_settings().is_ok());
}
