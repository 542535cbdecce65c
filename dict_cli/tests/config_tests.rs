//! Configuration file handling through `ConfigManager`

use dict_cli::config::ConfigManager;
use std::fs;
use tempfile::TempDir;

fn create_test_config_manager(temp_dir: &TempDir) -> ConfigManager {
    ConfigManager::with_path(temp_dir.path().join("config.toml"))
}

#[test]
fn test_set_host_persists() {
    let temp_dir = TempDir::new().unwrap();
    let mut config_manager = create_test_config_manager(&temp_dir);

    config_manager.set("server.host", "dict.example.org").unwrap();

    assert!(temp_dir.path().join("config.toml").exists());
    assert_eq!(config_manager.get("server.host").unwrap(), "dict.example.org");
}

#[test]
fn test_numeric_looking_strategy_stays_a_string() {
    let temp_dir = TempDir::new().unwrap();
    let mut config_manager = create_test_config_manager(&temp_dir);

    config_manager.set("server.strategy", "1").unwrap();

    let content = fs::read_to_string(temp_dir.path().join("config.toml")).unwrap();
    assert!(content.contains("strategy = \"1\""));
    assert_eq!(config_manager.load().unwrap().server.strategy, "1");
}

#[test]
fn test_port_and_timeouts_are_integers() {
    let temp_dir = TempDir::new().unwrap();
    let mut config_manager = create_test_config_manager(&temp_dir);

    config_manager.set("server.port", "2629").unwrap();
    config_manager
        .set("network.read_timeout_seconds", "0")
        .unwrap();

    let config = config_manager.load().unwrap();
    assert_eq!(config.server.port, 2629);
    assert_eq!(config.network.read_timeout_seconds, 0);
    assert!(config.session_config().transport.read_timeout.is_none());
}

#[test]
fn test_invalid_values_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut config_manager = create_test_config_manager(&temp_dir);

    assert!(config_manager.set("server.port", "70000").is_err());
    assert!(config_manager.set("server.host", "  ").is_err());
    assert!(config_manager.set("output.default_format", "csv").is_err());
    assert!(config_manager.set("output.color_enabled", "maybe").is_err());
    assert!(!temp_dir.path().join("config.toml").exists());
}

#[test]
fn test_set_preserves_other_sections() {
    let temp_dir = TempDir::new().unwrap();
    let mut config_manager = create_test_config_manager(&temp_dir);

    config_manager.set("server.host", "localhost").unwrap();
    config_manager.set("output.default_format", "json").unwrap();

    let config = config_manager.load().unwrap();
    assert_eq!(config.server.host, "localhost");
    assert_eq!(config.output.default_format, "json");
}

#[test]
fn test_existing_file_is_merged_over_defaults() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("config.toml"),
        "[server]\nhost = \"localhost\"\n",
    )
    .unwrap();
    let config_manager = create_test_config_manager(&temp_dir);

    let config = config_manager.load().unwrap();

    assert_eq!(config.server.host, "localhost");
    assert_eq!(config.server.port, 2628);
    assert_eq!(config.server.database, "*");
}

#[test]
fn test_missing_key() {
    let temp_dir = TempDir::new().unwrap();
    let config_manager = create_test_config_manager(&temp_dir);

    assert!(config_manager.get("server.nonexistent").is_err());
}
