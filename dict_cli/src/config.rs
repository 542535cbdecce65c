use crate::paths;
use anyhow::{Context, Result};
use dict_client_core::protocol::{
    ANY_DATABASE, DEFAULT_CLIENT_NAME, DEFAULT_PORT, DEFAULT_SERVER, DEFAULT_STRATEGY,
};
use dict_client_core::{RetryPolicy, SessionConfig, TransportConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub client_name: String,
    /// Strategy used by `match` when `--strategy` is not given
    pub strategy: String,
    /// Database used when `--database` is not given
    pub database: String,
}

/// Socket deadlines in seconds; 0 disables a deadline
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NetworkConfig {
    pub connect_timeout_seconds: u64,
    pub read_timeout_seconds: u64,
    pub write_timeout_seconds: u64,
    pub max_reconnects: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub default_format: String,
    pub color_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            strategy: DEFAULT_STRATEGY.to_string(),
            database: ANY_DATABASE.to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: 10,
            read_timeout_seconds: 30,
            write_timeout_seconds: 10,
            max_reconnects: RetryPolicy::default().max_reconnects,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "text".to_string(),
            color_enabled: true,
        }
    }
}

impl AppConfig {
    /// Apply CLI argument overrides to the configuration
    pub fn apply_cli_overrides(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
    }

    /// Session settings for the configured server
    pub fn session_config(&self) -> SessionConfig {
        let seconds = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        SessionConfig::new(self.server.host.clone(), self.server.port)
            .with_client_name(self.server.client_name.clone())
            .with_strategy(self.server.strategy.clone())
            .with_transport(TransportConfig {
                connect_timeout: seconds(self.network.connect_timeout_seconds),
                read_timeout: seconds(self.network.read_timeout_seconds),
                write_timeout: seconds(self.network.write_timeout_seconds),
            })
            .with_retry(RetryPolicy {
                max_reconnects: self.network.max_reconnects,
            })
    }
}

/// Configuration manager that handles XDG-compliant paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a new ConfigManager with default XDG-compliant paths
    pub fn new() -> Self {
        Self {
            config_path: paths::get_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    ///
    /// CLI flags are applied on top by the caller.
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new();

        // Layer 1: Defaults
        figment = figment.merge(Serialized::defaults(AppConfig::default()));

        // Layer 2: Config file (if exists)
        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        // Layer 3: Environment variables, e.g. DICT_SERVER__HOST
        figment = figment.merge(Env::prefixed("DICT_").split("__"));

        figment.extract().context("Failed to load configuration")
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let value = self.load_as_toml()?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Key '{}' not found", key))?;
                }
                _ => anyhow::bail!("Invalid key path: {}", key),
            }
        }

        match current {
            toml::Value::String(s) => Ok(s.clone()),
            toml::Value::Integer(i) => Ok(i.to_string()),
            toml::Value::Float(f) => Ok(f.to_string()),
            toml::Value::Boolean(b) => Ok(b.to_string()),
            _ => anyhow::bail!("Value at '{}' is not a simple type", key),
        }
    }

    /// Set a configuration value by key (dot notation) in the config file
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.validate_config_value(key, value)?;

        let mut config = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            toml::from_str(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, sections)) = parts.split_last() else {
            anyhow::bail!("Empty key");
        };

        let mut current = &mut config;
        for part in sections {
            let toml::Value::Table(table) = current else {
                anyhow::bail!("Invalid key path: expected table at '{}'", part);
            };
            if !table.contains_key(*part) {
                table.insert(part.to_string(), toml::Value::Table(toml::map::Map::new()));
            }
            current = table
                .get_mut(*part)
                .ok_or_else(|| anyhow::anyhow!("Invalid key path: {}", key))?;
        }
        let toml::Value::Table(table) = current else {
            anyhow::bail!("Cannot set value on non-table");
        };
        table.insert(last.to_string(), self.parse_config_value(key, value)?);

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(&self.config_path, toml_string)?;

        Ok(())
    }

    /// List all configuration values
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let value = self.load_as_toml()?;

        let mut items = Vec::new();
        Self::collect_values(&value, String::new(), &mut items);
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(items)
    }

    fn load_as_toml(&self) -> Result<toml::Value> {
        let config = self.load()?;
        let toml_string = toml::to_string(&config)?;
        Ok(toml::from_str(&toml_string)?)
    }

    /// Recursively collect all key-value pairs from TOML
    fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
        match value {
            toml::Value::Table(table) => {
                for (key, val) in table {
                    let new_prefix = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    Self::collect_values(val, new_prefix, items);
                }
            }
            toml::Value::String(s) => items.push((prefix, s.clone())),
            toml::Value::Integer(i) => items.push((prefix, i.to_string())),
            toml::Value::Float(f) => items.push((prefix, f.to_string())),
            toml::Value::Boolean(b) => items.push((prefix, b.to_string())),
            _ => {}
        }
    }

    /// Validate a configuration value
    fn validate_config_value(&self, key: &str, value: &str) -> Result<()> {
        match key {
            "server.host" | "server.strategy" | "server.database" => {
                if value.trim().is_empty() {
                    anyhow::bail!("{key} must not be empty");
                }
            }
            "server.port" => {
                let port: u16 = value
                    .parse()
                    .context("port must be an integer between 1 and 65535")?;
                if port == 0 {
                    anyhow::bail!("port must be greater than 0");
                }
            }
            "server.client_name" => {
                if value.contains(['\r', '\n']) {
                    anyhow::bail!("client_name must not contain line breaks");
                }
            }
            "network.connect_timeout_seconds"
            | "network.read_timeout_seconds"
            | "network.write_timeout_seconds" => {
                let _: u64 = value
                    .parse()
                    .context("timeouts must be a non-negative integer (0 disables)")?;
            }
            "network.max_reconnects" => {
                let _: u32 = value
                    .parse()
                    .context("max_reconnects must be a non-negative integer")?;
            }
            "output.color_enabled" => {
                let _: bool = value.parse().context("Value must be 'true' or 'false'")?;
            }
            "output.default_format" => {
                if !matches!(value, "text" | "json") {
                    anyhow::bail!("default_format must be 'text' or 'json'");
                }
            }
            _ => {} // No validation for unknown keys
        }
        Ok(())
    }

    /// Parse a value to the appropriate TOML type
    fn parse_config_value(&self, key: &str, value: &str) -> Result<toml::Value> {
        match key {
            k if k.ends_with("_seconds") || k.ends_with("_reconnects") || k.ends_with(".port") => {
                let num: i64 = value.parse().context("Expected integer value")?;
                Ok(toml::Value::Integer(num))
            }
            k if k.ends_with("_enabled") => {
                let bool_val: bool = value
                    .parse()
                    .context("Expected boolean value (true/false)")?;
                Ok(toml::Value::Boolean(bool_val))
            }
            // Free text that may look like a number
            k if k.starts_with("server.") => Ok(toml::Value::String(value.to_string())),
            _ => {
                if let Ok(b) = value.parse::<bool>() {
                    Ok(toml::Value::Boolean(b))
                } else if let Ok(i) = value.parse::<i64>() {
                    Ok(toml::Value::Integer(i))
                } else if let Ok(f) = value.parse::<f64>() {
                    Ok(toml::Value::Float(f))
                } else {
                    Ok(toml::Value::String(value.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (TempDir, ConfigManager) {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("dict/config.toml"));
        (dir, manager)
    }

    #[test]
    fn test_defaults_without_file() {
        let (_dir, manager) = manager();
        let config = manager.load().unwrap();

        assert_eq!(config.server.port, 2628);
        assert_eq!(config.server.strategy, "prefix");
        assert_eq!(config.server.database, "*");
        assert_eq!(config.network.max_reconnects, 1);
        assert_eq!(config.output.default_format, "text");
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, mut manager) = manager();

        manager.set("server.host", "localhost").unwrap();
        manager.set("server.port", "2629").unwrap();
        manager.set("network.read_timeout_seconds", "0").unwrap();

        assert!(manager.get_config_path().exists());
        assert_eq!(manager.get("server.host").unwrap(), "localhost");
        assert_eq!(manager.get("server.port").unwrap(), "2629");

        let config = manager.load().unwrap();
        let session = config.session_config();
        assert_eq!(session.host, "localhost");
        assert_eq!(session.port, 2629);
        assert_eq!(session.transport.read_timeout, None);
        assert_eq!(session.transport.connect_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_numeric_looking_strings_stay_strings() {
        let (_dir, mut manager) = manager();
        manager.set("server.client_name", "1984").unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.server.client_name, "1984");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let (_dir, mut manager) = manager();

        assert!(manager.set("server.port", "0").is_err());
        assert!(manager.set("server.port", "70000").is_err());
        assert!(manager.set("server.host", "  ").is_err());
        assert!(manager.set("output.default_format", "csv").is_err());
        assert!(manager.set("output.color_enabled", "maybe").is_err());
        assert!(!manager.get_config_path().exists());
    }

    #[test]
    fn test_get_unknown_key() {
        let (_dir, manager) = manager();
        assert!(manager.get("server.nope").is_err());
        assert!(manager.get("server.port.deeper").is_err());
    }

    #[test]
    fn test_list_contains_all_sections() {
        let (_dir, manager) = manager();
        let items = manager.list().unwrap();

        let keys: Vec<&str> = items.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"server.host"));
        assert!(keys.contains(&"network.max_reconnects"));
        assert!(keys.contains(&"output.color_enabled"));

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        config.apply_cli_overrides(Some("127.0.0.1".to_string()), None);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 2628);
    }
}
