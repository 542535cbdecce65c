//! Centralized path management for the dict CLI

use std::path::{Path, PathBuf};

/// The name of the application configuration directory used across all platforms
const APP_DIR: &str = "dict";

/// The name of the configuration file
const CONFIG_FILE: &str = "config.toml";

/// Returns the configuration directory
///
/// `XDG_CONFIG_HOME` wins on Unix-like systems, then the platform config
/// directory (`~/.config/dict`, `~/Library/Application Support/dict`,
/// `%APPDATA%\dict`). Falls back to `.dict` in the current directory.
pub fn get_config_dir() -> PathBuf {
    #[cfg(not(target_os = "windows"))]
    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return config_dir_under(Path::new(&xdg_config));
    }

    dirs::config_dir()
        .map(|d| config_dir_under(&d))
        .unwrap_or_else(|| PathBuf::from(".dict"))
}

/// Returns the path to the configuration file
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}

fn config_dir_under(base: &Path) -> PathBuf {
    base.join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_in_config_dir() {
        let config_path = get_config_path();
        let config_dir = get_config_dir();

        assert!(
            config_path.starts_with(&config_dir),
            "Config path {} should be under config dir {}",
            config_path.display(),
            config_dir.display()
        );
    }

    #[test]
    fn test_config_file_name() {
        assert_eq!(
            get_config_path().file_name().and_then(|n| n.to_str()),
            Some(CONFIG_FILE)
        );
    }

    #[test]
    fn test_config_dir_uses_app_name() {
        let dir = config_dir_under(Path::new("/tmp/xdg"));
        assert_eq!(dir, PathBuf::from("/tmp/xdg/dict"));
    }
}
