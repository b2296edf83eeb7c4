use std::env;
use std::path::PathBuf;

pub const CONFIG_ENV: &str = "SCHEMANOTIFY_CONFIG";

/// Platform-specific path resolution for schemanotify.
pub struct Paths;

impl Paths {
    /// Returns the configuration directory path.
    /// - Linux: ~/.config/schemanotify/
    /// - macOS: ~/Library/Application Support/schemanotify/
    /// - Override: SCHEMANOTIFY_CONFIG env var (directory derived from file path)
    pub fn config_dir() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            return path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or(path);
        }

        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("schemanotify")
    }

    /// Returns the full config file path.
    pub fn config_file() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }
}
