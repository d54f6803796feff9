use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the StudyBuddy backend
    pub server_url: String,

    /// Show chunk panels expanded on startup
    pub expand_chunks: bool,

    /// Level filter for the session log file (e.g. "info", "debug")
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_url: "http://localhost:8000/".to_string(),
            expand_chunks: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Directory holding the config file and session logs (`~/.studybuddy`).
    pub fn state_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".studybuddy"))
    }

    /// Load configuration from `~/.studybuddy/config.toml`, writing the
    /// defaults there on first run.
    pub fn load() -> Result<Self> {
        let state_dir = Self::state_dir()?;
        fs::create_dir_all(&state_dir)
            .context("Failed to create .studybuddy directory")?;
        Self::load_from(&state_dir.join("config.toml"))
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Apply a CLI `--server` override, when one was given.
    pub fn with_server(mut self, server: Option<String>) -> Self {
        if let Some(server) = server {
            self.server_url = server;
        }
        self
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(path, content)
            .context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.server_url = "http://10.0.0.7:8000/".to_string();
        config.expand_chunks = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server_url, "http://10.0.0.7:8000/");
        assert!(loaded.expand_chunks);
        assert_eq!(loaded.log_level, "info");
    }

    #[test]
    fn cli_server_flag_wins_over_the_file() {
        let config = Config::default().with_server(Some("http://backend:8000/".to_string()));
        assert_eq!(config.server_url, "http://backend:8000/");

        let config = Config::default().with_server(None);
        assert_eq!(config.server_url, "http://localhost:8000/");
    }

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server_url, "http://localhost:8000/");
        assert!(path.exists(), "first load should persist the defaults");
    }
}
