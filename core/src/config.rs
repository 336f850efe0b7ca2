use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the slide generation service.
    pub server_url: String,
    pub username: Option<String>,
    /// Unset means wait for the service indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub export_dir: PathBuf,
    pub log_path: Option<PathBuf>,
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            username: None,
            request_timeout_secs: None,
            export_dir: PathBuf::from("."),
            log_path: None,
            history_limit: 200,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents).map_err(|source| ConfigError::TomlParse { source })
        } else {
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse { source })
        }
    }

    /// Files tried in order; the first one that exists wins.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".deckchat/config.toml"),
            PathBuf::from(".deckchat/config.json"),
        ];
        if let Some(dir) = user_config_dir() {
            paths.push(dir.join("config.toml"));
            paths.push(dir.join("config.json"));
        }
        paths
    }

    /// Defaults, then the first config file found, then environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::search_paths().into_iter().find(|p| p.exists()) {
            Some(path) => {
                tracing::debug!("Loaded configuration from {}", path.display());
                Self::load_from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay `DECKCHAT_*` variables; `lookup` abstracts the environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DECKCHAT_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(user) = lookup("DECKCHAT_USERNAME") {
            self.username = Some(user);
        }
        if let Some(secs) = lookup("DECKCHAT_TIMEOUT_SECS") {
            let parsed = secs.parse().map_err(|_| ConfigError::InvalidValue {
                field: "DECKCHAT_TIMEOUT_SECS".to_string(),
                value: secs.clone(),
            })?;
            self.request_timeout_secs = Some(parsed);
        }
        if let Some(dir) = lookup("DECKCHAT_EXPORT_DIR") {
            self.export_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("DECKCHAT_LOG_PATH") {
            self.log_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Where interactive mode writes its log.
    pub fn resolved_log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .or_else(|| user_config_dir().map(|dir| dir.join("deckchat.log")))
            .unwrap_or_else(|| PathBuf::from("deckchat.log"))
    }
}

pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("deckchat"))
}

/// Password for `/login`; never stored in a config file.
pub fn password_from_env() -> Option<String> {
    std::env::var("DECKCHAT_PASSWORD").ok().filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn toml_and_json_files_load() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("config.toml");
        std::fs::write(&toml_path, "server_url = \"http://slides.local\"\nhistory_limit = 5\n")
            .unwrap();
        let config = Config::load_from_file(&toml_path).unwrap();
        assert_eq!(config.server_url, "http://slides.local");
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.export_dir, PathBuf::from("."));

        let json_path = dir.path().join("config.json");
        std::fs::write(&json_path, r#"{"server_url": "http://slides.local", "history_limit": 5}"#)
            .unwrap();
        assert_eq!(Config::load_from_file(&json_path).unwrap(), config);
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("DECKCHAT_SERVER_URL", "http://other:8080"),
            ("DECKCHAT_TIMEOUT_SECS", "30"),
            ("DECKCHAT_USERNAME", "ada"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();

        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server_url, "http://other:8080");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.username.as_deref(), Some("ada"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "DECKCHAT_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn default_has_no_timeout() {
        assert_eq!(Config::default().request_timeout(), None);
    }
}
