use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_NAME: &str = "vpscope";
/// Floor for the poll period; tokio intervals reject a zero period.
const MIN_POLL_INTERVAL_MS: u64 = 100;
const MIN_RECONNECT_DELAY_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Client configuration. Every field may be omitted from the file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the dashboard backend
    pub server_url: String,
    /// Directory shown first
    pub start_path: String,
    pub poll_interval_ms: u64,
    /// Fixed delay between reconnect attempts of the push channels
    pub reconnect_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub file_updates_path: String,
    pub terminal_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_url: "http://127.0.0.1:8000".to_string(),
            start_path: "/".to_string(),
            poll_interval_ms: 2000,
            reconnect_delay_ms: 3000,
            request_timeout_secs: 10,
            file_updates_path: "/file_updates".to_string(),
            terminal_path: "/terminal".to_string(),
            download_dir: None,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `explicit` when given, else from the default location.
    /// A missing default file yields defaults; an explicit one must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.max(MIN_RECONNECT_DELAY_MS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Where downloads are saved: configured dir, else the user's download dir, else cwd.
    pub fn download_dir(&self) -> PathBuf {
        if let Some(dir) = &self.download_dir {
            return dir.clone();
        }
        directories::UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn log_file(&self) -> PathBuf {
        if let Some(file) = &self.log_file {
            return file.clone();
        }
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.data_dir().join("vpscope.log"))
            .unwrap_or_else(|| PathBuf::from("vpscope.log"))
    }

    /// Effective settings as TOML, with derived paths filled in.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let resolved = Config {
            download_dir: Some(self.download_dir()),
            log_file: Some(self.log_file()),
            ..self.clone()
        };
        toml::to_string_pretty(&resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_backend_conventions() {
        let config = Config::default();
        assert_eq!(config.server_url, "http://127.0.0.1:8000");
        assert_eq!(config.start_path, "/");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.file_updates_path, "/file_updates");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server_url = \"https://vps.example.com\"\npoll_interval_ms = 5000").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server_url, "https://vps.example.com");
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.terminal_path, "/terminal");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = \"fast\"").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("cannot parse"));
    }

    #[test]
    fn zero_poll_interval_is_floored() {
        let config = Config {
            poll_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(MIN_POLL_INTERVAL_MS));
    }

    #[test]
    fn zero_reconnect_delay_is_floored() {
        let config = Config {
            reconnect_delay_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.reconnect_delay(), Duration::from_millis(MIN_RECONNECT_DELAY_MS));
    }

    #[test]
    fn dumped_config_loads_back() {
        let config = Config {
            download_dir: Some(PathBuf::from("/tmp/dl")),
            ..Config::default()
        };
        let text = config.to_toml().unwrap();
        assert!(text.contains("log_file"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.download_dir, Some(PathBuf::from("/tmp/dl")));
        assert_eq!(parsed.server_url, config.server_url);
    }
}
