//! Configuration management for the client
//!
//! Holds the backend location, the auth endpoint paths, storage key names
//! and the policy knobs for logout and refresh. Persisted as JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "WAVESS_BASE_URL";

/// Errors from loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config path")]
    NoConfigDir,

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize config: {0}")]
    Serde(#[from] serde_json::Error),
}

/// What `logout()` does besides clearing local state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogoutMode {
    /// Only clear stored credentials
    #[default]
    LocalOnly,
    /// Tell the server first (best effort), then clear
    NotifyServer,
}

/// How concurrent 401s share token refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshCoordination {
    /// Every failed request runs its own refresh
    #[default]
    Independent,
    /// One refresh at a time; waiters reuse a token rotated while they waited
    SingleFlight,
}

/// Durable storage key names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    pub access_token: String,
    pub refresh_token: String,
    pub user_info: String,
    pub preferences: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access_token: "adminToken".to_string(),
            refresh_token: "adminRefreshToken".to_string(),
            user_info: "adminInfo".to_string(),
            preferences: "preferences".to_string(),
        }
    }
}

impl StorageKeys {
    /// The three keys that make up a session
    pub fn auth_keys(&self) -> [&str; 3] {
        [&self.access_token, &self.user_info, &self.refresh_token]
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Scheme, host and port of the backend
    pub base_url: String,
    /// Prefix prepended to every API path
    pub api_prefix: String,
    /// Client-side request timeout in seconds
    pub timeout_secs: u64,
    /// Login endpoint, relative to `api_prefix`
    pub login_path: String,
    /// Token refresh endpoint, relative to `api_prefix`
    pub refresh_path: String,
    /// Server logout endpoint, relative to `api_prefix`
    pub logout_path: String,
    /// Further paths that must never trigger a refresh
    pub extra_exempt_paths: Vec<String>,
    /// Application route of the login screen
    pub login_route: String,
    /// Field of the login response `data` holding the user info
    pub user_field: String,
    pub logout_mode: LogoutMode,
    pub refresh_coordination: RefreshCoordination,
    /// Maximum number of entries kept in the request log
    pub request_log_capacity: usize,
    pub storage_keys: StorageKeys,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_prefix: "/api/v1".to_string(),
            timeout_secs: 30,
            login_path: "/admin/auth/login".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            logout_path: "/auth/logout".to_string(),
            extra_exempt_paths: vec!["/auth/login".to_string(), "/auth/register".to_string()],
            login_route: "/admin/login".to_string(),
            user_field: "admin".to_string(),
            logout_mode: LogoutMode::default(),
            refresh_coordination: RefreshCoordination::default(),
            request_log_capacity: 100,
            storage_keys: StorageKeys::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a default config pointing at `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns true if a 401 on `path` must be returned as-is
    ///
    /// Matches by substring so that absolute and prefixed forms of the
    /// same endpoint are both caught.
    pub fn is_exempt_path(&self, path: &str) -> bool {
        path.contains(&self.login_path)
            || path.contains(&self.refresh_path)
            || self
                .extra_exempt_paths
                .iter()
                .any(|p| !p.is_empty() && path.contains(p.as_str()))
    }

    /// Gets the config directory path (cross-platform)
    pub fn config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA")
                .ok()
                .map(|p| PathBuf::from(p).join("wavess-client"))
        }

        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|p| PathBuf::from(p).join("Library/Application Support/wavess-client"))
        }

        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| std::env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
                .map(|p| p.join("wavess-client"))
        }

        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }

    /// Gets the default config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    /// Loads configuration from the default location
    ///
    /// Missing or unreadable files yield the defaults. `WAVESS_BASE_URL`
    /// is applied on top either way.
    pub fn load() -> Self {
        let config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("Ignoring config at {:?}: {}", path, e);
                Self::default()
            }),
            _ => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Loads configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Saves configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Saves configuration to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub(crate) fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.request_log_capacity, 100);
        assert_eq!(config.logout_mode, LogoutMode::LocalOnly);
        assert_eq!(config.refresh_coordination, RefreshCoordination::Independent);
        assert_eq!(config.storage_keys.access_token, "adminToken");
    }

    #[test]
    fn test_exempt_paths() {
        let config = ClientConfig::default();
        assert!(config.is_exempt_path("/admin/auth/login"));
        assert!(config.is_exempt_path("/api/v1/auth/refresh"));
        assert!(config.is_exempt_path("/api/v1/auth/register"));
        assert!(!config.is_exempt_path("/admin/users"));
        assert!(!config.is_exempt_path("/monitor/stats"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "https://wavess.example", "logout_mode": "notify_server"}"#)
                .unwrap();
        assert_eq!(config.base_url, "https://wavess.example");
        assert_eq!(config.logout_mode, LogoutMode::NotifyServer);
        assert_eq!(config.refresh_path, "/auth/refresh");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = ClientConfig::with_base_url("https://api.wavess.test");
        config.refresh_coordination = RefreshCoordination::SingleFlight;
        config.timeout_secs = 5;
        config.save_to(&path).unwrap();

        let loaded = ClientConfig::load_from(&path).unwrap();
        assert_eq!(loaded.base_url, "https://api.wavess.test");
        assert_eq!(loaded.refresh_coordination, RefreshCoordination::SingleFlight);
        assert_eq!(loaded.timeout_secs, 5);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClientConfig::load_from(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
