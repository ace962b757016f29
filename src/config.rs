use crate::errors::{AppError, AppResult};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Environment variable overriding `api.base_url`
pub const API_BASE_URL_ENV: &str = "ENGAGE_API_BASE_URL";

const CONFIG_DIR: &str = ".engage";
const CONFIG_FILE: &str = "config.toml";

/// Keys accepted by `config get` / `config set`
pub const CONFIG_KEYS: [&str; 9] = [
    "api.base_url",
    "api.timeout_secs",
    "api.user_agent",
    "push.origin",
    "push.worker_script",
    "push.worker_scope",
    "storage.credentials_path",
    "logging.level",
    "logging.log_path",
];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level client configuration
///
/// Every section falls back to its defaults when missing from the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub push: PushConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: Some(30),
            user_agent: Some(concat!("engage-client/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

/// Where the push worker lives and which origin the page is served from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub origin: String,
    pub worker_script: String,
    pub worker_scope: String,
}

impl PushConfig {
    /// Origin the page is served from, as a URL
    pub fn origin_url(&self) -> AppResult<Url> {
        Ok(Url::parse(&self.origin)?)
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            worker_script: "/sw.js".to_string(),
            worker_scope: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Credentials file; the platform data directory when unset
    pub credentials_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files; console only when unset
    pub log_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_path: None,
        }
    }
}

impl Config {
    /// Read a value by dotted key
    pub fn get(&self, key: &str) -> AppResult<String> {
        let value = match key {
            "api.base_url" => self.api.base_url.clone(),
            "api.timeout_secs" => display_option(self.api.timeout_secs),
            "api.user_agent" => display_option(self.api.user_agent.as_ref()),
            "push.origin" => self.push.origin.clone(),
            "push.worker_script" => self.push.worker_script.clone(),
            "push.worker_scope" => self.push.worker_scope.clone(),
            "storage.credentials_path" => display_option(
                self.storage
                    .credentials_path
                    .as_ref()
                    .map(|p| p.display().to_string()),
            ),
            "logging.level" => self.logging.level.clone(),
            "logging.log_path" => display_option(self.logging.log_path.as_ref()),
            _ => return Err(AppError::UnknownConfigKey { key: key.to_string() }),
        };
        Ok(value)
    }

    /// Update a value by dotted key; an empty value clears optional settings
    pub fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        match key {
            "api.base_url" => {
                validate_url(key, value)?;
                self.api.base_url = value.to_string();
            }
            "api.timeout_secs" => {
                self.api.timeout_secs = if value.is_empty() {
                    None
                } else {
                    let secs: u64 = value.parse().map_err(|e| AppError::InvalidConfigValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        source: Some(Box::new(e)),
                    })?;
                    Some(secs)
                };
            }
            "api.user_agent" => self.api.user_agent = non_empty(value),
            "push.origin" => {
                validate_url(key, value)?;
                self.push.origin = value.to_string();
            }
            "push.worker_script" => self.push.worker_script = require_path(key, value)?,
            "push.worker_scope" => self.push.worker_scope = require_path(key, value)?,
            "storage.credentials_path" => {
                self.storage.credentials_path = non_empty(value).map(PathBuf::from)
            }
            "logging.level" => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(AppError::invalid_value(key, value));
                }
                self.logging.level = level;
            }
            "logging.log_path" => self.logging.log_path = non_empty(value),
            _ => return Err(AppError::UnknownConfigKey { key: key.to_string() }),
        }
        Ok(())
    }

    /// Apply `ENGAGE_API_BASE_URL` when set
    pub fn apply_env_overrides(&mut self) {
        self.apply_base_url_override(std::env::var(API_BASE_URL_ENV).ok());
    }

    fn apply_base_url_override(&mut self, base_url: Option<String>) {
        if let Some(base_url) = base_url.filter(|v| !v.trim().is_empty()) {
            debug!("API base URL overridden by {}: {}", API_BASE_URL_ENV, base_url);
            self.api.base_url = base_url;
        }
    }
}

fn display_option<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn validate_url(key: &str, value: &str) -> AppResult<()> {
    Url::parse(value).map_err(|e| AppError::InvalidConfigValue {
        key: key.to_string(),
        value: value.to_string(),
        source: Some(Box::new(e)),
    })?;
    Ok(())
}

fn require_path(key: &str, value: &str) -> AppResult<String> {
    if value.starts_with('/') {
        Ok(value.to_string())
    } else {
        Err(AppError::invalid_value(key, value))
    }
}

/// Loads and persists `config.toml`
///
/// # Configuration Hierarchy
///
/// 1. **Project-level**: `.engage/config.toml` in the project root
/// 2. **Global**: `~/.engage/config.toml` in the user home directory
///
/// A project without its own file uses the global one when present.
///
/// # Example
///
/// ```rust,no_run
/// use engage_client::config::ConfigManager;
/// use std::path::PathBuf;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = ConfigManager::new(Some(PathBuf::from("/path/to/project")))?;
///     println!("API: {}", manager.config().api.base_url);
///     Ok(())
/// }
/// ```
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Resolve project config, then global config, creating the project one when neither exists
    pub fn new(project_path: Option<PathBuf>) -> AppResult<Self> {
        let config_path = match project_path {
            Some(path) => {
                let project_config_path = Self::get_config_path(Some(path))?;
                let global_config_path = Self::get_config_path(None)?;
                if !project_config_path.exists() && global_config_path.exists() {
                    global_config_path
                } else {
                    project_config_path
                }
            }
            None => Self::get_config_path(None)?,
        };

        let config = Self::load_or_create(&config_path)?;
        Ok(ConfigManager {
            config_path,
            config,
        })
    }

    /// Always use the project-level file, even when a global one exists
    pub fn new_project_config(project_path: PathBuf) -> AppResult<Self> {
        let config_path = Self::get_config_path(Some(project_path))?;
        let config = Self::load_or_create(&config_path)?;

        Ok(ConfigManager {
            config_path,
            config,
        })
    }

    pub fn get_config_path(project_path: Option<PathBuf>) -> AppResult<PathBuf> {
        let base_path = if let Some(path) = project_path {
            path.join(CONFIG_DIR)
        } else {
            let base_dirs =
                BaseDirs::new().ok_or_else(|| AppError::config("Failed to get base directories"))?;
            base_dirs.home_dir().join(CONFIG_DIR)
        };

        fs::create_dir_all(&base_path)
            .map_err(|e| AppError::io_with_source(&base_path, "create config directory", e))?;

        Ok(base_path.join(CONFIG_FILE))
    }

    fn load_or_create(path: &Path) -> AppResult<Config> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| AppError::io_with_source(path, "read config file", e))?;
            toml::from_str(&content)
                .map_err(|e| AppError::config_with_source("Failed to parse config file", e))
        } else {
            let config = Config::default();
            let content = toml::to_string_pretty(&config)
                .map_err(|e| AppError::config_with_source("Failed to serialize default config", e))?;
            fs::write(path, content)
                .map_err(|e| AppError::io_with_source(path, "write default config", e))?;
            debug!("Created default configuration at {:?}", path);
            Ok(config)
        }
    }

    /// Write the configuration back to the file it was loaded from
    pub fn save(&self) -> AppResult<()> {
        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| AppError::config_with_source("Failed to serialize config", e))?;
        fs::write(&self.config_path, content)
            .map_err(|e| AppError::io_with_source(&self.config_path, "write config file", e))?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Call [`save()`](Self::save) afterwards to persist changes
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Stored configuration with environment overrides applied; never saved
    pub fn effective_config(&self) -> Config {
        let mut config = self.config.clone();
        config.apply_env_overrides();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.push.worker_script, "/sw.js");
        assert_eq!(config.push.worker_scope, "/");
        assert_eq!(config.logging.level, "info");
        assert!(config.storage.credentials_path.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.com/api/v1"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com/api/v1");
        assert_eq!(config.api.timeout_secs, Some(30));
        assert_eq!(config.push, PushConfig::default());
    }

    #[test]
    fn test_get_and_set_keys() {
        let mut config = Config::default();
        for key in CONFIG_KEYS {
            assert!(config.get(key).is_ok(), "{} should be readable", key);
        }

        config.set("api.timeout_secs", "5").unwrap();
        assert_eq!(config.api.timeout_secs, Some(5));
        config.set("api.timeout_secs", "").unwrap();
        assert_eq!(config.get("api.timeout_secs").unwrap(), "None");

        config.set("logging.level", "DEBUG").unwrap();
        assert_eq!(config.logging.level, "debug");

        config.set("storage.credentials_path", "/tmp/creds.json").unwrap();
        assert_eq!(config.get("storage.credentials_path").unwrap(), "/tmp/creds.json");
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("api.base_url", "not a url"),
            Err(AppError::InvalidConfigValue { .. })
        ));
        assert!(config.set("api.timeout_secs", "soon").is_err());
        assert!(config.set("logging.level", "loud").is_err());
        assert!(config.set("push.worker_script", "sw.js").is_err());
        assert!(matches!(
            config.set("smtp.host", "x"),
            Err(AppError::UnknownConfigKey { .. })
        ));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_base_url_override() {
        let mut config = Config::default();
        config.apply_base_url_override(Some("https://staging.example.com/api/v1".into()));
        assert_eq!(config.api.base_url, "https://staging.example.com/api/v1");

        config.apply_base_url_override(Some("  ".into()));
        assert_eq!(config.api.base_url, "https://staging.example.com/api/v1");
    }

    #[test]
    fn test_project_config_created_and_saved() {
        let dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new_project_config(dir.path().to_path_buf()).unwrap();
        let path = dir.path().join(".engage").join("config.toml");
        assert_eq!(manager.config_path(), path.as_path());
        assert!(path.exists());

        manager
            .config_mut()
            .set("api.base_url", "https://api.example.com")
            .unwrap();
        manager.save().unwrap();

        let reloaded = ConfigManager::new_project_config(dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.config().api.base_url, "https://api.example.com");
    }

    #[test]
    fn test_corrupt_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = ConfigManager::get_config_path(Some(dir.path().to_path_buf())).unwrap();
        fs::write(&path, "[api\nbase_url = ").unwrap();

        let result = ConfigManager::new_project_config(dir.path().to_path_buf());
        assert!(matches!(result, Err(AppError::Config { .. })));
    }
}
