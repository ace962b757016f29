//! CLI context: configuration, logging and the wired API stack

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

use crate::client::{build_api_client, ApiClient, LoginRedirect};
use crate::config::{Config, ConfigManager};
use crate::services::NotificationApi;
use crate::storage::{CredentialStore, FileStore};

/// Tells the user to sign in again when the session cannot be recovered
pub struct CliRedirect;

impl LoginRedirect for CliRedirect {
    fn redirect_to_login(&self, _login_path: &str) {
        eprintln!("Sessão expirada. Entre novamente com `engage login`.");
    }
}

#[derive(Clone)]
pub struct CliContext {
    pub project_path: Option<PathBuf>,
    pub verbose: bool,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    pub fn new(project_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let resolved_project_path = Self::resolve_project_path(project_path);
        let config_manager = Arc::new(ConfigManager::new(resolved_project_path.clone())?);

        Ok(Self {
            project_path: resolved_project_path,
            verbose,
            config_manager,
        })
    }

    /// Use the current directory when it carries `.engage/config.toml`
    fn resolve_project_path(project_path: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = project_path {
            return Some(path);
        }

        let current_dir = std::env::current_dir().ok()?;
        current_dir
            .join(".engage")
            .join("config.toml")
            .exists()
            .then_some(current_dir)
    }

    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        let guard = crate::logging::init_logging(&self.config_manager.config().logging, self.verbose)?;

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!("Project path: {:?}", self.project_path);
            tracing::debug!("Config path: {:?}", self.config_manager.config_path());
        }

        Ok(guard)
    }

    /// Stored configuration with environment overrides applied
    pub fn config(&self) -> Config {
        self.config_manager.effective_config()
    }

    pub fn credentials_path(&self) -> Result<PathBuf> {
        match &self.config_manager.config().storage.credentials_path {
            Some(path) => Ok(path.clone()),
            None => Ok(FileStore::default_path()?),
        }
    }

    pub fn credential_store(&self) -> Result<Arc<dyn CredentialStore>> {
        let path = self.credentials_path()?;
        let store = FileStore::open(&path)
            .with_context(|| format!("Failed to open credentials at {}", path.display()))?;
        Ok(Arc::new(store))
    }

    pub fn api_client(&self) -> Result<Arc<ApiClient>> {
        let config = self.config();
        let client = build_api_client(&config.api, self.credential_store()?, Arc::new(CliRedirect))?;
        Ok(client)
    }

    pub fn notification_api(&self) -> Result<NotificationApi> {
        Ok(NotificationApi::new(self.api_client()?))
    }
}
