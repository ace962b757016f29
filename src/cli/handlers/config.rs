//! `init` and `config` commands

use anyhow::Result;
use std::path::PathBuf;

use super::super::{CliContext, ConfigAction};
use crate::config::{ConfigManager, API_BASE_URL_ENV, CONFIG_KEYS};

pub struct ConfigHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ConfigHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_init(&self, global: bool, force: bool) -> Result<()> {
        let path = if global {
            None
        } else {
            Some(
                self.context
                    .project_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(".")),
            )
        };

        let config_path = ConfigManager::get_config_path(path.clone())?;
        if config_path.exists() && !force {
            println!("Configuration already initialized at: {}", config_path.display());
            println!("Use --force to overwrite");
            return Ok(());
        }

        let mut manager = match path {
            Some(project) => ConfigManager::new_project_config(project)?,
            None => ConfigManager::new(None)?,
        };
        if force {
            *manager.config_mut() = Default::default();
        }
        manager.save()?;

        println!("Configuration initialized successfully at: {}", config_path.display());
        Ok(())
    }

    pub async fn handle_config(&self, action: ConfigAction) -> Result<()> {
        let mut manager = ConfigManager::new(self.context.project_path.clone())?;

        match action {
            ConfigAction::Show => {
                println!("# {}", manager.config_path().display());
                print!("{}", toml::to_string_pretty(manager.config())?);
                if let Ok(value) = std::env::var(API_BASE_URL_ENV) {
                    println!("# api.base_url overridden by {}={}", API_BASE_URL_ENV, value);
                }
            }
            ConfigAction::Get { key } => {
                println!("{}", manager.config().get(&key)?);
            }
            ConfigAction::Set { key, value } => {
                if let Err(e) = manager.config_mut().set(&key, &value) {
                    if matches!(e, crate::errors::AppError::UnknownConfigKey { .. }) {
                        eprintln!("Known keys: {}", CONFIG_KEYS.join(", "));
                    }
                    return Err(e.into());
                }
                manager.save()?;
                println!("Configuration updated: {key} = {value}");
            }
        }

        Ok(())
    }
}

super::traits::impl_context_handler!(ConfigHandler<'a>);
