//! Configuration handling for the console

use crate::state::EntityKind;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the store location
pub const STORE_PATH_ENV: &str = "PLANNING_CONSOLE_STORE";

/// User configuration for the console
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConsoleConfig {
    /// Location of the JSON record store
    pub store_path: Option<String>,
    /// Session user name
    pub user: Option<String>,
    /// Entity list shown on startup
    pub start_view: Option<EntityKind>,
}

impl ConsoleConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("io", "planning", "planning-console")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: ConsoleConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Where the record store lives: env, then config, then the data dir
    pub fn resolve_store_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var(STORE_PATH_ENV) {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.store_path {
            return PathBuf::from(path);
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("store.json"))
            .unwrap_or_else(|| PathBuf::from("planning-console-store.json"))
    }

    pub fn start_view(&self) -> EntityKind {
        self.start_view.unwrap_or(EntityKind::Project)
    }
}
