use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const APP_DIR: &str = "crm-relay";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub ui_base_url: String,
    pub workspace_key: String,
    pub workspace_secret: String,
    pub token_algorithm: String,
    pub token_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub user_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.integration.app".to_string(),
            ui_base_url: "https://ui.integration.app".to_string(),
            workspace_key: String::new(),
            workspace_secret: String::new(),
            token_algorithm: "ES256".to_string(),
            token_ttl_secs: 2 * 60 * 60,
            request_timeout_secs: 60,
            user_name: "CRM demo user".to_string(),
        }
    }
}

impl AppConfig {
    /// `<platform config dir>/crm-relay/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from `path`, writing defaults if the file does not exist yet.
    ///
    /// A malformed file falls back to defaults. Workspace credentials are
    /// then taken from the environment when set.
    pub fn load(path: &Path) -> Self {
        let mut config = if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }),
                Err(e) => {
                    log::warn!("Could not read config {}: {}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            let c = Self::default();
            if let Err(e) = c.save(path) {
                log::warn!("Could not write default config to {}: {}", path.display(), e);
            }
            c
        };

        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override fields from environment variables; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(key) = set("INT_APP_WORKSPACE_KEY") {
            self.workspace_key = key;
        }
        if let Some(secret) = set("INT_APP_WORKSPACE_SECRET") {
            self.workspace_secret = secret;
        }
        if let Some(url) = set("INT_APP_API_URL") {
            self.api_base_url = url;
        }
    }
}
