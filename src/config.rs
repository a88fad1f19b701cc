//! Configuration for the taskdeck client

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Where the task REST API lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the task API (the client appends `/tasks`)
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
}

/// The hosted identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Provider endpoint URL
    #[serde(default = "default_identity_endpoint")]
    pub endpoint: String,

    /// App client id registered with the provider
    #[serde(default)]
    pub client_id: String,
}

fn default_api_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_identity_endpoint() -> String {
    "https://cognito-idp.us-east-1.amazonaws.com/".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            endpoint: default_identity_endpoint(),
            client_id: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

impl Config {
    /// Default config path
    pub fn default_path() -> Result<PathBuf> {
        // Check environment variable first
        if let Ok(env_path) = std::env::var("TASKDECK_CONFIG") {
            return Ok(PathBuf::from(env_path));
        }

        // Check for config in current directory
        let local = PathBuf::from("config.toml");
        if local.exists() {
            return Ok(local);
        }

        // Then check XDG config
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("taskdeck");

        Ok(config_dir.join("config.toml"))
    }

    /// Where sign-in tokens are cached between invocations
    pub fn session_cache_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("taskdeck");

        Ok(config_dir.join("session.toml"))
    }

    /// Load config from default path
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        // Add helpful comments
        let with_comments = format!(
            "# taskdeck configuration\n\n\
             {}\n\
             # identity.client_id is the app client registered with your identity provider.\n",
            content
        );

        std::fs::write(path, with_comments).context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.api.base_url = "https://api.example.com".to_string();
        cfg.identity.client_id = "client-123".to_string();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api.base_url, "https://api.example.com");
        assert_eq!(loaded.identity.client_id, "client-123");
        assert_eq!(loaded.identity.endpoint, default_identity_endpoint());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.api.base_url, default_api_base_url());
        assert!(cfg.identity.client_id.is_empty());
    }
}
