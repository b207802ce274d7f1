//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend base URL, the identity provider, the OAuth redirect URL, where the
//! bearer token is stored, and the page redirect delays.
//!
//! Configuration is stored at `~/.config/sessiongate/config.json`. Environment
//! variables take precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "sessiongate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing else is configured (local development server).
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Where the identity provider sends the user agent after an OAuth round trip.
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:3000/auth/callback";

pub const ENV_API_URL: &str = "SESSIONGATE_API_URL";
pub const ENV_IDP_URL: &str = "SESSIONGATE_IDP_URL";
pub const ENV_IDP_ANON_KEY: &str = "SESSIONGATE_IDP_ANON_KEY";
pub const ENV_REDIRECT_URL: &str = "SESSIONGATE_REDIRECT_URL";

/// Which backend holds the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorageKind {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    pub url: String,
    pub anon_key: String,
}

/// Delays before a page navigates away on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectDelays {
    /// Protected page after the backend rejected the token.
    pub unauthorized_ms: u64,
    /// OAuth callback page after a failed completion.
    pub callback_failure_ms: u64,
    /// OAuth callback page after a successful completion.
    pub callback_success_ms: u64,
}

impl Default for RedirectDelays {
    fn default() -> Self {
        Self {
            unauthorized_ms: 2000,
            callback_failure_ms: 3000,
            callback_success_ms: 500,
        }
    }
}

impl RedirectDelays {
    pub fn unauthorized(&self) -> Duration {
        Duration::from_millis(self.unauthorized_ms)
    }

    pub fn callback_failure(&self) -> Duration {
        Duration::from_millis(self.callback_failure_ms)
    }

    pub fn callback_success(&self) -> Duration {
        Duration::from_millis(self.callback_success_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub identity_provider: Option<IdentityProviderConfig>,
    pub oauth_redirect_url: Option<String>,
    pub token_storage: TokenStorageKind,
    pub redirect_delays: RedirectDelays,
}

impl Config {
    /// Load the config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = Self::load_from(&path)?;
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(api_url) = non_empty(ENV_API_URL) {
            self.api_url = Some(api_url);
        }
        if let Some(redirect) = non_empty(ENV_REDIRECT_URL) {
            self.oauth_redirect_url = Some(redirect);
        }
        match (non_empty(ENV_IDP_URL), non_empty(ENV_IDP_ANON_KEY)) {
            (Some(url), Some(anon_key)) => {
                self.identity_provider = Some(IdentityProviderConfig { url, anon_key });
            }
            (Some(url), None) => {
                let anon_key = self
                    .identity_provider
                    .take()
                    .map(|idp| idp.anon_key)
                    .unwrap_or_default();
                self.identity_provider = Some(IdentityProviderConfig { url, anon_key });
            }
            (None, Some(anon_key)) => {
                if let Some(ref mut idp) = self.identity_provider {
                    idp.anon_key = anon_key;
                }
            }
            (None, None) => {}
        }
        self
    }

    /// Backend base URL, falling back to the local development server.
    pub fn api_base_url(&self) -> Result<Url> {
        let raw = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        Url::parse(raw).with_context(|| format!("Invalid backend URL: {}", raw))
    }

    pub fn oauth_redirect_url(&self) -> Result<Url> {
        let raw = self
            .oauth_redirect_url
            .as_deref()
            .unwrap_or(DEFAULT_REDIRECT_URL);
        Url::parse(raw).with_context(|| format!("Invalid OAuth redirect URL: {}", raw))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file-backed token slot.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
