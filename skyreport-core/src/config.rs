use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::{Path, PathBuf}, time::Duration};

use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/";
pub const DEFAULT_LOCATION: &str = "iceland";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable that takes precedence over `api_key` in the file.
pub const API_KEY_ENV: &str = "SKYREPORT_API_KEY";

/// Settings stored on disk. Every field is optional in the file.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_location = "Reykjavik"
/// timeout_secs = 5
/// color = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the data endpoints; mode paths are joined onto it.
    pub base_url: String,
    /// Appended as `appid` when present.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub default_location: String,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_location: DEFAULT_LOCATION.to_string(),
            color: true,
        }
    }
}

impl Config {
    /// Load config from the platform config dir, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skyreport", "skyreport")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment if set, otherwise from the file.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with_override(env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_override(&self, from_env: Option<String>) -> Option<String> {
        from_env
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.is_empty()))
    }

    /// Parsed base url, with a trailing slash so endpoint paths join below it.
    pub fn base_url(&self) -> Result<Url, Error> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        Url::parse(&raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
