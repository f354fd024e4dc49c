use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default endpoint of the weather service.
pub const DEFAULT_API_BASE: &str = "https://api.caiyunapp.com/";

/// Default language for place search results.
pub const DEFAULT_LANG: &str = "zh_CN";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// token = "..."
/// lang = "en_US"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// API token issued by the weather service.
    pub token: Option<String>,

    /// Override for the service base URL, mostly useful for testing.
    pub api_base: Option<String>,

    pub lang: Option<String>,
}

impl Config {
    /// Return the configured token, or a hint on how to set it.
    pub fn token(&self) -> Result<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API token configured.\n\
                 Hint: run `sunny configure` and enter your token."
            )
        })
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token.trim().to_string());
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or(DEFAULT_LANG)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding local state such as the saved place.
    pub fn data_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "sunnyweather", "sunny-weather")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
