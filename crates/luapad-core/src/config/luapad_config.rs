use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{
    paths::ProjectPaths, runtime_config::RuntimeConfig, surface_config::SurfaceConfig,
    surface_config::TextureConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not determine the config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a log file under the data directory (default: true)
    #[serde(default = "default_true")]
    pub file: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { file: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LuapadConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub surface: SurfaceConfig,

    /// Textures `loadImage` can resolve, keyed by path
    #[serde(default)]
    pub textures: BTreeMap<String, TextureConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LuapadConfig {
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        ProjectPaths::new("luapad")
            .map(|paths| paths.config_file())
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the platform config path, falling back to defaults when absent
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load_from(&Self::config_path()?) {
            Err(ConfigError::NotFound(path)) => {
                info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            result => result,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }
}
