use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keymap::KeyBinding;
use crate::link_ui::Placement;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub link_panel: LinkPanelConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkPanelConfig {
    /// Opens the panel from anywhere in the document.
    pub keystroke: KeyBinding,
    /// Panel width in cells, borders included.
    pub width: u16,
    pub placement: Placement,
}

impl Default for LinkPanelConfig {
    fn default() -> Self {
        Self {
            keystroke: KeyBinding::default(),
            width: 48,
            placement: Placement::Below,
        }
    }
}

impl Config {
    /// `Ok(None)` when the file does not exist.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
            config_path: config_path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }

    /// Loads the user's config file, falling back to defaults when there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let Some(config_path) = Self::config_path() else {
            return Ok(Self::default());
        };
        Ok(Self::load_from_path(&config_path)?.unwrap_or_default())
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("link-panel").join("config.toml"))
    }
}
