//! narrate configuration management.

use crate::text::chunker::DEFAULT_MAX_CHARS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_RATE: &str = "+0%";
const DEFAULT_PITCH: &str = "+0Hz";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrateConfig {
    /// Default voice short name. None means the built-in default.
    #[serde(default)]
    pub voice: Option<String>,

    /// Default rate adjustment, e.g. "+10%"
    #[serde(default = "default_rate")]
    pub rate: String,

    /// Default pitch adjustment, e.g. "-2Hz"
    #[serde(default = "default_pitch")]
    pub pitch: String,

    /// Maximum characters per synthesis request
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Service region, e.g. "westeurope". None means environment or built-in.
    #[serde(default)]
    pub region: Option<String>,
}

fn default_rate() -> String {
    DEFAULT_RATE.to_string()
}

fn default_pitch() -> String {
    DEFAULT_PITCH.to_string()
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

impl Default for NarrateConfig {
    fn default() -> Self {
        Self {
            voice: None,
            rate: default_rate(),
            pitch: default_pitch(),
            max_chars: default_max_chars(),
            region: None,
        }
    }
}

impl NarrateConfig {
    /// Get the config file path: ~/.config/narrate/config.toml
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("narrate").join("config.toml"))
    }

    /// Load config from file, returning defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: NarrateConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
