//! Configuration management
//!
//! Handles loading, validation, saving, and merging of configuration from:
//! - TOML files
//! - CLI arguments

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod types;

pub use types::{EngineSettings, HotkeyConfig, LoggingConfig, PatternsConfig};

/// File name used under the platform config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings
    #[serde(default)]
    pub engine: EngineSettings,
    /// Pattern storage
    #[serde(default)]
    pub patterns: PatternsConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Hotkey bindings (key name -> pattern name)
    #[serde(default)]
    pub hotkeys: HotkeyConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    ///
    /// Baseline settings: sensitivity 2.0, 1920x1080, 16:9, return to
    /// original enabled, patterns under `data/patterns`.
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Default config file location (`<config dir>/recoil-playback/config.toml`)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(env!("CARGO_PKG_NAME"))
            .join(CONFIG_FILE_NAME)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_engine_settings(&self.engine)?;

        if self.patterns.directory.as_os_str().is_empty() {
            anyhow::bail!("Invalid config: pattern directory is empty");
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        for (key, pattern) in &self.hotkeys {
            if key.trim().is_empty() || pattern.trim().is_empty() {
                anyhow::bail!("Invalid hotkey binding: {:?} = {:?}", key, pattern);
            }
        }

        Ok(())
    }

    /// Write configuration as pretty TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context(format!(
                    "Failed to create config directory: {}",
                    parent.display()
                ))?;
            }
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(
        mut self,
        patterns_dir: Option<PathBuf>,
        sensitivity: Option<f32>,
        no_return: bool,
    ) -> Self {
        if let Some(dir) = patterns_dir {
            self.patterns.directory = dir;
        }
        if let Some(sensitivity) = sensitivity {
            self.engine.sensitivity = sensitivity;
        }
        if no_return {
            self.engine.return_to_original = false;
        }

        self
    }
}

/// Check that every engine setting is in range
pub fn validate_engine_settings(settings: &EngineSettings) -> Result<()> {
    if !(settings.sensitivity.is_finite() && settings.sensitivity > 0.0) {
        anyhow::bail!(
            "Invalid sensitivity: {} (must be > 0)",
            settings.sensitivity
        );
    }

    if settings.resolution_width == 0 || settings.resolution_height == 0 {
        anyhow::bail!(
            "Invalid resolution: {}x{} (both must be > 0)",
            settings.resolution_width,
            settings.resolution_height
        );
    }

    if !(settings.aspect_ratio.is_finite() && settings.aspect_ratio > 0.0) {
        anyhow::bail!(
            "Invalid aspect ratio: {} (must be > 0)",
            settings.aspect_ratio
        );
    }

    Ok(())
}
