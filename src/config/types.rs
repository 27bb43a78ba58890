//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Engine settings that drive pattern scaling and recentring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// In-game sensitivity (> 0). Patterns are authored at 2.0.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,

    /// Display width in pixels (> 0)
    #[serde(default = "default_resolution_width")]
    pub resolution_width: u32,

    /// Display height in pixels (> 0)
    #[serde(default = "default_resolution_height")]
    pub resolution_height: u32,

    /// Display aspect ratio as width / height (> 0)
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f32,

    /// Ease the pointer back toward its starting point after a stop
    #[serde(default = "default_true")]
    pub return_to_original: bool,
}

fn default_sensitivity() -> f32 {
    2.0
}

fn default_resolution_width() -> u32 {
    1920
}

fn default_resolution_height() -> u32 {
    1080
}

fn default_aspect_ratio() -> f32 {
    16.0 / 9.0
}

fn default_true() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            resolution_width: default_resolution_width(),
            resolution_height: default_resolution_height(),
            aspect_ratio: default_aspect_ratio(),
            return_to_original: default_true(),
        }
    }
}

/// Pattern storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternsConfig {
    /// Directory holding one JSON record per pattern
    #[serde(default = "default_pattern_directory")]
    pub directory: PathBuf,
}

fn default_pattern_directory() -> PathBuf {
    PathBuf::from("data/patterns")
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            directory: default_pattern_directory(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write logs to this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_file: None,
        }
    }
}

/// Hotkey bindings: key name -> pattern name
///
/// Stored as a TOML table under `[hotkeys]`, e.g. `F1 = "ak47"`.
pub type HotkeyConfig = BTreeMap<String, String>;
