//! Hotkey Bindings
//!
//! Maps key names to pattern names and turns a key press into an engine
//! action. The registry is an ordinary value owned by whoever wires the
//! application together; nothing here is global.
//!
//! A press of a bound key toggles playback:
//!
//! ```text
//! unbound key     -> nothing
//! engine active   -> stop
//! engine idle     -> load the bound pattern, then start
//! ```
//!
//! Key names are compared case-insensitively with surrounding whitespace
//! ignored, so `"f1"`, `" F1 "` and `"F1"` are the same key. Reading keys
//! from the operating system is left to the caller.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::HotkeyConfig;
use crate::pattern::PatternRecord;
use crate::playback::{EngineError, PlaybackEngine, PlaybackReport};

/// What a key press did
#[derive(Debug)]
pub enum HotkeyAction {
    /// Playback of the named pattern started
    Started(String),
    /// An active run was stopped
    Stopped(Option<PlaybackReport>),
    /// The key has no binding; playback was left alone
    Unbound,
    /// Loading or starting the bound pattern failed
    Failed(EngineError),
}

/// Key name to pattern name bindings
#[derive(Debug, Default)]
pub struct HotkeyRegistry {
    bindings: RwLock<BTreeMap<String, String>>,
}

impl HotkeyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[hotkeys]` config table
    pub fn from_config(config: &HotkeyConfig) -> Self {
        let registry = Self::new();
        for (key, pattern) in config {
            registry.bind(key, pattern);
        }
        registry
    }

    /// Bind pattern defaults for keys that are not bound yet
    ///
    /// Returns how many bindings were added.
    pub fn register_defaults<'a>(
        &self,
        records: impl IntoIterator<Item = &'a PatternRecord>,
    ) -> usize {
        let mut bindings = self.bindings.write();
        let mut added = 0;

        for record in records {
            let Some(key) = record.default_hotkey.as_deref().map(normalize_key) else {
                continue;
            };
            if key.is_empty() || bindings.contains_key(&key) {
                continue;
            }
            debug!("Default hotkey {} -> {}", key, record.name);
            bindings.insert(key, record.name.clone());
            added += 1;
        }

        added
    }

    /// Bind a key, returning the pattern it was bound to before
    pub fn bind(&self, key: &str, pattern: impl Into<String>) -> Option<String> {
        let key = normalize_key(key);
        let pattern = pattern.into();
        debug!("Hotkey {} -> {}", key, pattern);
        self.bindings.write().insert(key, pattern)
    }

    /// Remove a binding
    pub fn unbind(&self, key: &str) -> Option<String> {
        self.bindings.write().remove(&normalize_key(key))
    }

    /// Pattern bound to a key
    pub fn binding(&self, key: &str) -> Option<String> {
        self.bindings.read().get(&normalize_key(key)).cloned()
    }

    /// All bindings, sorted by key
    pub fn bindings(&self) -> Vec<(String, String)> {
        self.bindings
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    /// Whether there are no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    /// Handle a key press
    pub async fn trigger(&self, key: &str, engine: &PlaybackEngine) -> HotkeyAction {
        let Some(pattern) = self.binding(key) else {
            debug!("Hotkey {} is not bound", key.trim());
            return HotkeyAction::Unbound;
        };

        if engine.is_active() {
            info!("Hotkey {}: stopping playback", key.trim());
            return HotkeyAction::Stopped(engine.stop().await);
        }

        let result = engine
            .try_load_pattern(&pattern)
            .and_then(|_| engine.try_start());

        match result {
            Ok(()) => {
                info!("Hotkey {}: playing {}", key.trim(), pattern);
                HotkeyAction::Started(pattern)
            }
            Err(e) => {
                warn!("Hotkey {}: cannot play {}: {}", key.trim(), pattern, e);
                HotkeyAction::Failed(e)
            }
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_uppercase()
}
