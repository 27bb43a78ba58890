//! # recoil-playback
//!
//! Replays recorded mouse-movement ("recoil") patterns as timed relative
//! pointer moves, scaled to the player's sensitivity and display.
//!
//! # Architecture
//!
//! ```text
//! recoil-playback
//!   ├─> PatternStore        (named patterns: in memory or a JSON directory)
//!   ├─> ScalingTransform    (sensitivity / resolution / aspect ratio)
//!   ├─> PlaybackEngine      (load, start, stop, settings)
//!   │     ├─> PlaybackTask        (deadline-paced tokio task)
//!   │     └─> RecenterController  (partial return after stop)
//!   ├─> PointerSink         (recording, tracing, or enigo backend)
//!   └─> HotkeyRegistry      (key name -> pattern, toggle on press)
//! ```
//!
//! # Data Flow
//!
//! **Playback:** load → scale (snapshot at start) → task → PointerSink per point
//!
//! **Stop:** cancel → join → RecenterController → PointerSink → Idle

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration (TOML file, CLI overrides)
pub mod config;

/// Patterns, scaling, and pattern stores
pub mod pattern;

/// Pointer movement backends
pub mod pointer;

/// Playback engine, scheduler, and recentring
pub mod playback;

/// Hotkey bindings
pub mod hotkeys;

/// Utility functions
pub mod utils;

pub use config::{Config, EngineSettings};
pub use pattern::{Pattern, PatternPoint, PatternStore, ScalingFactors};
pub use playback::{EngineError, PlaybackEngine, PlaybackPhase, PlaybackReport};
pub use pointer::{PointerSink, SinkError};
