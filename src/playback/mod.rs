//! Pattern playback
//!
//! Drives a scaled recoil pattern through a [`PointerSink`](crate::pointer::PointerSink)
//! with deadline-based pacing, and eases the pointer back after a stop.
//!
//! # Architecture
//!
//! ```text
//! PlaybackEngine (caller-facing, &self everywhere)
//!   ├─> PatternStore        lookup on load
//!   ├─> ScalingFactors      snapshot on start
//!   ├─> PlaybackTask        one tokio task per run, cancel + join
//!   │     └─> PlaybackState phase, cursor, displacement (atomics)
//!   └─> RecenterController  partial return after stop
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use recoil_playback::pattern::{InMemoryPatternStore, Pattern, PatternPoint};
//! use recoil_playback::playback::PlaybackEngine;
//! use recoil_playback::pointer::TracingSink;
//!
//! # async fn example() {
//! let store = InMemoryPatternStore::new();
//! store.insert("ak47", Pattern::new(vec![PatternPoint::new(0, 12, 99)]));
//!
//! let engine = PlaybackEngine::new(Arc::new(store), Arc::new(TracingSink));
//! if engine.load_pattern("ak47") && engine.start() {
//!     engine.wait_idle().await;
//! }
//! # }
//! ```

mod engine;
mod error;
pub mod recenter;
mod scheduler;
mod state;

pub use engine::PlaybackEngine;
pub use error::{EngineError, Result};
pub use recenter::{RecenterController, RecenterStep};
pub use scheduler::{PlaybackReport, PlaybackTask};
pub use state::{PlaybackPhase, PlaybackSnapshot, PlaybackState};
