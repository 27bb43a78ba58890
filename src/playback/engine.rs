//! Playback Engine
//!
//! Caller-facing surface: load a pattern by name, start and stop playback,
//! query status, and adjust the settings that drive scaling.
//!
//! # Run lifecycle
//!
//! ```text
//! load_pattern(name)   store lookup, raw pattern kept
//!        │
//! start()              settings snapshot -> scaled pattern -> spawn task
//!        │
//!   ┌────┴─────┐
//!   │          │
//! complete   stop()    cancel, join, recentre, Idle
//! ```
//!
//! Settings changes made during a run only affect the next `start()`; the
//! running task owns an immutable scaled copy of the pattern.
//!
//! The engine remembers the tokio runtime it was created on, so `start()`
//! may be called from threads outside that runtime (an OS hotkey hook, for
//! instance).

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::error::{EngineError, Result};
use super::recenter::RecenterController;
use super::scheduler::{PlaybackReport, PlaybackTask};
use super::state::{PlaybackPhase, PlaybackSnapshot, PlaybackState};
use crate::config::{validate_engine_settings, EngineSettings};
use crate::pattern::{scale, Pattern, PatternStore, ScalingFactors};
use crate::pointer::PointerSink;

/// Pattern selected for the next run
#[derive(Debug, Clone)]
struct LoadedPattern {
    name: String,
    pattern: Arc<Pattern>,
}

/// Settings and the factors derived from them, always updated together
#[derive(Debug, Clone, Copy)]
struct Tuning {
    settings: EngineSettings,
    factors: ScalingFactors,
}

impl Tuning {
    fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            factors: ScalingFactors::from_settings(&settings),
        }
    }
}

/// Recoil pattern playback engine
///
/// At most one run is active per engine. All methods take `&self`, so the
/// engine can be shared behind an `Arc` between a hotkey loop and a status
/// display.
pub struct PlaybackEngine {
    store: Arc<dyn PatternStore>,
    sink: Arc<dyn PointerSink>,
    tuning: Mutex<Tuning>,
    loaded: Mutex<Option<LoadedPattern>>,
    state: Arc<PlaybackState>,
    task: Mutex<Option<PlaybackTask>>,
    recenter: RecenterController,
    runtime: Option<Handle>,
}

impl PlaybackEngine {
    /// Create an engine with default settings
    ///
    /// Runs are spawned on the tokio runtime this is called from. Outside a
    /// runtime, `start()` uses whichever runtime it is itself called on.
    pub fn new(store: Arc<dyn PatternStore>, sink: Arc<dyn PointerSink>) -> Self {
        Self {
            store,
            sink,
            tuning: Mutex::new(Tuning::new(EngineSettings::default())),
            loaded: Mutex::new(None),
            state: Arc::new(PlaybackState::new()),
            task: Mutex::new(None),
            recenter: RecenterController::new(),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Create an engine with the given settings
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidSetting`] if any setting is out of range.
    pub fn with_settings(
        store: Arc<dyn PatternStore>,
        sink: Arc<dyn PointerSink>,
        settings: EngineSettings,
    ) -> Result<Self> {
        let engine = Self::new(store, sink);
        engine.apply_settings(settings)?;
        Ok(engine)
    }

    /// Load a pattern by name, reporting success as a bool
    ///
    /// Failures are logged; see [`try_load_pattern`](Self::try_load_pattern)
    /// for the reason.
    pub fn load_pattern(&self, name: &str) -> bool {
        match self.try_load_pattern(name) {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to load pattern {}: {}", name, e);
                false
            }
        }
    }

    /// Load a pattern by name for the next run
    ///
    /// Returns the number of points. On any failure the previously loaded
    /// pattern stays selected.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AlreadyActive`] while a run is in progress
    /// - [`EngineError::PatternNotFound`] if the store has no such pattern
    /// - [`EngineError::EmptyPattern`] if the pattern has no points
    pub fn try_load_pattern(&self, name: &str) -> Result<usize> {
        // Held through the progress reset; try_start takes the same lock
        let _slot = self.task.lock();

        if self.state.is_active() {
            return Err(EngineError::AlreadyActive);
        }

        let pattern = self.store.get(name)?;
        if pattern.is_empty() {
            return Err(EngineError::EmptyPattern(name.to_string()));
        }

        let len = pattern.len();
        *self.loaded.lock() = Some(LoadedPattern {
            name: name.to_string(),
            pattern: Arc::new(pattern),
        });
        self.state.reset_progress();

        info!("Loaded pattern: {} ({} points)", name, len);
        Ok(len)
    }

    /// Name of the pattern selected for the next run
    pub fn loaded_pattern_name(&self) -> Option<String> {
        self.loaded.lock().as_ref().map(|l| l.name.clone())
    }

    /// Loaded pattern scaled with the current settings
    pub fn scaled_pattern(&self) -> Option<Pattern> {
        let factors = self.tuning.lock().factors;
        self.loaded
            .lock()
            .as_ref()
            .map(|l| scale(&l.pattern, &factors))
    }

    /// Start playback, reporting success as a bool
    ///
    /// Starting while a run is active is a no-op that leaves the running
    /// playback untouched.
    pub fn start(&self) -> bool {
        match self.try_start() {
            Ok(()) => true,
            Err(EngineError::AlreadyActive) => {
                debug!("Start ignored: playback already active");
                false
            }
            Err(e) => {
                warn!("Failed to start playback: {}", e);
                false
            }
        }
    }

    /// Start playback of the loaded pattern
    ///
    /// # Errors
    ///
    /// - [`EngineError::NoPatternLoaded`] before any successful load
    /// - [`EngineError::NoRuntime`] if the engine was created outside a
    ///   tokio runtime and this is not called from one either
    /// - [`EngineError::AlreadyActive`] unless the engine is idle
    /// - [`EngineError::EmptyPattern`] if scaling left nothing to play
    pub fn try_start(&self) -> Result<()> {
        let mut slot = self.task.lock();

        let loaded = self
            .loaded
            .lock()
            .clone()
            .ok_or(EngineError::NoPatternLoaded)?;

        let runtime = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .ok_or(EngineError::NoRuntime)?;

        let tuning = *self.tuning.lock();
        let scaled = Arc::new(scale(&loaded.pattern, &tuning.factors));

        self.state
            .try_begin()
            .map_err(|_| EngineError::AlreadyActive)?;

        debug!(
            "Starting {} with factors x={:.4} y={:.4}",
            loaded.name,
            tuning.factors.x_multiplier(),
            tuning.factors.y_multiplier()
        );

        match PlaybackTask::spawn_on(
            &runtime,
            loaded.name,
            scaled,
            self.sink.clone(),
            self.state.clone(),
        ) {
            Ok(task) => {
                *slot = Some(task);
                Ok(())
            }
            Err(e) => {
                self.state.finish();
                Err(e)
            }
        }
    }

    /// Stop playback
    ///
    /// Cancels the run, waits for the task to exit, then eases the pointer
    /// back when `return_to_original` is set. Returns `None` (and does
    /// nothing) if no run is active, including after natural completion.
    pub async fn stop(&self) -> Option<PlaybackReport> {
        if let Err(phase) = self.state.try_stop() {
            if phase == PlaybackPhase::Idle {
                self.reap_finished_task();
            }
            debug!("Stop ignored: playback is {}", phase);
            return None;
        }

        let task = self.task.lock().take();
        let report = match task {
            Some(task) => {
                task.cancel();
                Some(task.join().await)
            }
            None => None,
        };

        let (backx, backy) = self.state.take_displacement();
        let return_to_original = self.tuning.lock().settings.return_to_original;
        if return_to_original {
            let moved = self.recenter.execute(self.sink.as_ref(), backx, backy).await;
            debug!(
                "Recentred by ({}, {}) of ({}, {})",
                moved.0, moved.1, backx, backy
            );
        }

        self.state.finish();

        if let Some(report) = &report {
            info!(
                "Playback stopped after {}/{} points (displacement {}, {})",
                report.points_issued, report.total_points, backx, backy
            );
        }
        report
    }

    /// Whether a run is active (running or stopping)
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase()
    }

    /// Cursor and accumulated displacement of the current or last run
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.snapshot()
    }

    /// Wait until no run is active
    pub async fn wait_idle(&self) {
        self.state.wait_idle().await
    }

    /// Current settings
    pub fn settings(&self) -> EngineSettings {
        self.tuning.lock().settings
    }

    /// Scaling factors the next run will use
    pub fn scaling_factors(&self) -> ScalingFactors {
        self.tuning.lock().factors
    }

    /// Set the in-game sensitivity
    pub fn set_sensitivity(&self, sensitivity: f32) -> Result<()> {
        self.update(|s| s.sensitivity = sensitivity)
    }

    /// Set the display resolution
    pub fn set_resolution(&self, width: u32, height: u32) -> Result<()> {
        self.update(|s| {
            s.resolution_width = width;
            s.resolution_height = height;
        })
    }

    /// Set the display aspect ratio (width / height)
    pub fn set_aspect_ratio(&self, aspect_ratio: f32) -> Result<()> {
        self.update(|s| s.aspect_ratio = aspect_ratio)
    }

    /// Enable or disable recentring after a stop
    pub fn set_return_to_original(&self, enabled: bool) {
        self.tuning.lock().settings.return_to_original = enabled;
    }

    /// Replace all settings at once
    pub fn apply_settings(&self, settings: EngineSettings) -> Result<()> {
        self.update(|s| *s = settings)
    }

    fn update(&self, change: impl FnOnce(&mut EngineSettings)) -> Result<()> {
        let mut tuning = self.tuning.lock();
        let mut settings = tuning.settings;
        change(&mut settings);

        validate_engine_settings(&settings)
            .map_err(|e| EngineError::InvalidSetting(e.to_string()))?;

        *tuning = Tuning::new(settings);
        debug!("Engine settings updated: {:?}", settings);
        Ok(())
    }

    fn reap_finished_task(&self) {
        let mut slot = self.task.lock();
        if slot.as_ref().is_some_and(PlaybackTask::is_finished) {
            slot.take();
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.cancel();
        }
    }
}
