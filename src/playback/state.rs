//! Playback State
//!
//! Shared between the caller-facing engine and the playback task. The phase
//! is the only cross-context signal; the cursor and accumulators are
//! written by the playback task alone and read by the engine after the task
//! has been joined (or for status display).
//!
//! # State Machine
//!
//! ```text
//!          start                stop
//!   Idle ─────────> Running ─────────> Stopping
//!    ^                 │                   │
//!    │    complete     │                   │ joined + recentred
//!    └─────────────────┴───────────────────┘
//! ```
//!
//! `start` is only accepted from `Idle`.

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU8, AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Playback lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlaybackPhase {
    /// No run in progress
    Idle = 0,
    /// Playback task is issuing points
    Running = 1,
    /// Stop requested; waiting for the task to exit and recentring
    Stopping = 2,
}

impl PlaybackPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Point-in-time copy of the playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    /// Lifecycle phase
    pub phase: PlaybackPhase,
    /// Index of the next point to issue
    pub cursor_index: usize,
    /// Negated sum of issued horizontal movement
    pub accumulated_dx: i64,
    /// Negated sum of issued vertical movement
    pub accumulated_dy: i64,
}

/// Shared playback state
#[derive(Debug)]
pub struct PlaybackState {
    phase: AtomicU8,
    cursor_index: AtomicUsize,
    accumulated_dx: AtomicI64,
    accumulated_dy: AtomicI64,
    idle: Notify,
}

impl PlaybackState {
    /// Create an idle state with zeroed progress
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(PlaybackPhase::Idle as u8),
            cursor_index: AtomicUsize::new(0),
            accumulated_dx: AtomicI64::new(0),
            accumulated_dy: AtomicI64::new(0),
            idle: Notify::new(),
        }
    }

    /// Current phase
    pub fn phase(&self) -> PlaybackPhase {
        PlaybackPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Whether a run is in progress or still stopping
    pub fn is_active(&self) -> bool {
        self.phase() != PlaybackPhase::Idle
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase: self.phase(),
            cursor_index: self.cursor_index.load(Ordering::Acquire),
            accumulated_dx: self.accumulated_dx.load(Ordering::Acquire),
            accumulated_dy: self.accumulated_dy.load(Ordering::Acquire),
        }
    }

    /// Current accumulated displacement without clearing it
    pub fn displacement(&self) -> (i64, i64) {
        (
            self.accumulated_dx.load(Ordering::Acquire),
            self.accumulated_dy.load(Ordering::Acquire),
        )
    }

    /// `Idle -> Running`, resetting progress. Returns the blocking phase on failure.
    pub(crate) fn try_begin(&self) -> Result<(), PlaybackPhase> {
        self.transition(PlaybackPhase::Idle, PlaybackPhase::Running)?;
        self.reset_progress();
        Ok(())
    }

    /// `Running -> Stopping`
    pub(crate) fn try_stop(&self) -> Result<(), PlaybackPhase> {
        self.transition(PlaybackPhase::Running, PlaybackPhase::Stopping)
    }

    /// `Running -> Idle` on natural completion. A concurrent stop wins.
    pub(crate) fn complete(&self) -> bool {
        let done = self
            .transition(PlaybackPhase::Running, PlaybackPhase::Idle)
            .is_ok();
        if done {
            self.idle.notify_waiters();
        }
        done
    }

    /// Any phase -> `Idle`; used at the end of a stop or to roll back a failed start
    pub(crate) fn finish(&self) {
        self.phase.store(PlaybackPhase::Idle as u8, Ordering::Release);
        self.idle.notify_waiters();
    }

    /// Zero the cursor and accumulators
    pub(crate) fn reset_progress(&self) {
        self.cursor_index.store(0, Ordering::Release);
        self.accumulated_dx.store(0, Ordering::Release);
        self.accumulated_dy.store(0, Ordering::Release);
    }

    /// Record an issued point: undo-accumulators move opposite to it
    pub(crate) fn record_point(&self, index: usize, dx: i32, dy: i32) {
        self.accumulated_dx.fetch_sub(dx as i64, Ordering::AcqRel);
        self.accumulated_dy.fetch_sub(dy as i64, Ordering::AcqRel);
        self.cursor_index.store(index + 1, Ordering::Release);
    }

    /// Advance the cursor past a point whose movement failed
    pub(crate) fn skip_point(&self, index: usize) {
        self.cursor_index.store(index + 1, Ordering::Release);
    }

    /// Read and zero the accumulated displacement
    pub(crate) fn take_displacement(&self) -> (i64, i64) {
        (
            self.accumulated_dx.swap(0, Ordering::AcqRel),
            self.accumulated_dy.swap(0, Ordering::AcqRel),
        )
    }

    /// Wait until the phase is `Idle`
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.phase() == PlaybackPhase::Idle {
                return;
            }
            notified.await;
        }
    }

    fn transition(&self, from: PlaybackPhase, to: PlaybackPhase) -> Result<(), PlaybackPhase> {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(PlaybackPhase::from_u8)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}
