//! Playback Scheduler
//!
//! Runs one pattern on a tokio task, issuing each point to the pointer sink
//! and then waiting for that point's deadline.
//!
//! # Drift-free timing
//!
//! Deadlines are absolute offsets from a single start instant `t0`:
//!
//! ```text
//! deadline(i) = t0 + sum(delay_ms[0..=i])
//! ```
//!
//! A late wake-up therefore shortens the next wait instead of pushing every
//! later point back. Sink call overhead and timer slack never accumulate.
//!
//! # Cancellation
//!
//! The wait is a `select!` between the deadline and a [`CancellationToken`],
//! so a stop is observed immediately rather than after the current delay.
//! Cancellation is also checked before each point, which guarantees that no
//! point is issued once cancellation has been requested.

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::error::{EngineError, Result};
use super::state::PlaybackState;
use crate::pattern::Pattern;
use crate::pointer::PointerSink;

/// Outcome of one playback run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Points in the pattern
    pub total_points: usize,
    /// Points handed to the sink (including failed movements)
    pub points_issued: usize,
    /// Movements the sink rejected
    pub sink_failures: usize,
    /// Whether the run ended by cancellation rather than completion
    pub cancelled: bool,
    /// Negated sum of successfully issued horizontal movement
    pub accumulated_dx: i64,
    /// Negated sum of successfully issued vertical movement
    pub accumulated_dy: i64,
    /// Largest observed lateness of a wake-up versus its deadline
    pub max_lag: Duration,
    /// Wall time from start to exit
    pub elapsed: Duration,
}

impl PlaybackReport {
    /// Whether every point was issued
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.points_issued == self.total_points
    }
}

/// Handle to a running playback task
pub struct PlaybackTask {
    cancel: CancellationToken,
    join: JoinHandle<PlaybackReport>,
    state: Arc<PlaybackState>,
}

impl PlaybackTask {
    /// Spawn a playback run on the current tokio runtime
    ///
    /// # Errors
    ///
    /// [`EngineError::NoRuntime`] when called outside a tokio runtime, or
    /// any error of [`spawn_on`](Self::spawn_on).
    pub fn spawn(
        name: impl Into<String>,
        pattern: Arc<Pattern>,
        sink: Arc<dyn PointerSink>,
        state: Arc<PlaybackState>,
    ) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        Self::spawn_on(&handle, name, pattern, sink, state)
    }

    /// Spawn a playback run on the given runtime
    ///
    /// The pattern is an immutable snapshot for the lifetime of the run.
    /// Phase transitions into `Running` are the caller's responsibility; on
    /// natural completion the task moves the state back to `Idle` itself.
    ///
    /// # Errors
    ///
    /// [`EngineError::EmptyPattern`] if the pattern has no points; nothing
    /// is spawned in that case.
    pub fn spawn_on(
        handle: &Handle,
        name: impl Into<String>,
        pattern: Arc<Pattern>,
        sink: Arc<dyn PointerSink>,
        state: Arc<PlaybackState>,
    ) -> Result<Self> {
        let name = name.into();
        if pattern.is_empty() {
            error!("Cannot play empty pattern: {}", name);
            return Err(EngineError::EmptyPattern(name));
        }

        let cancel = CancellationToken::new();
        let join = handle.spawn(run_playback(
            name,
            pattern,
            sink,
            state.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            cancel,
            join,
            state,
        })
    }

    /// Request cancellation; the task exits at its next check
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the task has exited
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to exit
    pub async fn join(self) -> PlaybackReport {
        match self.join.await {
            Ok(report) => report,
            Err(e) => {
                error!("Playback task failed: {}", e);
                let (accumulated_dx, accumulated_dy) = self.state.displacement();
                PlaybackReport {
                    points_issued: self.state.snapshot().cursor_index,
                    cancelled: true,
                    accumulated_dx,
                    accumulated_dy,
                    ..Default::default()
                }
            }
        }
    }
}

async fn run_playback(
    name: String,
    pattern: Arc<Pattern>,
    sink: Arc<dyn PointerSink>,
    state: Arc<PlaybackState>,
    cancel: CancellationToken,
) -> PlaybackReport {
    let t0 = Instant::now();
    let mut deadline = t0;
    let mut report = PlaybackReport {
        total_points: pattern.len(),
        ..Default::default()
    };

    info!(
        "Playback started: {} ({} points, {} ms)",
        name,
        pattern.len(),
        pattern.total_duration_ms()
    );

    for (index, point) in pattern.iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        match sink.move_relative(point.dx, point.dy) {
            Ok(()) => state.record_point(index, point.dx, point.dy),
            Err(e) => {
                report.sink_failures += 1;
                state.skip_point(index);
                warn!(
                    "Pointer move failed at point {} ({}, {}): {}",
                    index, point.dx, point.dy, e
                );
            }
        }
        report.points_issued += 1;

        deadline += Duration::from_millis(point.delay_ms as u64);
        trace!(
            "Point {}: ({}, {}) next deadline +{:?}",
            index,
            point.dx,
            point.dy,
            deadline - t0
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                report.cancelled = true;
                break;
            }
            _ = sleep_until(deadline) => {
                let lag = Instant::now().saturating_duration_since(deadline);
                report.max_lag = report.max_lag.max(lag);
            }
        }
    }

    let (accumulated_dx, accumulated_dy) = state.displacement();
    report.accumulated_dx = accumulated_dx;
    report.accumulated_dy = accumulated_dy;
    report.elapsed = t0.elapsed();

    if report.cancelled {
        info!(
            "Playback cancelled: {} after {}/{} points",
            name, report.points_issued, report.total_points
        );
    } else {
        state.complete();
        info!(
            "Playback complete: {} ({} points in {:?})",
            name, report.points_issued, report.elapsed
        );
    }

    debug!(
        "Playback stats: issued={}, sink_failures={}, max_lag={:?}, displacement=({}, {})",
        report.points_issued,
        report.sink_failures,
        report.max_lag,
        report.accumulated_dx,
        report.accumulated_dy
    );

    report
}
