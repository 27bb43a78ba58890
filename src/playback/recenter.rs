//! Recentring
//!
//! After a stop, the pointer is eased back toward where playback began. The
//! correction is spread over a fixed number of small moves with short sleeps
//! in between, so it reads as a manual counter-movement rather than a jump.
//!
//! Each step moves `displacement / 40` on each axis. Four steps therefore
//! cover roughly a tenth of the displacement; the rest is left in place.
//!
//! Per-step values are truncated toward zero and the fractional parts are
//! carried into later steps. The carry releases an extra unit only once it
//! reaches +1, so a negative displacement moves `trunc(displacement / 40)`
//! per step and its fractional remainder is never emitted.

use std::time::Duration;
use tracing::{debug, warn};

use crate::pointer::PointerSink;

/// Number of corrective steps
pub const RECENTER_ROUNDS: u32 = 4;

/// Speed divisor applied to the per-step sleep
pub const RECENTER_SPEED: f64 = 4.0;

/// Divisor applied to the displacement for each step's movement
pub const RECENTER_STEP_DIVISOR: f64 = 40.0;

/// One corrective move and the sleep that precedes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecenterStep {
    /// Sleep before the move
    pub sleep_ms: u64,
    /// Horizontal movement
    pub dx: i32,
    /// Vertical movement
    pub dy: i32,
}

/// Fractional carry: truncates each value and releases a whole unit once the
/// accumulated remainder reaches +1
#[derive(Debug, Default)]
struct Carry(f64);

impl Carry {
    fn take(&mut self, value: f64) -> i64 {
        let whole = value.trunc();
        self.0 += value - whole;

        let mut out = whole as i64;
        if self.0 >= 1.0 {
            out += 1;
            self.0 -= 1.0;
        }
        out
    }
}

/// Plans and performs the return movement after a stop
#[derive(Debug, Clone, Copy, Default)]
pub struct RecenterController;

impl RecenterController {
    /// Create a controller
    pub fn new() -> Self {
        Self
    }

    /// Compute the corrective steps for a displacement, without sleeping
    pub fn plan(&self, backx: i64, backy: i64) -> Vec<RecenterStep> {
        let distance = (backx as f64).hypot(backy as f64);
        let sleep_per_step = 2.0 * distance / RECENTER_ROUNDS as f64 / RECENTER_SPEED;
        let step_x = backx as f64 / RECENTER_STEP_DIVISOR;
        let step_y = backy as f64 / RECENTER_STEP_DIVISOR;

        let mut sleep_carry = Carry::default();
        let mut x_carry = Carry::default();
        let mut y_carry = Carry::default();

        (0..RECENTER_ROUNDS)
            .map(|_| RecenterStep {
                sleep_ms: sleep_carry.take(sleep_per_step).max(0) as u64,
                dx: clamp_i32(x_carry.take(step_x)),
                dy: clamp_i32(y_carry.take(step_y)),
            })
            .collect()
    }

    /// Sleep through the planned steps, issuing each move to the sink
    ///
    /// Returns the total movement that the sink accepted. Failed moves are
    /// logged and skipped.
    pub async fn execute(&self, sink: &dyn PointerSink, backx: i64, backy: i64) -> (i64, i64) {
        let steps = self.plan(backx, backy);
        debug!(
            "Recentring from ({}, {}) in {} steps: {:?}",
            backx,
            backy,
            steps.len(),
            steps
        );

        let mut moved = (0i64, 0i64);
        for step in steps {
            if step.sleep_ms > 0 {
                tokio::time::sleep(Duration::from_millis(step.sleep_ms)).await;
            }
            if step.dx == 0 && step.dy == 0 {
                continue;
            }

            match sink.move_relative(step.dx, step.dy) {
                Ok(()) => {
                    moved.0 += step.dx as i64;
                    moved.1 += step.dy as i64;
                }
                Err(e) => warn!("Recentre move ({}, {}) failed: {}", step.dx, step.dy, e),
            }
        }

        moved
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::{MockPointerSink, RecordingSink, SinkError};
    use tokio::time::Instant;

    fn totals(steps: &[RecenterStep]) -> (i64, i64, u64) {
        steps.iter().fold((0, 0, 0), |(x, y, t), s| {
            (x + s.dx as i64, y + s.dy as i64, t + s.sleep_ms)
        })
    }

    #[test]
    fn test_plan_is_partial_correction() {
        let steps = RecenterController::new().plan(40, 0);

        assert_eq!(steps.len(), 4);
        assert!(steps.iter().all(|s| s.dx == 1 && s.dy == 0 && s.sleep_ms == 5));
        assert_eq!(totals(&steps), (4, 0, 20));
    }

    #[test]
    fn test_plan_carries_fractions() {
        let steps = RecenterController::new().plan(50, 0);

        let dx: Vec<i32> = steps.iter().map(|s| s.dx).collect();
        let sleeps: Vec<u64> = steps.iter().map(|s| s.sleep_ms).collect();
        assert_eq!(dx, vec![1, 1, 1, 2]);
        assert_eq!(sleeps, vec![6, 6, 6, 7]);
    }

    #[test]
    fn test_plan_negative_displacement_truncates_each_step() {
        let controller = RecenterController::new();

        let dy: Vec<i32> = controller.plan(0, -50).iter().map(|s| s.dy).collect();
        assert_eq!(dy, vec![-1, -1, -1, -1]);

        // -0.75 per step truncates to zero and the negative carry never releases
        let steps = controller.plan(-50, -30);
        assert!(steps.iter().all(|s| s.dx == -1 && s.dy == 0));

        // Sleeps depend only on distance, so they match the positive case
        let positive = controller.plan(50, 30);
        for (p, n) in positive.iter().zip(&steps) {
            assert_eq!(p.sleep_ms, n.sleep_ms);
        }
        assert_eq!(totals(&positive).0, 5);
        assert_eq!(totals(&steps).0, -4);
    }

    #[test]
    fn test_plan_small_displacement_moves_nothing() {
        let steps = RecenterController::new().plan(-5, 0);
        assert!(steps.iter().all(|s| s.dx == 0 && s.dy == 0));
        // 0.625 ms per step still adds up to whole milliseconds of sleep
        assert_eq!(totals(&steps).2, 2);
    }

    #[test]
    fn test_plan_zero_displacement() {
        let steps = RecenterController::new().plan(0, 0);
        assert_eq!(steps.len(), 4);
        assert_eq!(totals(&steps), (0, 0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_issues_moves_with_sleeps() {
        let sink = RecordingSink::new();
        let start = Instant::now();

        let moved = RecenterController::new().execute(&sink, 40, 0).await;

        assert_eq!(moved, (4, 0));
        assert_eq!(sink.deltas(), vec![(1, 0); 4]);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_millis(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_skips_zero_moves() {
        let sink = RecordingSink::new();
        let moved = RecenterController::new().execute(&sink, 0, 0).await;

        assert_eq!(moved, (0, 0));
        assert!(sink.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_continues_after_sink_failure() {
        let mut sink = MockPointerSink::new();
        let mut calls = 0;
        sink.expect_move_relative().times(4).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err(SinkError::Disconnected)
            } else {
                Ok(())
            }
        });

        let moved = RecenterController::new().execute(&sink, 0, -80).await;
        assert_eq!(moved, (0, -6));
    }
}
