//! Pointer Sinks
//!
//! The playback engine never talks to the operating system directly. It
//! issues relative `(dx, dy)` movements to a [`PointerSink`], which is
//! expected to return quickly and never block on I/O.
//!
//! # Implementations
//!
//! | Sink | Purpose |
//! |------|---------|
//! | [`RecordingSink`] | Captures every movement with a timestamp (tests, dry runs) |
//! | [`TracingSink`] | Logs movements, moves nothing |
//! | `EnigoSink` | Real pointer motion via `enigo` (feature `enigo`) |

use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

#[cfg(feature = "enigo")]
mod enigo_sink;

#[cfg(feature = "enigo")]
pub use enigo_sink::EnigoSink;

/// Pointer backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Backend rejected or failed the movement
    #[error("Pointer backend error: {0}")]
    Backend(String),

    /// Backend is no longer accepting movements
    #[error("Pointer backend disconnected")]
    Disconnected,

    /// Backend queue is full
    #[error("Pointer backend queue full")]
    QueueFull,
}

/// Relative pointer movement primitive
#[cfg_attr(test, mockall::automock)]
pub trait PointerSink: Send + Sync {
    /// Move the pointer by `(dx, dy)` relative to its current position
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), SinkError>;
}

/// A movement captured by [`RecordingSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedMove {
    /// Horizontal movement
    pub dx: i32,
    /// Vertical movement
    pub dy: i32,
    /// When the movement was issued
    pub at: Instant,
}

/// Sink that records every movement instead of moving anything
///
/// Timestamps come from `tokio::time::Instant`, so they follow a paused
/// test clock.
#[derive(Debug, Default)]
pub struct RecordingSink {
    moves: Mutex<Vec<RecordedMove>>,
}

impl RecordingSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded movements in issue order
    pub fn moves(&self) -> Vec<RecordedMove> {
        self.moves.lock().clone()
    }

    /// Recorded movements as `(dx, dy)` pairs
    pub fn deltas(&self) -> Vec<(i32, i32)> {
        self.moves.lock().iter().map(|m| (m.dx, m.dy)).collect()
    }

    /// Sum of all recorded movements
    pub fn total(&self) -> (i64, i64) {
        self.moves
            .lock()
            .iter()
            .fold((0, 0), |(x, y), m| (x + m.dx as i64, y + m.dy as i64))
    }

    /// Number of recorded movements
    pub fn len(&self) -> usize {
        self.moves.lock().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.moves.lock().is_empty()
    }

    /// Forget all recorded movements
    pub fn clear(&self) {
        self.moves.lock().clear();
    }
}

impl PointerSink for RecordingSink {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), SinkError> {
        self.moves.lock().push(RecordedMove {
            dx,
            dy,
            at: Instant::now(),
        });
        Ok(())
    }
}

/// Sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PointerSink for TracingSink {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), SinkError> {
        debug!(dx, dy, "pointer move (no backend)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_records_in_order() {
        let sink = RecordingSink::new();
        assert!(sink.is_empty());

        sink.move_relative(5, 0).unwrap();
        sink.move_relative(0, -3).unwrap();
        sink.move_relative(-1, 1).unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.deltas(), vec![(5, 0), (0, -3), (-1, 1)]);
        assert_eq!(sink.total(), (4, -2));

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_tracing_sink_never_fails() {
        assert!(TracingSink.move_relative(i32::MAX, i32::MIN).is_ok());
    }

    #[test]
    fn test_sink_error_display() {
        assert!(SinkError::Backend("x11 gone".to_string())
            .to_string()
            .contains("x11 gone"));
        assert_eq!(
            SinkError::Disconnected.to_string(),
            "Pointer backend disconnected"
        );
    }
}
