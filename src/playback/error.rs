//! Playback Engine Error Types

use thiserror::Error;

use crate::pattern::PatternError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine error types
///
/// Pointer backend failures never surface here: a failed movement is
/// logged and counted in the [`PlaybackReport`](super::PlaybackReport), and
/// playback carries on with the next point.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Store has no pattern under this name
    #[error("Pattern not found: {0}")]
    PatternNotFound(String),

    /// Pattern exists but has no points
    #[error("Pattern has no points: {0}")]
    EmptyPattern(String),

    /// A playback run is already in progress (or still stopping)
    #[error("Playback already active")]
    AlreadyActive,

    /// `start` was called before any pattern was loaded
    #[error("No pattern loaded")]
    NoPatternLoaded,

    /// Playback was started with no tokio runtime to run on
    #[error("No tokio runtime available")]
    NoRuntime,

    /// Setting rejected by validation
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// Pattern store failed for a reason other than a miss
    #[error(transparent)]
    Pattern(PatternError),
}

impl From<PatternError> for EngineError {
    fn from(err: PatternError) -> Self {
        match err {
            PatternError::NotFound(name) => EngineError::PatternNotFound(name),
            other => EngineError::Pattern(other),
        }
    }
}
