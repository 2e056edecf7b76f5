use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    #[error("No routine in {owner} matched any of {tried} pattern(s)")]
    RoutineNotFound { owner: String, tried: usize },

    #[error("Pattern {pattern} matched {count} routines in {owner}")]
    AmbiguousRoutine {
        owner: String,
        pattern: usize,
        count: usize,
    },

    #[error("Hook already installed on {routine} at priority {priority}")]
    DuplicateHook { routine: String, priority: i32 },

    #[error("Callback failed: {0}")]
    CallbackFailed(String),

    #[error("Strategy version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Invalid version string: {0}")]
    InvalidVersion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a `CallbackFailed` from any displayable error.
    pub fn callback(message: impl std::fmt::Display) -> Self {
        Error::CallbackFailed(message.to_string())
    }

    /// Check if this error is a resolution failure (as opposed to an
    /// install/config error). Resolution failures disable a single
    /// capability and are recovered at the call site.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Error::TypeNotFound(_)
                | Error::RoutineNotFound { .. }
                | Error::AmbiguousRoutine { .. }
        )
    }
}
