//! Error types for habit operations

use thiserror::Error;
use uuid::Uuid;

/// Result type for habit operations
pub type Result<T> = std::result::Result<T, HabitError>;

/// Errors that can occur while mutating or reading habit state
#[derive(Debug, Error)]
pub enum HabitError {
    /// Habit does not exist (or is not owned by the caller)
    #[error("habit '{0}' not found")]
    NotFound(Uuid),

    /// Malformed create/update payload
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transient storage failure; callers may retry
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Analytics metadata could not be encoded
    #[error("failed to encode analytics metadata: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A previous holder of the connection panicked
    #[error("database connection lock poisoned")]
    LockPoisoned,
}

impl HabitError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the error is the caller's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidInput(_))
    }
}
