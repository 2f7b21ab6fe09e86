//! Error types.
//!
//! Conflicts and partial auto-assignment are expected outcomes and travel
//! as data ([`crate::PlacementOutcome`], [`crate::AssignmentOutcome`]).
//! The errors here cover caller mistakes and storage failures.

use thiserror::Error;

use crate::models::{ConflictReport, Placement, PlacementId};
use crate::validation::{join_messages, ValidationError};

/// Result type for timetable operations.
pub type Result<T> = std::result::Result<T, TimetableError>;

/// Errors returned by timetable operations.
#[derive(Debug, Error)]
pub enum TimetableError {
    /// Malformed identifiers or out-of-range day/slot/week values.
    #[error("invalid input: {}", join_messages(.errors))]
    InvalidInput { errors: Vec<ValidationError> },

    /// The referenced binding does not exist.
    #[error("binding '{0}' does not exist")]
    InvalidBinding(String),

    /// The placement collides with existing placements.
    #[error("placement conflicts: {0}")]
    ConflictDetected(ConflictReport),

    /// Auto-assign was invoked on a class/term without bindings.
    #[error("class '{class_id}' has no bindings in term '{term}'")]
    NothingToSchedule { class_id: String, term: String },

    /// Underlying persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TimetableError {
    /// Whether the caller may retry the same request unchanged.
    ///
    /// Only store failures qualify; the engine never retries them itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }
}

impl From<Vec<ValidationError>> for TimetableError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::InvalidInput { errors }
    }
}

/// Errors raised by a [`crate::store::ScheduleStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The insert would violate an overlap invariant.
    #[error("placement overlaps {} existing placement(s)", .colliding.len())]
    Conflict { colliding: Vec<Placement> },

    /// Day, slot or weeks outside the stored ranges.
    #[error("invalid placement entry: {0}")]
    InvalidEntry(String),

    /// No placement with this id.
    #[error("placement {0} not found")]
    NotFound(PlacementId),

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,

    /// SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the operation may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Sqlite(_) | Self::Io(_))
    }
}

/// Errors loading an [`crate::EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    /// The file is not valid TOML for the config schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are out of range.
    #[error("invalid config: {}", join_messages(.0))]
    Invalid(Vec<ValidationError>),
}
