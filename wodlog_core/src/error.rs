//! Error types for the wodlog_core library.
//!
//! Score parsing failures are deliberately absent here: `codec::parse`
//! reports them as `None` and callers fall back to freeform text.

use crate::store::StoreError;
use crate::ScoreCategory;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for wodlog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// User-correctable input problem; blocks submission only
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The result store rejected a read or write
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// A referenced result or workout does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not valid in the current editing state
    #[error("State error: {0}")]
    State(String),
}

/// Problems the athlete can fix before submitting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Custom workout has no named movement
    #[error("a custom workout needs at least one movement")]
    NoMovements,

    /// Custom workout name matches a benchmark workout
    #[error(
        "'{name}' is the benchmark workout '{benchmark}'; rename it or wait for the benchmark to be programmed"
    )]
    BenchmarkName { name: String, benchmark: String },

    /// Field name does not exist for the category being edited
    #[error("no field '{field}' for {category} scores")]
    UnknownField {
        field: String,
        category: ScoreCategory,
    },

    /// Load annotation for a movement the workout does not have
    #[error("movement {number} does not exist (workout has {count})")]
    UnknownMovement { number: usize, count: usize },

    /// Field text that cannot be stored without losing what was typed
    #[error("'{value}' is not a valid {field} value for {category} scores")]
    InvalidField {
        field: String,
        value: String,
        category: ScoreCategory,
    },
}
