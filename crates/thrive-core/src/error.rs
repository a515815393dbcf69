//! Core error types for thrive-core.
//!
//! This module defines the error hierarchy using thiserror. Derived
//! analytics never return these errors: "not enough data yet" is an
//! ordinary state and is reported through zeroed defaults instead.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for thrive-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A check-in already exists for this calendar day
    #[error("A check-in already exists for {date}")]
    DuplicateDate { date: NaiveDate },

    /// Record lookup failed
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Aggregation requested below the sample threshold
    #[error("Insufficient data: need {needed} observations, have {available}")]
    InsufficientData { needed: usize, available: usize },

    /// AI coach call failed
    #[error("External service error: {0}")]
    ExternalService(#[from] CoachError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home/data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required field was empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },

    /// Free text exceeded its limit
    #[error("Field '{field}' exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// The day's reflection draft was frozen by a submitted check-in
    #[error("Draft for {date} is finalized")]
    DraftFinalized { date: NaiveDate },

    /// Milestones complete exactly once
    #[error("Milestone {id} is already completed")]
    MilestoneAlreadyCompleted { id: String },

    /// Goals stay while sprints point at them
    #[error("Goal {id} is referenced by {sprints} sprint(s); archive it instead")]
    GoalReferenced { id: String, sprints: usize },

    /// The day's reflection has not reached the unlock bar yet
    #[error("Coach is locked: write at least {needed} sentences (have {sentences})")]
    CoachLocked { sentences: usize, needed: usize },
}

/// Failures of the AI coach collaborator.
#[derive(Error, Debug)]
pub enum CoachError {
    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// No reply within the deadline
    #[error("Coach timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Caller dismissed the request
    #[error("Coach request cancelled")]
    Cancelled,

    /// Non-success HTTP status
    #[error("Coach returned HTTP {code}")]
    Status { code: u16 },

    /// Reply body missing the expected text
    #[error("Malformed coach reply")]
    MalformedReply,

    /// No endpoint or API key configured
    #[error("Coach is not configured")]
    NotConfigured,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseBusy
                    || err.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<reqwest::Error> for CoachError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            CoachError::Status {
                code: status.as_u16(),
            }
        } else if err.is_decode() {
            CoachError::MalformedReply
        } else {
            CoachError::Network(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
