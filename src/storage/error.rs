//! Error types for review storage.

use thiserror::Error;

/// Errors raised by the review store and the seed loader.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Request body does not describe a valid review.
    #[error("{0}")]
    Validation(String),

    /// No review with this ID.
    #[error("Review not found: {0}")]
    NotFound(i64),

    /// SQLite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Seed file is structurally wrong.
    #[error("Seed data error: {0}")]
    Seed(String),

    /// Seed file could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
