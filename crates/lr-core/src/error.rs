//! # AppError
//!
//! Centralized error handling for LitReview.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all lr-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Ticket, Review, User)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Validation failure (e.g., headline too long, rating out of range)
    #[error("validation error: {0}")]
    Validation(String),

    /// No usable identity on the request
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Identity is known but does not own the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate follow, taken username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request body over a configured size limit
    #[error("too large: {0}")]
    TooLarge(String),

    /// Failure reported by a plugin (DB down, disk full). Passed through untouched.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Raised by a store when an insert collides with a uniqueness rule
/// (taken username, repeated follow edge). Travels inside `anyhow::Error`.
#[derive(Error, Debug)]
#[error("duplicate {0}")]
pub struct DuplicateEntry(pub &'static str);

impl AppError {
    /// Turns a store failure into `Conflict` when it is a [`DuplicateEntry`].
    pub fn conflict_on_duplicate(err: anyhow::Error, message: impl FnOnce() -> String) -> Self {
        if err.downcast_ref::<DuplicateEntry>().is_some() {
            AppError::Conflict(message())
        } else {
            AppError::Store(err)
        }
    }
}

/// A specialized Result type for LitReview logic.
pub type Result<T> = std::result::Result<T, AppError>;
