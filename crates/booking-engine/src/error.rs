//! Error types for booking-engine operations.

use thiserror::Error;

use crate::availability::EditError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    /// Malformed input: inverted interval, missing required field, a service
    /// assigned from another workshop, and similar per-field failures.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A schedule edit batch was rejected. Carries every per-item error found
    /// during validation so the caller can correct the whole submission at once.
    #[error("schedule edit rejected with {} error(s)", .0.len())]
    Conflict(Vec<EditError>),

    /// A referenced availability, appointment, specialist, or service does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The slot already has an active appointment. Returned by the loser of a
    /// reservation race; the caller should offer another slot.
    #[error("slot is already taken")]
    SlotTaken,

    /// The actor is not permitted to perform the requested operation.
    #[error("actor is not permitted to perform this operation")]
    Unauthorized,

    /// A state-machine rule was violated (e.g. confirming a cancelled
    /// appointment, or a client cancelling a past one).
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The storage layer failed. Non-recoverable from the engine's point of
    /// view; the caller decides whether to surface or retry.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Convenience alias used throughout booking-engine.
pub type Result<T> = std::result::Result<T, BookingError>;
